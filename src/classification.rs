use std::collections::HashMap;
use std::str;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter, EnumString};

/// What a command carries besides its name and its plain arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub has_key: bool,
    pub has_sub_op: bool,
}

impl Capabilities {
    pub const KEYLESS: Capabilities = Capabilities {
        has_key: false,
        has_sub_op: false,
    };

    pub const WITH_SUB_OP: Capabilities = Capabilities {
        has_key: true,
        has_sub_op: true,
    };
}

impl Default for Capabilities {
    /// Most commands take a key and no sub-operation.
    fn default() -> Self {
        Capabilities {
            has_key: true,
            has_sub_op: false,
        }
    }
}

/// Maps a command name to its capabilities. Lookups are case-insensitive.
///
/// The same classifier must be used to read and to write a log, otherwise records do not
/// round-trip.
pub trait Classify {
    fn classify(&self, command: &str) -> Capabilities;

    fn has_key(&self, command: &str) -> bool {
        self.classify(command).has_key
    }

    fn has_sub_op(&self, command: &str) -> bool {
        self.classify(command).has_sub_op
    }

    /// Classifies a command name as read off the wire. A name that is not UTF-8 cannot be in any
    /// table and gets the default capabilities.
    fn classify_bytes(&self, command: &[u8]) -> Capabilities {
        str::from_utf8(command)
            .map(|command| self.classify(command))
            .unwrap_or_default()
    }
}

impl<C: Classify + ?Sized> Classify for &C {
    fn classify(&self, command: &str) -> Capabilities {
        (**self).classify(command)
    }
}

/// Redis commands found in append only files that do not follow the common `COMMAND key args...`
/// layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr, EnumIter, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SpecialCommand {
    FlushAll,
    FlushDb,
    Select,
    SwapDb,
    Multi,
    Exec,
    /// `BITOP <operation> destkey key [key ...]`
    BitOp,
}

impl SpecialCommand {
    pub fn capabilities(self) -> Capabilities {
        match self {
            SpecialCommand::BitOp => Capabilities::WITH_SUB_OP,
            _ => Capabilities::KEYLESS,
        }
    }
}

/// The classification Redis itself uses when writing append only files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RedisCommands;

impl Classify for RedisCommands {
    fn classify(&self, command: &str) -> Capabilities {
        command
            .parse::<SpecialCommand>()
            .map(SpecialCommand::capabilities)
            .unwrap_or_default()
    }
}

/// A classification table built at startup, for logs written by servers with commands of their
/// own (e.g. modules).
#[derive(Clone, Debug, Default)]
pub struct CommandTable {
    entries: HashMap<String, Capabilities>,
}

impl CommandTable {
    pub fn new() -> CommandTable {
        CommandTable::default()
    }

    /// A table holding every Redis special command.
    pub fn redis() -> CommandTable {
        SpecialCommand::iter().fold(CommandTable::new(), |table, command| {
            table.with(command.as_ref(), command.capabilities())
        })
    }

    pub fn with(mut self, command: &str, capabilities: Capabilities) -> CommandTable {
        self.entries
            .insert(command.to_ascii_uppercase(), capabilities);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Classify for CommandTable {
    fn classify(&self, command: &str) -> Capabilities {
        self.entries
            .get(&command.to_ascii_uppercase())
            .copied()
            .unwrap_or_default()
    }
}
