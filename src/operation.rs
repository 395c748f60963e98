use bytes::Bytes;
use glob_match::glob_match;
use itertools::Itertools;
use std::fmt;

use crate::classification::Classify;

/// One persisted mutation or administrative command.
///
/// Every part is kept as raw bytes: keys and values in a log are binary safe.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Operation {
    /// The command name, with the casing it was read or created with.
    pub command: Bytes,
    /// Only set for commands whose first positional value is an operator, e.g. `BITOP`.
    pub sub_op: Option<Bytes>,
    /// Unset for keyless commands like `SELECT` or `FLUSHALL`.
    pub key: Option<Bytes>,
    pub arguments: Vec<Bytes>,
}

impl Operation {
    pub fn new(command: impl Into<Bytes>) -> Operation {
        Operation {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn with_sub_op(mut self, sub_op: impl Into<Bytes>) -> Operation {
        self.sub_op = Some(sub_op.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<Bytes>) -> Operation {
        self.key = Some(key.into());
        self
    }

    pub fn with_arguments<I, S>(mut self, arguments: I) -> Operation
    where
        I: IntoIterator<Item = S>,
        S: Into<Bytes>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    /// Number of parameters the record of this operation holds on the wire: the command, the
    /// sub-operation and key when the command takes them, and every argument.
    pub fn parameter_count(&self, classifier: &impl Classify) -> usize {
        let capabilities = classifier.classify_bytes(&self.command);
        1 + usize::from(capabilities.has_sub_op)
            + usize::from(capabilities.has_key)
            + self.arguments.len()
    }

    /// Whether the key matches a glob pattern. Keyless operations always match. Bytes of the key
    /// that are not UTF-8 only match wildcards.
    pub fn matches(&self, pattern: &str) -> bool {
        match &self.key {
            Some(key) => glob_match(pattern, &String::from_utf8_lossy(key)),
            None => true,
        }
    }
}

// Not valid UTF-8 parts are displayed lossily, like bulk strings in frames.
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = std::iter::once(&self.command)
            .chain(self.sub_op.as_ref())
            .chain(self.key.as_ref())
            .chain(self.arguments.iter())
            .map(|part| String::from_utf8_lossy(part));

        write!(f, "{}", parts.format(" "))
    }
}
