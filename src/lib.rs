pub mod check;
pub mod classification;
pub mod codec;
pub mod config;
pub mod error;
pub mod line;
pub mod operation;
pub mod reader;
pub mod tools;
pub mod writer;

pub use classification::{Capabilities, Classify, CommandTable, RedisCommands};
pub use codec::AofCodec;
pub use error::{Error, Result};
pub use operation::Operation;
pub use reader::OperationReader;
pub use writer::OperationWriter;
