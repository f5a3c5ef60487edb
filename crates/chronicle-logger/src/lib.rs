//! Chronicle Logger: named, leveled, structured loggers.
//!
//! Loggers are looked up by name in an explicit [`LoggerRegistry`]; repeated
//! lookups return the same logger. Each logger writes JSON or text records
//! carrying its scope, log type, instance, version and app id alongside any
//! structured fields.

mod diagnostics;
mod level;
mod logger;
mod options;
mod registry;
mod writer;

pub use diagnostics::init_tracing;
pub use level::LogLevel;
pub use logger::{LOG_TYPE_LOG, LOG_TYPE_REQUEST, Logger};
pub use options::LoggerOptions;
pub use registry::LoggerRegistry;
