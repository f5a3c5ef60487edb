//! Log levels.

use std::fmt;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    /// Verbose diagnostics.
    Debug,
    /// The default level.
    #[default]
    Info,
    /// Possible issues.
    Warn,
    /// Errors.
    Error,
    /// Errors after which the process exits.
    Fatal,
    /// An unrecognised level name.
    Undefined,
}

impl LogLevel {
    /// Parses a level name, case-insensitively. Unknown names map to
    /// [`LogLevel::Undefined`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" => Self::Warn,
            "error" => Self::Error,
            "fatal" => Self::Fatal,
            _ => Self::Undefined,
        }
    }

    /// Returns the lowercase level name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for LogLevel {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}
