use std::fmt::Display;

use bincode::ErrorKind;

/// Custom Result type for reldb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for reldb
///
/// Every condition is local to a single operator invocation; nothing here
/// is fatal to the process and nothing is retried.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Tuple arity or domain violation, detected on insert
    Schema(String),
    /// Attribute name not present in the referenced schema
    UnknownAttribute(String),
    /// Persistence error (file I/O or blob serialization)
    Io(String),
    /// Internal error
    Internal(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

impl From<Box<ErrorKind>> for Error {
    fn from(value: Box<ErrorKind>) -> Self {
        Error::Io(value.to_string())
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Schema(err) => write!(f, "schema error {}", err),
            Error::UnknownAttribute(err) => write!(f, "unknown attribute {}", err),
            Error::Io(err) => write!(f, "io error {}", err),
            Error::Internal(err) => write!(f, "internal error {}", err),
        }
    }
}
