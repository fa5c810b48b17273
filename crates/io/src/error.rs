use std::fmt;
use std::path::PathBuf;

use terceros_core::RegistryError;

#[derive(Debug)]
pub enum IoError {
    /// Input file or directory could not be read.
    Read { path: PathBuf, message: String },
    /// Malformed CSV (bad quoting, unreadable record, etc.).
    Csv(String),
    /// Output file could not be written.
    Write(String),
    /// JSON serialization error.
    Json(String),
    /// Engine error surfaced while loading or processing.
    Registry(RegistryError),
}

impl IoError {
    pub fn read(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        Self::Read {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Write(msg) => write!(f, "write error: {msg}"),
            Self::Json(msg) => write!(f, "JSON error: {msg}"),
            Self::Registry(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for IoError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        Self::Write(err.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<RegistryError> for IoError {
    fn from(err: RegistryError) -> Self {
        Self::Registry(err)
    }
}
