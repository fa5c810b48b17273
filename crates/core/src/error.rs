use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad digit range, zero batch size, etc.).
    ConfigValidation(String),
    /// A required column is absent from the record set entirely.
    MissingColumn { column: String },
    /// The key function could not derive a resolution key for a record.
    KeyUnavailable { row: usize, field: String },
    /// A per-record transform failed. Routed to the invalid set by the pipeline.
    Transform { row: usize, message: String },
}

impl RegistryError {
    /// Structural failures abort the run for the current input.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::MissingColumn { .. })
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { column } => {
                write!(f, "required column '{column}' is missing from the input")
            }
            Self::KeyUnavailable { row, field } => {
                write!(f, "row {row}: cannot build resolution key, field '{field}' is absent")
            }
            Self::Transform { row, message } => write!(f, "row {row}: transform error: {message}"),
        }
    }
}

impl std::error::Error for RegistryError {}
