use thiserror::Error;

/// A configuration value or source was rejected
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("invalid value '{value}' for '{field}': expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
    #[error("unknown configuration field '{0}'")]
    UnknownField(String),
    #[error("unknown preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },
    #[error("configuration source error: {0}")]
    Source(#[from] config::ConfigError),
    #[error("configuration does not match the options schema: {0}")]
    Schema(String),
}

impl ValidationError {
    /// Field the error is about, when it names one
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidValue { field, .. } => Some(field),
            ValidationError::UnknownField(field) => Some(field),
            _ => None,
        }
    }
}
