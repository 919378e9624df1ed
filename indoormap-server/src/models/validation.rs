//! Validation error types

use std::fmt;

/// Validation error for request input
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// String doesn't match required format (e.g., UUID)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Value could not be parsed into the column type
    InvalidValue { field: &'static str, value: String },

    /// Document body is not a JSON object; `index` is set inside a batch
    NotAnObject { index: Option<usize> },

    /// Request body could not be decoded
    Body { reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::InvalidValue { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::NotAnObject { index: Some(index) } => {
                write!(f, "document at index {} must be a JSON object", index)
            }
            Self::NotAnObject { index: None } => write!(f, "document must be a JSON object"),
            Self::Body { reason } => write!(f, "invalid request body: {}", reason),
        }
    }
}

impl std::error::Error for ValidationError {}
