//! Error types for dtype resolution, generation and shrinking.

use std::fmt;

use crate::config::ConfigError;

/// Every failure the dtype strategies can report
///
/// All variants are returned synchronously to the immediate caller. Only the
/// bounded resampling in generation and the bounded search in shrinking retry
/// internally, and both convert exhaustion into one of these variants.
#[derive(Debug, Clone, PartialEq)]
pub enum DtypeError {
    /// The dtype name or object is not registered in the catalog
    UnknownDtype { name: String },

    /// The constraint set is contradictory or malformed
    InvalidConstraints {
        message: String,
        field: Option<String>,
    },

    /// Subnormal behaviour cannot be evaluated for this float width
    UnsupportedWidth { width: u32 },

    /// Rejection sampling ran out of attempts
    FilterExhausted { attempts: usize },

    /// No example satisfying the predicate was seen within the search budget
    NoFailureFound { examples: usize },

    /// A search or generation configuration failed validation
    Config(ConfigError),
}

impl fmt::Display for DtypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DtypeError::UnknownDtype { name } => write!(f, "Unknown dtype: {}", name),
            DtypeError::InvalidConstraints { message, field } => {
                write!(f, "Invalid constraints: {}", message)?;
                if let Some(field_name) = field {
                    write!(f, " (field: {})", field_name)?;
                }
                Ok(())
            }
            DtypeError::UnsupportedWidth { width } => {
                write!(
                    f,
                    "Unsupported float width: {} (subnormal behaviour cannot be probed)",
                    width
                )
            }
            DtypeError::FilterExhausted { attempts } => {
                write!(
                    f,
                    "No value satisfied the filter after {} attempts; the predicate is likely unsatisfiable under these constraints",
                    attempts
                )
            }
            DtypeError::NoFailureFound { examples } => {
                write!(
                    f,
                    "No example satisfying the predicate found after {} examples",
                    examples
                )
            }
            DtypeError::Config(err) => write!(f, "Configuration error: {}", err),
        }
    }
}

impl std::error::Error for DtypeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DtypeError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for DtypeError {
    fn from(err: ConfigError) -> Self {
        DtypeError::Config(err)
    }
}

impl DtypeError {
    /// Create an unknown dtype error
    pub fn unknown_dtype(name: impl Into<String>) -> Self {
        Self::UnknownDtype { name: name.into() }
    }

    /// Create an invalid constraints error without a field
    pub fn invalid_constraints(message: impl Into<String>) -> Self {
        Self::InvalidConstraints {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid constraints error naming the offending field
    pub fn invalid_constraints_with_field(
        message: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self::InvalidConstraints {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// The offending constraint field, if the error names one
    pub fn field(&self) -> Option<&str> {
        match self {
            DtypeError::InvalidConstraints { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}
