use std::fmt;

/// Result type for gridworld-dqn operations
pub type Result<T> = std::result::Result<T, GridDqnError>;

/// Main error type for the crate
#[derive(Debug, Clone, PartialEq)]
pub enum GridDqnError {
    /// Fewer buffered transitions than a sample asked for
    InsufficientData {
        requested: usize,
        available: usize,
    },

    /// Invalid parameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// IO errors (file operations)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),

    /// Numerical computation errors
    NumericalError(String),
}

impl fmt::Display for GridDqnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridDqnError::InsufficientData { requested, available } => {
                write!(
                    f,
                    "Insufficient data: requested {} transitions, buffer holds {}",
                    requested, available
                )
            }
            GridDqnError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            GridDqnError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            GridDqnError::IoError(msg) => write!(f, "IO error: {}", msg),
            GridDqnError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            GridDqnError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
        }
    }
}

impl std::error::Error for GridDqnError {}

impl From<std::io::Error> for GridDqnError {
    fn from(err: std::io::Error) -> Self {
        GridDqnError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for GridDqnError {
    fn from(err: serde_json::Error) -> Self {
        GridDqnError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl GridDqnError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        GridDqnError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        GridDqnError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
