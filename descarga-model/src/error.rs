use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The start of the search window lies after its end.
    InvertedDateRange,
    /// The credentials used against the tax portal are missing or blank.
    MissingSatCredentials,
    /// The contract credentials for the download service are missing or blank.
    MissingContractCredentials,
    /// A required builder field was never set.
    MissingField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvertedDateRange => {
                write!(f, "search start must be <= search end")
            }
            ValidationError::MissingSatCredentials => {
                write!(f, "SAT credentials must be set")
            }
            ValidationError::MissingContractCredentials => {
                write!(f, "contract credentials have not been set")
            }
            ValidationError::MissingField(field) => {
                write!(f, "missing required field: {field}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub type Result<T> = std::result::Result<T, ValidationError>;
