use thiserror::Error;

use crate::validation::ValidationError;

/// Errors returned by the scheduling and analysis entry points.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Malformed or out-of-range input; nothing was computed.
    #[error("invalid input ({} issue(s)): {}", .0.len(), summarize(.0))]
    Validation(Vec<ValidationError>),

    /// A produced schedule broke totality or the no-overlap rule.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SchedulerError {
    /// Validation issues, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            SchedulerError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<Vec<ValidationError>> for SchedulerError {
    fn from(errors: Vec<ValidationError>) -> Self {
        SchedulerError::Validation(errors)
    }
}

impl From<ValidationError> for SchedulerError {
    fn from(error: ValidationError) -> Self {
        SchedulerError::Validation(vec![error])
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
