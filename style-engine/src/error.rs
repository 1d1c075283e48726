//! Error types for the style engine

use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Validation failures raised before any model call or tally runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Incomplete submission: {answered} of {expected} questions answered")]
    IncompleteSubmission { answered: usize, expected: usize },

    #[error("Invalid quiz catalog: {0}")]
    InvalidCatalog(String),
}

impl EngineError {
    /// Short title shown in place of the expected output
    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "Invalid input",
            Self::IncompleteSubmission { .. } => "Please answer all questions",
            Self::InvalidCatalog(_) => "Quiz unavailable",
        }
    }

    /// Longer human-readable explanation for the UI
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::IncompleteSubmission { .. } => {
                "You must complete all questions to get your style recommendation.".to_string()
            }
            Self::InvalidCatalog(msg) => format!("The quiz configuration is invalid: {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_submission_messages() {
        let err = EngineError::IncompleteSubmission { answered: 3, expected: 5 };
        assert_eq!(err.title(), "Please answer all questions");
        assert_eq!(
            err.user_message(),
            "You must complete all questions to get your style recommendation."
        );
        assert_eq!(err.to_string(), "Incomplete submission: 3 of 5 questions answered");
    }

    #[test]
    fn test_invalid_input_passes_message_through() {
        let err = EngineError::InvalidInput("No input image provided".to_string());
        assert_eq!(err.user_message(), "No input image provided");
    }
}
