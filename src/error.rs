//! Domain errors for report assembly.
//!
//! The binary wraps these in `anyhow` at the edges; inside the pipeline
//! they stay typed so the empty-input case can be recovered from.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The registry or the input schema is structurally wrong. Fatal.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A question is present in the data but has no usable responses.
    #[error("no usable responses for question '{question}'")]
    EmptyInput { question: String },

    /// A chart or document backend failed for one question.
    #[error("failed to render '{question}': {message}")]
    Render { question: String, message: String },

    /// The input dataset could not be read.
    #[error("failed to read dataset {}", path.display())]
    Dataset {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl ReportError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn render(question: impl Into<String>, message: impl ToString) -> Self {
        Self::Render {
            question: question.into(),
            message: message.to_string(),
        }
    }

    /// Whether the pipeline may continue past this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmptyInput { .. })
    }
}

pub type ReportResult<T> = Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_empty_input_is_recoverable() {
        let empty = ReportError::EmptyInput {
            question: "9. What course are you studying?".to_string(),
        };
        assert!(empty.is_recoverable());
        assert!(!ReportError::configuration("duplicate question").is_recoverable());
        assert!(!ReportError::render("9. Course", "disk full").is_recoverable());
    }

    #[test]
    fn test_render_error_names_question() {
        let err = ReportError::render("19. Reasons", "disk full");
        let msg = err.to_string();
        assert!(msg.contains("19. Reasons"));
        assert!(msg.contains("disk full"));
    }
}
