//! Structured error types for the fallible edges of the engine.
//!
//! The prompt and duplicate functions themselves never fail; errors only come
//! from parsing model replies, reading settings and CLI input files.

use serde::{Deserialize, Serialize};

/// Categorized error codes for generation operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Model reply errors
    EmptyResponse,
    ParseError,
    InvalidResponse,

    // Local errors
    ConfigError,
    IoError,
}

impl ErrorCode {
    /// Get a user-friendly message for this error code.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCode::EmptyResponse => {
                "The model returned an empty response. Try generating again."
            }
            ErrorCode::ParseError => {
                "Failed to parse the generated flashcards. This is usually a temporary issue."
            }
            ErrorCode::InvalidResponse => {
                "The model response did not contain any flashcards."
            }
            ErrorCode::ConfigError => {
                "The settings file is invalid. Check the value you set or delete preferences.json."
            }
            ErrorCode::IoError => "A file could not be read or written.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::EmptyResponse => "empty_response",
            ErrorCode::ParseError => "parse_error",
            ErrorCode::InvalidResponse => "invalid_response",
            ErrorCode::ConfigError => "config_error",
            ErrorCode::IoError => "io_error",
        }
    }
}

/// A structured generation error with a user-facing message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationError {
    pub code: ErrorCode,
    pub message: String,
    pub user_message: String,
    pub details: Option<String>,
}

impl GenerationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let user_message = code.user_message().to_string();
        Self {
            code,
            message: message.into(),
            user_message,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn io(context: &str, err: std::io::Error) -> Self {
        Self::new(ErrorCode::IoError, format!("{}: {}", context, err))
    }
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GenerationError {}

/// Truncate a string to at most `max_chars` characters, adding "..." if truncated.
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_uses_message() {
        let error = GenerationError::new(ErrorCode::ParseError, "bad json");
        assert_eq!(format!("{}", error), "bad json");
        assert_eq!(error.user_message, ErrorCode::ParseError.user_message());
    }

    #[test]
    fn test_error_with_details() {
        let error = GenerationError::new(ErrorCode::InvalidResponse, "no cards")
            .with_details("{\"other\": 1}");
        assert_eq!(error.details.as_deref(), Some("{\"other\": 1}"));
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::EmptyResponse).unwrap();
        assert_eq!(json, "\"empty_response\"");
        assert_eq!(ErrorCode::EmptyResponse.as_str(), "empty_response");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("this is a long string", 10), "this is...");
        // multi-byte text is cut on character boundaries
        assert_eq!(truncate_chars("먹었어요먹었어요", 5), "먹었...");
    }
}
