// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Error types for query analysis
//!
//! Only the external parse step can fail. Once a statement has been parsed,
//! the tracker never fails: references it cannot resolve stay unresolved and
//! constructs it does not model contribute no nodes.

use sqlparser::parser::ParserError;
use thiserror::Error;

/// Result type alias for analyzer operations
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Errors that can occur while analyzing a statement
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyzerError {
    /// The SQL text could not be parsed; the parser's message is kept verbatim
    #[error(transparent)]
    Syntax(#[from] ParserError),

    /// The SQL text holds no statement at all
    #[error("No SQL statement found in input")]
    EmptyInput,
}

impl AnalyzerError {
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, AnalyzerError::Syntax(_))
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Dialect name not known to the analyzer
    #[error("Unknown SQL dialect: {0}")]
    UnknownDialect(String),

    /// Recursion limit that would reject every statement
    #[error("Invalid recursion limit: {0} (must be > 0)")]
    InvalidRecursionLimit(usize),

    /// Settings payload could not be decoded
    #[error("Invalid analyzer settings: {0}")]
    InvalidSettings(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_is_transparent() {
        let parser_error = ParserError::ParserError("Expected: an expression, found: EOF".into());
        let err = AnalyzerError::from(parser_error.clone());
        assert!(err.is_syntax_error());
        assert_eq!(err.to_string(), parser_error.to_string());
    }

    #[test]
    fn test_error_display_empty_input() {
        let msg = format!("{}", AnalyzerError::EmptyInput);
        assert!(msg.contains("No SQL statement"));
        assert!(!AnalyzerError::EmptyInput.is_syntax_error());
    }

    #[test]
    fn test_error_display_unknown_dialect() {
        let err = ConfigError::UnknownDialect("cobol".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("cobol"));
        assert!(msg.contains("Unknown"));
    }

    #[test]
    fn test_error_display_recursion_limit() {
        let msg = format!("{}", ConfigError::InvalidRecursionLimit(0));
        assert!(msg.contains("0"));
        assert!(msg.contains("> 0"));
    }
}
