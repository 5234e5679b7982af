//! Error types for the KLisp lexer

use thiserror::Error;

/// Lexing session errors
///
/// Malformed literals are not represented here: they are emitted as
/// [`TokenKind::Malformed`](crate::lexer::TokenKind::Malformed) tokens so
/// that lexing of later tokens can continue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No rule can ever accept and no earlier accepting point exists
    ///
    /// **Triggered by:** Input with no valid token prefix
    /// **Example:** `-` followed by end of input in KLisp
    #[error("Lexing failed at line {line}, column {column} (offset {offset}) right before: {remaining:?}")]
    DeadEnd {
        /// Character offset of the first unconsumed character
        offset: usize,
        /// Line number (1-indexed)
        line: usize,
        /// Column number (1-indexed)
        column: usize,
        /// Preview of the unconsumed input
        remaining: String,
    },

    /// A single pending match grew past the configured limit
    #[error("Match exceeded {limit} characters starting at line {line}, column {column}")]
    MatchTooLong {
        /// Configured maximum match length
        limit: usize,
        /// Line where the match started
        line: usize,
        /// Column where the match started
        column: usize,
    },

    /// A rule pattern accepts the empty string and would never consume input
    #[error("Invalid rule in state {state}: pattern {pattern} accepts the empty string")]
    InvalidRule {
        /// Name of the declared state
        state: String,
        /// Rendering of the offending pattern
        pattern: String,
    },

    /// The session was cancelled by its owner
    #[error("Lexing session cancelled")]
    Cancelled,
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The session cannot continue
    Fatal,
    /// The caller may start a new session and retry
    Recoverable,
}

impl Error {
    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::DeadEnd { .. } => ErrorSeverity::Fatal,
            Error::MatchTooLong { .. } => ErrorSeverity::Fatal,
            Error::InvalidRule { .. } => ErrorSeverity::Fatal,
            Error::Cancelled => ErrorSeverity::Recoverable,
        }
    }
}

/// Result type for lexer operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_end_message() {
        let err = Error::DeadEnd {
            offset: 3,
            line: 1,
            column: 4,
            remaining: "-".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 1, column 4"));
        assert!(msg.contains("\"-\""));
        assert_eq!(err.classify(), ErrorSeverity::Fatal);
    }

    #[test]
    fn test_cancelled_is_recoverable() {
        assert_eq!(Error::Cancelled.classify(), ErrorSeverity::Recoverable);
    }
}
