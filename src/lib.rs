//! # klisp-lexer - Non-blocking Derivative Lexing for KLisp
//!
//! A lexer engine that matches regular languages by Brzozowski
//! derivatives instead of compiled automata, and consumes its input as a
//! stream that may still be growing. Tokens are emitted as soon as they
//! are decided; when input runs out mid-token the engine simply waits and
//! resumes when more characters are pushed.
//!
//! ## Features
//!
//! - **Regular-language algebra** with eager simplification and a bounded
//!   union cache
//! - **Push-based streams** that notify listeners synchronously
//! - **Maximal munch** with first-declared-rule tie breaking and
//!   backtracking to the last accepting point
//! - **Stateful lexer states** for sub-languages such as string bodies
//! - **KLisp and Scheme grammars** out of the box
//!
//! ## Quick Start
//!
//! Lex a complete string:
//!
//! ```rust
//! use klisp_lexer::lexer::klisp;
//! use klisp_lexer::TokenKind;
//!
//! # fn main() -> klisp_lexer::Result<()> {
//! let tokens = klisp::tokenize("(+ 1 2)")?;
//! let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
//!
//! assert_eq!(
//!     kinds,
//!     vec![
//!         TokenKind::open_paren(),
//!         TokenKind::Symbol("+".to_string()),
//!         TokenKind::Integer(1),
//!         TokenKind::Integer(2),
//!         TokenKind::close_paren(),
//!     ]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ### Incremental Input
//!
//! Push characters as they arrive; the output stream grows behind them:
//!
//! ```rust
//! use klisp_lexer::lexer::{klisp, SessionStatus};
//! use klisp_lexer::{Source, TokenKind};
//!
//! # fn main() -> klisp_lexer::Result<()> {
//! let input = Source::new();
//! let session = klisp::lexer()?.lex(input.stream())?;
//!
//! input.push("(define x".chars());
//! assert_eq!(session.tokens().len(), 2); // `x` may still grow
//!
//! input.push(" 42)".chars());
//! input.terminate();
//!
//! assert_eq!(session.status(), SessionStatus::Terminated);
//! assert_eq!(session.tokens()[3].kind, TokenKind::Integer(42));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Source<char> → Stream<char> → Lexer (derive per char) → Source<Token> → Stream<Token>
//! ```
//!
//! - [`language`] - [`Language`] values and their derivatives
//! - [`stream`] - [`Source`] and [`Stream`]
//! - [`lexer`] - rule tables, the engine, tokens and the bundled grammars
//! - [`parser`] - bracket balance for readers deciding when input is complete
//! - [`error`] - [`Error`] and [`Result`]

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod language;
pub mod lexer;
pub mod parser;
pub mod stream;

// Re-export main types
pub use error::{Error, ErrorSeverity, Result};
pub use language::Language;
pub use lexer::{LexSession, Lexer, LexerConfig, LexerRules, Position, Span, Token, TokenKind, TokenTag};
pub use parser::Balance;
pub use stream::{Source, Stream};
