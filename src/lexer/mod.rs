//! Lexical analysis
//!
//! A lexer is a table of declared states ([`LexerRules`]), each with rules
//! pairing a [`Language`](crate::language::Language) with an action. The
//! [`Lexer`] matches rules by repeated derivation, so it never needs to
//! see more input than it has: feed it a [`Stream<char>`](crate::stream::Stream)
//! that is still growing and it emits tokens as soon as they are decided.
//!
//! Two grammars ship with the crate: [`klisp`] and [`scheme`].

mod config;
mod engine;
pub mod klisp;
mod rules;
pub mod scheme;
mod token;

pub use config::LexerConfig;
pub use engine::{CancelHandle, LexSession, Lexer, SessionStatus};
pub use rules::{Action, Emitter, LexerRules, Matcher, StateId, StatefulState, Switcher};
pub use token::{Position, Span, Token, TokenKind, TokenTag};
