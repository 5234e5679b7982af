//! Bracket balance as a monoid
//!
//! A chunk of input reduces to the number of closing brackets it cannot
//! match on its own and the number of opening brackets it leaves open.
//! Combining two chunks cancels the left chunk's open brackets against the
//! right chunk's unmatched closes, so balances of pieces can be computed
//! independently (for instance line by line in a REPL) and folded together.

use crate::lexer::{Token, TokenTag};
use std::iter::Sum;
use std::ops::Add;

/// Unmatched brackets of a piece of input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Balance {
    /// Closing brackets with no opener in this piece
    pub unmatched_close: usize,
    /// Opening brackets left open at the end of this piece
    pub unmatched_open: usize,
}

impl Balance {
    /// The identity element
    pub const EMPTY: Balance = Balance {
        unmatched_close: 0,
        unmatched_open: 0,
    };

    const OPEN: Balance = Balance {
        unmatched_close: 0,
        unmatched_open: 1,
    };

    const CLOSE: Balance = Balance {
        unmatched_close: 1,
        unmatched_open: 0,
    };

    /// `self` followed by `next`
    pub fn combine(self, next: Balance) -> Balance {
        if self.unmatched_open <= next.unmatched_close {
            Balance {
                unmatched_close: self.unmatched_close + next.unmatched_close - self.unmatched_open,
                unmatched_open: next.unmatched_open,
            }
        } else {
            Balance {
                unmatched_close: self.unmatched_close,
                unmatched_open: next.unmatched_open + self.unmatched_open - next.unmatched_close,
            }
        }
    }

    /// Balance of raw text for one bracket pair, e.g. `('(', ')')`.
    ///
    /// Brackets inside strings or comments are counted too; lex first and
    /// use [`Balance::of_tokens`] when that matters.
    pub fn of_chars(text: &str, (open, close): (char, char)) -> Balance {
        text.chars()
            .map(|c| {
                if c == open {
                    Balance::OPEN
                } else if c == close {
                    Balance::CLOSE
                } else {
                    Balance::EMPTY
                }
            })
            .sum()
    }

    /// Balance of lexed tokens; every opening and closing delimiter counts,
    /// whatever its shape
    pub fn of_tokens<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> Balance {
        tokens
            .into_iter()
            .map(|token| match token.tag() {
                TokenTag::Open => Balance::OPEN,
                TokenTag::Close => Balance::CLOSE,
                _ => Balance::EMPTY,
            })
            .sum()
    }

    /// Every bracket is matched
    pub fn is_balanced(&self) -> bool {
        *self == Balance::EMPTY
    }

    /// Some brackets are still open and none closed too early; a reader
    /// should wait for more input
    pub fn is_incomplete(&self) -> bool {
        self.unmatched_close == 0 && self.unmatched_open > 0
    }
}

impl Add for Balance {
    type Output = Balance;

    fn add(self, rhs: Balance) -> Balance {
        self.combine(rhs)
    }
}

impl Sum for Balance {
    fn sum<I: Iterator<Item = Balance>>(iter: I) -> Balance {
        iter.fold(Balance::EMPTY, Balance::combine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::klisp;

    const ROUND: (char, char) = ('(', ')');

    #[test]
    fn test_balanced_code() {
        assert!(Balance::of_chars("(define x (+ 1 2))", ROUND).is_balanced());
    }

    #[test]
    fn test_missing_close() {
        let b = Balance::of_chars("(define x (+ 1 2)", ROUND);
        assert_eq!(b, Balance { unmatched_close: 0, unmatched_open: 1 });
        assert!(b.is_incomplete());
    }

    #[test]
    fn test_close_before_open() {
        let b = Balance::of_chars(")(", ROUND);
        assert_eq!(b, Balance { unmatched_close: 1, unmatched_open: 1 });
        assert!(!b.is_balanced());
        assert!(!b.is_incomplete());
    }

    #[test]
    fn test_chunks_combine() {
        let whole = Balance::of_chars("(a (b) (c", ROUND);
        let parts = Balance::of_chars("(a (b", ROUND) + Balance::of_chars(") (c", ROUND);
        assert_eq!(whole, parts);
        assert_eq!(
            parts + Balance::of_chars("))", ROUND),
            Balance::EMPTY
        );
    }

    #[test]
    fn test_tokens_ignore_strings_and_comments() {
        let source = "(print \"(\") ; (";
        assert!(!Balance::of_chars(source, ROUND).is_balanced());
        let tokens = klisp::tokenize(source).unwrap();
        assert!(Balance::of_tokens(&tokens).is_balanced());
    }
}
