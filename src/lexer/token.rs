use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A location in the character input
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Characters before this position (0-indexed)
    pub offset: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Position {
    /// The position of the first character
    pub const START: Position = Position {
        offset: 0,
        line: 1,
        column: 1,
    };

    /// The position after consuming `c`
    pub fn advance(self, c: char) -> Position {
        if c == '\n' {
            Position {
                offset: self.offset + 1,
                line: self.line + 1,
                column: 1,
            }
        } else {
            Position {
                offset: self.offset + 1,
                column: self.column + 1,
                ..self
            }
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::START
    }
}

/// Half-open range `[start, end)` of input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// First character of the match
    pub start: Position,
    /// Position just past the match
    pub end: Position,
}

impl Span {
    /// Creates a span
    pub fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    /// Number of characters covered
    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    /// True if the span covers no characters
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lexical class of a token.
///
/// Tags are a closed set used for dispatch and ordering; the value a token
/// carries never becomes part of its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TokenTag {
    /// Opening delimiter
    Open,
    /// Closing delimiter
    Close,
    /// Other punctuation (quote, comma, dot)
    Punct,
    /// Symbol / identifier
    Symbol,
    /// Integer literal
    Integer,
    /// Decimal literal
    Decimal,
    /// String literal
    String,
    /// Character literal
    Char,
    /// Boolean literal
    Boolean,
    /// Keyword literal (`:name`)
    Keyword,
    /// Literal that matched its pattern but could not be converted
    Malformed,
}

impl fmt::Display for TokenTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TokenTag::Open => "open",
            TokenTag::Close => "close",
            TokenTag::Punct => "punctuation",
            TokenTag::Symbol => "symbol",
            TokenTag::Integer => "integer",
            TokenTag::Decimal => "decimal",
            TokenTag::String => "string",
            TokenTag::Char => "character",
            TokenTag::Boolean => "boolean",
            TokenTag::Keyword => "keyword",
            TokenTag::Malformed => "malformed",
        };
        f.write_str(name)
    }
}

/// All token values the KLisp and Scheme lexers produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TokenKind {
    // Delimiters
    /// Opening delimiter, e.g. `(` or `#(`
    Open(String),
    /// Closing delimiter, e.g. `)`
    Close(String),
    /// Quote, quasi-quote, unquote, dot
    Punct(String),

    // Literals
    /// Symbol
    Symbol(String),
    /// Integer literal
    Integer(i64),
    /// Decimal literal
    Decimal(f64),
    /// String literal, escapes resolved
    String(String),
    /// Character literal
    Char(char),
    /// Boolean literal
    Boolean(bool),
    /// Keyword literal, including the leading `:`
    Keyword(String),

    /// A literal whose text could not be converted
    Malformed {
        /// The class the text was matched as
        expected: TokenTag,
        /// Why conversion failed
        reason: String,
    },
}

impl TokenKind {
    /// The lexical class of this token
    pub fn tag(&self) -> TokenTag {
        match self {
            TokenKind::Open(_) => TokenTag::Open,
            TokenKind::Close(_) => TokenTag::Close,
            TokenKind::Punct(_) => TokenTag::Punct,
            TokenKind::Symbol(_) => TokenTag::Symbol,
            TokenKind::Integer(_) => TokenTag::Integer,
            TokenKind::Decimal(_) => TokenTag::Decimal,
            TokenKind::String(_) => TokenTag::String,
            TokenKind::Char(_) => TokenTag::Char,
            TokenKind::Boolean(_) => TokenTag::Boolean,
            TokenKind::Keyword(_) => TokenTag::Keyword,
            TokenKind::Malformed { .. } => TokenTag::Malformed,
        }
    }

    /// `(`
    pub fn open_paren() -> Self {
        TokenKind::Open("(".to_string())
    }

    /// `)`
    pub fn close_paren() -> Self {
        TokenKind::Close(")".to_string())
    }

    /// Check if token is a literal value
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Integer(_)
                | TokenKind::Decimal(_)
                | TokenKind::String(_)
                | TokenKind::Char(_)
                | TokenKind::Boolean(_)
                | TokenKind::Keyword(_)
        )
    }

    fn value_cmp(&self, other: &Self) -> Ordering {
        use TokenKind::*;
        match (self, other) {
            (Open(a), Open(b))
            | (Close(a), Close(b))
            | (Punct(a), Punct(b))
            | (Symbol(a), Symbol(b))
            | (String(a), String(b))
            | (Keyword(a), Keyword(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Decimal(a), Decimal(b)) => a.total_cmp(b),
            (Char(a), Char(b)) => a.cmp(b),
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (
                Malformed { expected: e1, reason: r1 },
                Malformed { expected: e2, reason: r2 },
            ) => e1.cmp(e2).then_with(|| r1.cmp(r2)),
            _ => Ordering::Equal,
        }
    }
}

impl Ord for TokenKind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tag()
            .cmp(&other.tag())
            .then_with(|| self.value_cmp(other))
    }
}

impl PartialOrd for TokenKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TokenKind {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TokenKind {}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Open(s) | TokenKind::Close(s) | TokenKind::Punct(s) => write!(f, "{}", s),
            TokenKind::Symbol(s) | TokenKind::Keyword(s) => write!(f, "{}", s),
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Decimal(d) => write!(f, "{}", d),
            TokenKind::String(s) => write!(f, "\"{}\"", s.escape_debug()),
            TokenKind::Char(c) => write!(f, "\\{}", c),
            TokenKind::Boolean(b) => write!(f, "{}", b),
            TokenKind::Malformed { expected, reason } => {
                write!(f, "<malformed {}: {}>", expected, reason)
            }
        }
    }
}

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The type and value of the token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Where the token appears
    pub span: Span,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    /// The lexical class of this token
    pub fn tag(&self) -> TokenTag {
        self.kind.tag()
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.span.start.cmp(&other.span.start))
            .then_with(|| self.span.end.cmp(&other.span.end))
            .then_with(|| self.lexeme.cmp(&other.lexeme))
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.kind, self.span.start.line, self.span.start.column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by_tag_then_value() {
        let mut kinds = vec![
            TokenKind::Symbol("b".to_string()),
            TokenKind::Integer(3),
            TokenKind::Symbol("a".to_string()),
            TokenKind::open_paren(),
            TokenKind::Integer(-1),
        ];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![
                TokenKind::open_paren(),
                TokenKind::Symbol("a".to_string()),
                TokenKind::Symbol("b".to_string()),
                TokenKind::Integer(-1),
                TokenKind::Integer(3),
            ]
        );
    }

    #[test]
    fn test_decimal_equality() {
        assert_eq!(TokenKind::Decimal(-12.5e3), TokenKind::Decimal(-12500.0));
        assert_ne!(TokenKind::Decimal(1.0), TokenKind::Integer(1));
    }

    #[test]
    fn test_position_advance() {
        let pos = Position::START.advance('a').advance('\n').advance('b');
        assert_eq!(pos, Position { offset: 3, line: 2, column: 2 });
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenKind::String("a\"b".to_string()).to_string(), "\"a\\\"b\"");
        assert_eq!(TokenKind::Char('x').to_string(), "\\x");
        let tok = Token::new(
            TokenKind::Boolean(true),
            "true",
            Span::new(Position::START, Position::START.advance('t')),
        );
        assert_eq!(tok.to_string(), "true at line 1, column 1");
    }
}
