//! KLisp grammar
//!
//! Whitespace and `;` comments produce no tokens. Strings are scanned in a
//! dedicated stateful state that accumulates the body and resolves the
//! `\"`, `\n`, `\t` and `\\` escapes; any other backslash is kept as is.
//!
//! Numeric text that fits the literal grammar but not the value type
//! (an integer beyond `i64`, a decimal beyond `f64`) becomes a
//! [`TokenKind::Malformed`] token and lexing continues.

use super::engine::Lexer;
use super::rules::{Emitter, LexerRules, StateId, StatefulState};
use super::token::{Position, Span, Token, TokenKind, TokenTag};
use crate::error::Result;
use crate::language::{any_char, end_of_input, lit, none_of, one_of, range, Language};

/// Characters that may start a symbol
const SYMBOL_PUNCT: &str = "+/*_?%$#&^=!@<>";

/// Accumulated string literal
#[derive(Debug, Clone, Default)]
struct StringBody {
    start: Position,
    value: String,
    lexeme: String,
}

pub(crate) fn text(cs: &[char]) -> String {
    cs.iter().collect()
}

fn symbol_head() -> Language {
    range('A', 'Z') | range('a', 'z') | one_of(SYMBOL_PUNCT)
}

fn symbol_body() -> Language {
    symbol_head() | range('0', '9') | one_of("-:")
}

fn digits() -> Language {
    range('0', '9').one_or_more()
}

pub(crate) fn integer() -> Language {
    lit("-").optional().then(&digits())
}

pub(crate) fn decimal() -> Language {
    let prefix = lit("-").optional().then(&lit(".").optional()) | integer().then(&lit("."));
    let exponent = one_of("eE").then(&integer()).optional();
    prefix.then(&digits()).then(&exponent)
}

pub(crate) fn symbol() -> Language {
    let plain = symbol_head().then(&symbol_body().zero_or_more());
    let dashed = lit("-")
        .then(&(symbol_head() | one_of("-:")))
        .then(&symbol_body().zero_or_more());
    plain | dashed
}

fn keyword() -> Language {
    lit(":").then(&symbol_body().one_or_more())
}

pub(crate) fn whitespace() -> Language {
    one_of(" \r\t\n").one_or_more()
}

pub(crate) fn comment() -> Language {
    lit(";").then(&none_of("\r\n").zero_or_more())
}

/// The KLisp rule table
pub fn rules() -> LexerRules<Token> {
    let mut rules = LexerRules::new();
    let main = rules.declare("main");
    string_rules(&mut rules, main);

    rules
        .on(main, "(")
        .run(|out| emit(out, TokenKind::open_paren(), "("));
    rules
        .on(main, ")")
        .run(|out| emit(out, TokenKind::close_paren(), ")"));
    rules
        .on(main, "true")
        .run(|out| emit(out, TokenKind::Boolean(true), "true"));
    rules
        .on(main, "false")
        .run(|out| emit(out, TokenKind::Boolean(false), "false"));
    rules.on(main, end_of_input()).run(|out| out.terminate());
    rules.on(main, whitespace()).run(|_| {});
    rules.on(main, comment()).run(|_| {});
    rules.on(main, integer()).over(|out, cs| {
        let lexeme = text(cs);
        emit(out, integer_value(&lexeme), lexeme);
    });
    rules.on(main, decimal()).over(|out, cs| {
        let lexeme = text(cs);
        emit(out, decimal_value(&lexeme), lexeme);
    });
    rules
        .on(main, keyword())
        .over(|out, cs| emit(out, TokenKind::Keyword(text(cs)), text(cs)));
    rules
        .on(main, symbol())
        .over(|out, cs| emit(out, TokenKind::Symbol(text(cs)), text(cs)));
    rules.on(main, lit("\\").then(&any_char())).over(|out, cs| {
        if let Some(&c) = cs.get(1) {
            emit(out, TokenKind::Char(c), text(cs));
        }
    });

    rules
}

/// Declares the string state and the `"` rule in `main` that enters it
pub(crate) fn string_rules(rules: &mut LexerRules<Token>, main: StateId) {
    let string = rules.declare_stateful("string", StringBody::default());
    {
        let string = string.clone();
        rules.switches_on(main, "\"").to(move |out| {
            let body = StringBody {
                start: out.span().start,
                value: String::new(),
                lexeme: "\"".to_string(),
            };
            string.enter(out, body)
        });
    }

    rules.update(&string, "\"", move |out, body, _| {
        body.lexeme.push('"');
        let span = Span::new(body.start, out.span().end);
        out.emit(Token::new(
            TokenKind::String(std::mem::take(&mut body.value)),
            std::mem::take(&mut body.lexeme),
            span,
        ));
        main
    });
    add_escapes(rules, &string, &[('"', '"'), ('n', '\n'), ('t', '\t'), ('\\', '\\')]);
    let id = string.id();
    rules.update(&string, any_char(), move |_, body, cs| {
        body.value.extend(cs);
        body.lexeme.extend(cs);
        id
    });
}

fn add_escapes(
    rules: &mut LexerRules<Token>,
    string: &StatefulState<StringBody>,
    escapes: &[(char, char)],
) {
    let id = string.id();
    for &(escape, value) in escapes {
        rules.update(string, lit("\\").then(&Language::literal(escape)), move |_, body, cs| {
            body.value.push(value);
            body.lexeme.extend(cs);
            id
        });
    }
}

pub(crate) fn emit(out: &mut Emitter<'_, Token>, kind: TokenKind, lexeme: impl Into<String>) {
    let span = out.span();
    out.emit(Token::new(kind, lexeme, span));
}

pub(crate) fn integer_value(lexeme: &str) -> TokenKind {
    match lexeme.parse::<i64>() {
        Ok(n) => TokenKind::Integer(n),
        Err(e) => {
            tracing::warn!(lexeme, error = %e, "integer literal out of range");
            TokenKind::Malformed {
                expected: TokenTag::Integer,
                reason: e.to_string(),
            }
        }
    }
}

fn decimal_value(lexeme: &str) -> TokenKind {
    match lexeme.parse::<f64>() {
        Ok(d) if d.is_finite() => TokenKind::Decimal(d),
        Ok(_) => {
            tracing::warn!(lexeme, "decimal literal out of range");
            TokenKind::Malformed {
                expected: TokenTag::Decimal,
                reason: "number too large to fit in target type".to_string(),
            }
        }
        Err(e) => {
            tracing::warn!(lexeme, error = %e, "invalid decimal literal");
            TokenKind::Malformed {
                expected: TokenTag::Decimal,
                reason: e.to_string(),
            }
        }
    }
}

/// A lexer for KLisp
pub fn lexer() -> Result<Lexer<Token>> {
    Lexer::new(rules())
}

/// Lexes a complete KLisp source string
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    lexer()?.lex_str(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_symbol_shapes() {
        assert!(symbol().matches("+"));
        assert!(symbol().matches("->"));
        assert!(symbol().matches("-x"));
        assert!(symbol().matches("set!"));
        assert!(symbol().matches("a-b:c"));
        assert!(!symbol().matches("-"));
        assert!(!symbol().matches("-1"));
        assert!(!symbol().matches("1a"));
    }

    #[test]
    fn test_number_shapes() {
        assert!(integer().matches("-42"));
        assert!(!integer().matches("-"));
        assert!(decimal().matches("-12.5e3"));
        assert!(decimal().matches(".5"));
        assert!(decimal().matches("-.5"));
        assert!(decimal().matches("1e10"));
        assert!(!decimal().matches("1."));
        assert!(!decimal().matches("."));
    }

    #[test]
    fn test_escapes() {
        assert_eq!(
            kinds(r#""a\tb\\c\nd""#),
            vec![TokenKind::String("a\tb\\c\nd".to_string())]
        );
        assert_eq!(kinds(r#""\q""#), vec![TokenKind::String("\\q".to_string())]);
    }

    #[test]
    fn test_string_span_covers_quotes() {
        let tokens = tokenize(r#"  "hi" x"#).unwrap();
        assert_eq!(tokens[0].lexeme, "\"hi\"");
        assert_eq!(tokens[0].span.start.offset, 2);
        assert_eq!(tokens[0].span.end.offset, 6);
        assert_eq!(tokens[1].kind, TokenKind::Symbol("x".to_string()));
    }

    #[test]
    fn test_integer_overflow_is_malformed() {
        let tokens = kinds("99999999999999999999 1");
        assert!(matches!(
            tokens[0],
            TokenKind::Malformed { expected: TokenTag::Integer, .. }
        ));
        assert_eq!(tokens[1], TokenKind::Integer(1));
    }

    #[test]
    fn test_decimal_overflow_is_malformed() {
        assert!(matches!(
            kinds("1e999")[0],
            TokenKind::Malformed { expected: TokenTag::Decimal, .. }
        ));
    }

    #[test]
    fn test_char_literal() {
        assert_eq!(
            kinds(r"\a \(").as_slice(),
            &[TokenKind::Char('a'), TokenKind::Char('(')]
        );
    }

    #[test]
    fn test_keyword_allows_dashes() {
        assert_eq!(kinds(":a-b"), vec![TokenKind::Keyword(":a-b".to_string())]);
    }

    #[test]
    fn test_boolean_prefix_is_symbol() {
        assert_eq!(
            kinds("truex false"),
            vec![TokenKind::Symbol("truex".to_string()), TokenKind::Boolean(false)]
        );
    }
}
