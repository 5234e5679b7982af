//! Scheme grammar
//!
//! Shares strings, whitespace, comments and integers with KLisp. Adds the
//! quoting punctuation, `#t`/`#f`, `#\x` characters and `#! ... !#` block
//! comments, which nest.

use super::engine::Lexer;
use super::klisp::{comment, emit, integer, integer_value, string_rules, text, whitespace};
use super::rules::LexerRules;
use super::token::{Token, TokenKind};
use crate::error::Result;
use crate::language::{any_char, end_of_input, lit, one_of, range, Language};

const OPEN: [&str; 4] = ["#(", "(", "[", "{"];
const CLOSE: [&str; 3] = [")", "]", "}"];
const PUNCT: [&str; 4] = [",@", ",", "`", "'"];

fn identifier() -> Language {
    let body = range('A', 'Z') | range('a', 'z') | range('0', '9') | one_of("-+/*_?%$&^=!@<>:");
    body.then(&(body.clone() | lit("#")).zero_or_more())
}

/// The Scheme rule table
pub fn rules() -> LexerRules<Token> {
    let mut rules = LexerRules::new();
    let main = rules.declare("main");
    let block = rules.declare_stateful("block-comment", 0usize);

    {
        let block = block.clone();
        rules.switches_on(main, "#!").to(move |out| block.enter(out, 1));
    }
    string_rules(&mut rules, main);

    for punct in PUNCT {
        rules
            .on(main, punct)
            .run(move |out| emit(out, TokenKind::Punct(punct.to_string()), punct));
    }
    for open in OPEN {
        rules
            .on(main, open)
            .run(move |out| emit(out, TokenKind::Open(open.to_string()), open));
    }
    for close in CLOSE {
        rules
            .on(main, close)
            .run(move |out| emit(out, TokenKind::Close(close.to_string()), close));
    }
    rules
        .on(main, ".")
        .run(|out| emit(out, TokenKind::Punct(".".to_string()), "."));
    rules
        .on(main, "#t")
        .run(|out| emit(out, TokenKind::Boolean(true), "#t"));
    rules
        .on(main, "#f")
        .run(|out| emit(out, TokenKind::Boolean(false), "#f"));
    rules.on(main, end_of_input()).run(|out| out.terminate());
    rules.on(main, whitespace()).run(|_| {});
    rules.on(main, comment()).run(|_| {});
    rules.on(main, lit("#\\").then(&any_char())).over(|out, cs| {
        if let Some(&c) = cs.get(2) {
            emit(out, TokenKind::Char(c), text(cs));
        }
    });
    rules.on(main, integer()).over(|out, cs| {
        let lexeme = text(cs);
        emit(out, integer_value(&lexeme), lexeme);
    });
    rules
        .on(main, identifier())
        .over(|out, cs| emit(out, TokenKind::Symbol(text(cs)), text(cs)));

    let id = block.id();
    rules.update(&block, "#!", move |_, depth, _| {
        *depth += 1;
        id
    });
    rules.on(id, any_char()).run(|_| {});
    rules.update(&block, "!#", move |_, depth, _| {
        if *depth <= 1 {
            main
        } else {
            *depth -= 1;
            id
        }
    });

    rules
}

/// A lexer for Scheme
pub fn lexer() -> Result<Lexer<Token>> {
    Lexer::new(rules())
}

/// Lexes a complete Scheme source string
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    lexer()?.lex_str(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn sym(s: &str) -> TokenKind {
        TokenKind::Symbol(s.to_string())
    }

    #[test]
    fn test_mixed_expression() {
        assert_eq!(
            kinds(r#"(+ #\1 (* #t #f) (+ "test string"))"#),
            vec![
                TokenKind::open_paren(),
                sym("+"),
                TokenKind::Char('1'),
                TokenKind::open_paren(),
                sym("*"),
                TokenKind::Boolean(true),
                TokenKind::Boolean(false),
                TokenKind::close_paren(),
                TokenKind::open_paren(),
                sym("+"),
                TokenKind::String("test string".to_string()),
                TokenKind::close_paren(),
                TokenKind::close_paren(),
            ]
        );
    }

    #[test]
    fn test_quoting_punctuation() {
        assert_eq!(
            kinds("`(a ,b ,@c) '#(1)"),
            vec![
                TokenKind::Punct("`".to_string()),
                TokenKind::open_paren(),
                sym("a"),
                TokenKind::Punct(",".to_string()),
                sym("b"),
                TokenKind::Punct(",@".to_string()),
                sym("c"),
                TokenKind::close_paren(),
                TokenKind::Punct("'".to_string()),
                TokenKind::Open("#(".to_string()),
                TokenKind::Integer(1),
                TokenKind::close_paren(),
            ]
        );
    }

    #[test]
    fn test_nested_block_comment() {
        assert_eq!(
            kinds("a #! one #! two !# still !# b"),
            vec![sym("a"), sym("b")]
        );
    }

    #[test]
    fn test_unclosed_block_comment_fails() {
        assert!(matches!(
            tokenize("#! never closed"),
            Err(Error::DeadEnd { .. })
        ));
    }

    #[test]
    fn test_dotted_pair_and_brackets() {
        assert_eq!(
            kinds("[a . b]"),
            vec![
                TokenKind::Open("[".to_string()),
                sym("a"),
                TokenKind::Punct(".".to_string()),
                sym("b"),
                TokenKind::Close("]".to_string()),
            ]
        );
    }

    #[test]
    fn test_bare_dash_is_symbol() {
        assert_eq!(kinds("- -1"), vec![sym("-"), TokenKind::Integer(-1)]);
    }
}
