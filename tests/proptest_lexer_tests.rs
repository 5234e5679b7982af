//! Property-based tests for the language algebra and the lexer
//!
//! These tests use proptest to generate random inputs and verify that:
//! 1. Derivatives agree with a naive backtracking matcher
//! 2. The precomputed attributes agree with brute-force enumeration
//! 3. Splitting the input into arbitrary chunks never changes the tokens
//! 4. Bracket balance combines associatively

use klisp_lexer::language::{any_char, empty_language, empty_string, end_of_input, Language};
use klisp_lexer::lexer::klisp;
use klisp_lexer::{Balance, Source};
use proptest::prelude::*;
use std::collections::BTreeSet;

// =============================================================================
// REFERENCE MATCHER
// =============================================================================

const ALPHABET: [char; 3] = ['a', 'b', 'c'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sym {
    Char(char),
    End,
}

/// Mirror of a language built with the public constructors
#[derive(Debug, Clone)]
enum Re {
    Lit(char),
    Set(Vec<char>),
    Any,
    End,
    Empty,
    Eps,
    Cat(Box<Re>, Box<Re>),
    Alt(Box<Re>, Box<Re>),
    Star(Box<Re>),
    Opt(Box<Re>),
    Rep(Box<Re>, usize),
}

impl Re {
    fn build(&self) -> Language {
        match self {
            Re::Lit(c) => Language::literal(*c),
            Re::Set(cs) => Language::char_set(cs.iter().copied()),
            Re::Any => any_char(),
            Re::End => end_of_input(),
            Re::Empty => empty_language(),
            Re::Eps => empty_string(),
            Re::Cat(a, b) => a.build().then(&b.build()),
            Re::Alt(a, b) => a.build() | b.build(),
            Re::Star(a) => a.build().zero_or_more(),
            Re::Opt(a) => a.build().optional(),
            Re::Rep(a, n) => a.build().repeat(*n),
        }
    }

    /// Every position a match starting at `start` can end at
    fn ends(&self, input: &[Sym], start: usize) -> BTreeSet<usize> {
        let single = |ok: bool| -> BTreeSet<usize> {
            if ok {
                BTreeSet::from([start + 1])
            } else {
                BTreeSet::new()
            }
        };
        let next = input.get(start).copied();
        match self {
            Re::Lit(c) => single(next == Some(Sym::Char(*c))),
            Re::Set(cs) => single(matches!(next, Some(Sym::Char(x)) if cs.contains(&x))),
            Re::Any => single(matches!(next, Some(Sym::Char(_)))),
            Re::End => single(next == Some(Sym::End)),
            Re::Empty => BTreeSet::new(),
            Re::Eps => BTreeSet::from([start]),
            Re::Cat(a, b) => a
                .ends(input, start)
                .into_iter()
                .flat_map(|mid| b.ends(input, mid))
                .collect(),
            Re::Alt(a, b) => a.ends(input, start).union(&b.ends(input, start)).copied().collect(),
            Re::Star(a) => {
                let mut reached = BTreeSet::from([start]);
                let mut frontier = vec![start];
                while let Some(p) = frontier.pop() {
                    for e in a.ends(input, p) {
                        if reached.insert(e) {
                            frontier.push(e);
                        }
                    }
                }
                reached
            }
            Re::Opt(a) => {
                let mut ends = a.ends(input, start);
                ends.insert(start);
                ends
            }
            Re::Rep(a, n) => (0..*n).fold(BTreeSet::from([start]), |at, _| {
                at.into_iter().flat_map(|p| a.ends(input, p)).collect()
            }),
        }
    }

    fn accepts(&self, input: &[Sym]) -> bool {
        self.ends(input, 0).contains(&input.len())
    }
}

fn derive_all(lang: &Language, input: &[Sym]) -> Language {
    input.iter().fold(lang.clone(), |l, sym| match sym {
        Sym::Char(c) => l.derive(*c),
        Sym::End => l.derive_end(),
    })
}

/// All words up to length 3, with and without a trailing end marker
fn short_words() -> Vec<Vec<Sym>> {
    let mut words: Vec<Vec<Sym>> = vec![vec![]];
    let mut layer: Vec<Vec<Sym>> = vec![vec![]];
    for _ in 0..3 {
        layer = layer
            .iter()
            .flat_map(|w| {
                ALPHABET.iter().map(move |c| {
                    let mut w = w.clone();
                    w.push(Sym::Char(*c));
                    w
                })
            })
            .collect();
        words.extend(layer.iter().cloned());
    }
    let ended: Vec<Vec<Sym>> = words
        .iter()
        .map(|w| {
            let mut w = w.clone();
            w.push(Sym::End);
            w
        })
        .collect();
    words.extend(ended);
    words
}

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

fn alphabet_char() -> impl Strategy<Value = char> {
    prop::sample::select(ALPHABET.to_vec())
}

fn regex_tree() -> impl Strategy<Value = Re> {
    let leaf = prop_oneof![
        alphabet_char().prop_map(Re::Lit),
        prop::collection::vec(alphabet_char(), 0..3).prop_map(Re::Set),
        Just(Re::Any),
        Just(Re::End),
        Just(Re::Empty),
        Just(Re::Eps),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Re::Cat(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Re::Alt(Box::new(a), Box::new(b))),
            inner.clone().prop_map(|a| Re::Star(Box::new(a))),
            inner.clone().prop_map(|a| Re::Opt(Box::new(a))),
            (inner, 0usize..4).prop_map(|(a, n)| Re::Rep(Box::new(a), n)),
        ]
    })
}

fn word() -> impl Strategy<Value = Vec<Sym>> {
    (prop::collection::vec(alphabet_char(), 0..6), any::<bool>()).prop_map(|(cs, end)| {
        let mut w: Vec<Sym> = cs.into_iter().map(Sym::Char).collect();
        if end {
            w.push(Sym::End);
        }
        w
    })
}

/// Tokens that look like KLisp source
fn klisp_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("(".to_string()),
        Just(")".to_string()),
        Just("true".to_string()),
        Just("false".to_string()),
        Just("->".to_string()),
        Just("+".to_string()),
        (-1000i64..1000i64).prop_map(|n| n.to_string()),
        (-100.0f64..100.0f64).prop_map(|f| format!("{:.2}", f)),
        (1i64..100, -5i64..5).prop_map(|(m, e)| format!("{}e{}", m, e)),
        "[a-z][a-z0-9_?!-]{0,8}".prop_map(|s| s),
        ":[a-z]{1,6}".prop_map(|s| s),
        r#""([a-z ]|\\"|\\n|\\\\){0,10}""#.prop_map(|s| s),
        "\\\\[a-z(]".prop_map(|s| s),
        ";[a-z ]{0,12}\n".prop_map(|s| s),
    ]
}

fn klisp_source() -> impl Strategy<Value = String> {
    prop::collection::vec(klisp_token(), 0..40).prop_map(|tokens| tokens.join(" "))
}

fn chunked(source: String) -> impl Strategy<Value = (String, Vec<usize>)> {
    let len = source.chars().count();
    prop::collection::vec(1usize..8, 0..=len).prop_map(move |sizes| (source.clone(), sizes))
}

fn split(source: &str, sizes: &[usize]) -> Vec<String> {
    let chars: Vec<char> = source.chars().collect();
    let mut chunks = Vec::new();
    let mut at = 0;
    for size in sizes.iter().copied().chain(std::iter::repeat(1)) {
        if at >= chars.len() {
            break;
        }
        let end = (at + size).min(chars.len());
        chunks.push(chars[at..end].iter().collect());
        at = end;
    }
    chunks
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    /// Differentiating by a word and checking nullability is matching
    #[test]
    fn derivative_law(re in regex_tree(), w in word()) {
        let lang = re.build();
        prop_assert_eq!(derive_all(&lang, &w).accepts_empty_string(), re.accepts(&w));
    }

    /// Derivative by one symbol, then the rest, is derivative by the whole word
    #[test]
    fn derivative_composes(re in regex_tree(), c in alphabet_char(), w in word()) {
        let lang = re.build();
        let mut cw = vec![Sym::Char(c)];
        cw.extend(w.iter().copied());
        prop_assert_eq!(
            derive_all(&lang.derive(c), &w).accepts_empty_string(),
            re.accepts(&cw)
        );
    }

    /// Precomputed attributes agree with enumeration over short words
    #[test]
    fn attributes_agree_with_enumeration(re in regex_tree()) {
        let lang = re.build();
        let accepted: Vec<Vec<Sym>> = short_words().into_iter().filter(|w| re.accepts(w)).collect();

        prop_assert_eq!(lang.accepts_empty_string(), re.accepts(&[]));
        if lang.rejects_all() {
            prop_assert!(accepted.is_empty());
        }
        if !accepted.is_empty() {
            prop_assert!(!lang.rejects_all());
        }
        if lang.is_empty_string_only() {
            prop_assert_eq!(accepted, vec![Vec::<Sym>::new()]);
        }
    }

    /// Attributes stay consistent on every derivative, not just the root
    #[test]
    fn derivative_attributes_consistent(re in regex_tree(), w in word()) {
        let d = derive_all(&re.build(), &w);
        if d.is_empty_string_only() {
            prop_assert!(d.accepts_empty_string());
            prop_assert!(!d.rejects_all());
        }
        if d.rejects_all() {
            prop_assert!(!d.accepts_empty_string());
            for c in ALPHABET {
                prop_assert!(d.derive(c).rejects_all());
            }
            prop_assert!(d.derive_end().rejects_all());
        }
    }

    /// The lexer never panics on arbitrary input
    #[test]
    fn lexer_never_panics(source in r"[\x00-\x7F]{0,200}") {
        let _ = klisp::tokenize(&source);
    }

    /// Chunked pushes produce exactly what lexing the whole string does
    #[test]
    fn streaming_equivalence((source, sizes) in klisp_source().prop_flat_map(chunked)) {
        let whole = klisp::tokenize(&source);

        let input = Source::new();
        let session = klisp::lexer().unwrap().lex(input.stream()).unwrap();
        for chunk in split(&source, &sizes) {
            input.push(chunk.chars());
        }
        input.terminate();

        prop_assert_eq!(session.check().map(|_| session.tokens()), whole);
    }

    /// Balance is a monoid homomorphism from string concatenation
    #[test]
    fn balance_combines(a in "[()a ]{0,20}", b in "[()a ]{0,20}", c in "[()a ]{0,20}") {
        let round = ('(', ')');
        let (ba, bb, bc) = (
            Balance::of_chars(&a, round),
            Balance::of_chars(&b, round),
            Balance::of_chars(&c, round),
        );
        prop_assert_eq!(Balance::of_chars(&format!("{}{}", a, b), round), ba + bb);
        prop_assert_eq!((ba + bb) + bc, ba + (bb + bc));
        prop_assert_eq!(ba + Balance::EMPTY, ba);
        prop_assert_eq!(Balance::EMPTY + ba, ba);
    }
}
