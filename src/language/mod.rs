//! Regular languages with Brzozowski derivatives
//!
//! A [`Language`] is an immutable description of a set of character
//! sequences. Instead of compiling patterns into an automaton, the lexer
//! keeps the language "still to be matched" and differentiates it one
//! character at a time:
//!
//! ```rust
//! use klisp_lexer::language::{lit, range};
//!
//! let digits = range('0', '9').one_or_more();
//! let hex = lit("0x").then(&digits);
//!
//! assert!(hex.matches("0x42"));
//! assert!(!hex.matches("0x"));
//! assert!(!hex.derive('0').derive('x').accepts_empty_string());
//! ```
//!
//! Nodes are reference counted and structurally shared. The three
//! attributes (`accepts_empty_string`, `rejects_all`,
//! `is_empty_string_only`) are computed once per node from its children,
//! and the smart constructors use them to keep derivatives small.

pub mod cache;
mod patterns;

pub use cache::{clear_union_cache, set_union_cache_capacity, union_cache_stats, CacheStats};
pub use patterns::{any_char, empty_language, empty_string, end_of_input, lit, none_of, one_of, range};

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::BitOr;
use std::sync::Arc;

/// Number of Unicode scalar values; a negated set this large matches nothing.
const CHAR_COUNT: usize = 0x11_0000 - 0x800;

lazy_static::lazy_static! {
    static ref EMPTY_LANGUAGE: Language = Language::from_kind(Kind::EmptyLanguage);
    static ref EMPTY_STRING: Language = Language::from_kind(Kind::EmptyString);
    static ref ANY_CHAR: Language = Language::from_kind(Kind::AnyChar);
    static ref END_OF_INPUT: Language = Language::from_kind(Kind::EndOfInput);
}

/// Shape of a language node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Exactly one given character
    Literal(char),
    /// Any single character from the set
    CharSet(BTreeSet<char>),
    /// Any single character outside the set
    NegatedCharSet(BTreeSet<char>),
    /// Any single character
    AnyChar,
    /// The end-of-input marker; only [`Language::derive_end`] consumes it
    EndOfInput,
    /// Matches nothing
    EmptyLanguage,
    /// Matches only the empty string
    EmptyString,
    /// `prefix` followed by `suffix`
    Concat(Language, Language),
    /// Either side
    Union(Language, Language),
    /// Zero or more repetitions
    Star(Language),
    /// Exactly `n` repetitions
    Repeat(Language, usize),
}

struct Node {
    kind: Kind,
    hash: u64,
    accepts_empty_string: bool,
    rejects_all: bool,
    is_empty_string_only: bool,
}

/// Input symbol a language can be differentiated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    Char(char),
    End,
}

/// An immutable, structurally shared regular language
#[derive(Clone)]
pub struct Language(Arc<Node>);

impl Language {
    fn from_kind(kind: Kind) -> Self {
        let (accepts_empty_string, rejects_all, is_empty_string_only) = match &kind {
            Kind::Literal(_) | Kind::AnyChar | Kind::EndOfInput => (false, false, false),
            Kind::CharSet(set) => (false, set.is_empty(), false),
            Kind::NegatedCharSet(set) => (false, set.len() >= CHAR_COUNT, false),
            Kind::EmptyLanguage => (false, true, false),
            Kind::EmptyString => (true, false, true),
            Kind::Concat(prefix, suffix) => {
                let rejects = prefix.rejects_all() || suffix.rejects_all();
                (
                    prefix.accepts_empty_string() && suffix.accepts_empty_string(),
                    rejects,
                    !rejects && prefix.is_empty_string_only() && suffix.is_empty_string_only(),
                )
            }
            Kind::Union(left, right) => {
                let rejects = left.rejects_all() && right.rejects_all();
                let side_ok = |l: &Language| l.is_empty_string_only() || l.rejects_all();
                (
                    left.accepts_empty_string() || right.accepts_empty_string(),
                    rejects,
                    !rejects && side_ok(left) && side_ok(right),
                )
            }
            Kind::Star(inner) => (
                true,
                false,
                inner.is_empty_string_only() || inner.rejects_all(),
            ),
            Kind::Repeat(_, 0) => (true, false, true),
            Kind::Repeat(inner, _) => (
                inner.accepts_empty_string(),
                inner.rejects_all(),
                inner.is_empty_string_only(),
            ),
        };

        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);

        Language(Arc::new(Node {
            kind,
            hash: hasher.finish(),
            accepts_empty_string,
            rejects_all,
            is_empty_string_only,
        }))
    }

    /// The language matching nothing at all
    pub fn empty() -> Self {
        EMPTY_LANGUAGE.clone()
    }

    /// The language matching only the empty string
    pub fn epsilon() -> Self {
        EMPTY_STRING.clone()
    }

    /// Any single character
    pub fn any_char() -> Self {
        ANY_CHAR.clone()
    }

    /// Matches only when the input has been terminated
    pub fn end_of_input() -> Self {
        END_OF_INPUT.clone()
    }

    /// Exactly the character `c`
    pub fn literal(c: char) -> Self {
        Language::from_kind(Kind::Literal(c))
    }

    /// Any one character from `chars`
    pub fn char_set(chars: impl IntoIterator<Item = char>) -> Self {
        Language::from_kind(Kind::CharSet(chars.into_iter().collect()))
    }

    /// Any one character not in `chars`
    pub fn negated_char_set(chars: impl IntoIterator<Item = char>) -> Self {
        Language::from_kind(Kind::NegatedCharSet(chars.into_iter().collect()))
    }

    /// The node shape, for inspection
    pub fn kind(&self) -> &Kind {
        &self.0.kind
    }

    /// True iff the language contains the empty string
    pub fn accepts_empty_string(&self) -> bool {
        self.0.accepts_empty_string
    }

    /// True iff the language contains no strings at all
    pub fn rejects_all(&self) -> bool {
        self.0.rejects_all
    }

    /// True iff the empty string is the only member
    pub fn is_empty_string_only(&self) -> bool {
        self.0.is_empty_string_only
    }

    /// Derivative with respect to one character.
    ///
    /// The result accepts `w` exactly when `self` accepts `c` followed by `w`.
    pub fn derive(&self, c: char) -> Language {
        self.derive_symbol(Symbol::Char(c))
    }

    /// Derivative with respect to the end-of-input marker.
    pub fn derive_end(&self) -> Language {
        self.derive_symbol(Symbol::End)
    }

    fn derive_symbol(&self, sym: Symbol) -> Language {
        match (self.kind(), sym) {
            (Kind::Literal(expected), Symbol::Char(c)) if *expected == c => Language::epsilon(),
            (Kind::CharSet(set), Symbol::Char(c)) if set.contains(&c) => Language::epsilon(),
            (Kind::NegatedCharSet(set), Symbol::Char(c)) if !set.contains(&c) => {
                Language::epsilon()
            }
            (Kind::AnyChar, Symbol::Char(_)) => Language::epsilon(),
            (Kind::EndOfInput, Symbol::End) => Language::epsilon(),
            (Kind::Concat(prefix, suffix), _) => {
                let head = prefix.derive_symbol(sym).then(suffix);
                if prefix.accepts_empty_string() {
                    head.or(&suffix.derive_symbol(sym))
                } else {
                    head
                }
            }
            (Kind::Union(left, right), _) => left.derive_symbol(sym).or(&right.derive_symbol(sym)),
            (Kind::Star(inner), _) => inner.derive_symbol(sym).then(self),
            (Kind::Repeat(inner, n), _) => {
                let rest = inner.repeat(n - 1);
                let head = inner.derive_symbol(sym).then(&rest);
                if inner.accepts_empty_string() {
                    head.or(&rest.derive_symbol(sym))
                } else {
                    head
                }
            }
            _ => Language::empty(),
        }
    }

    /// True iff the whole of `input` is in the language
    pub fn matches(&self, input: &str) -> bool {
        input
            .chars()
            .fold(self.clone(), |lang, c| lang.derive(c))
            .accepts_empty_string()
    }

    /// Concatenation, simplified eagerly.
    pub fn then(&self, suffix: &Language) -> Language {
        if self.is_empty_string_only() {
            suffix.clone()
        } else if suffix.is_empty_string_only() {
            self.clone()
        } else if self.rejects_all() || suffix.rejects_all() {
            Language::empty()
        } else {
            Language::from_kind(Kind::Concat(self.clone(), suffix.clone()))
        }
    }

    /// Union, simplified and memoized in the shared union cache.
    pub fn or(&self, other: &Language) -> Language {
        cache::union(self, other)
    }

    /// Union without consulting the cache.
    fn union_uncached(left: &Language, right: &Language) -> Language {
        if left.rejects_all() {
            right.clone()
        } else if right.rejects_all() || left == right {
            left.clone()
        } else if left.subsumed_by(right) {
            right.clone()
        } else if right.subsumed_by(left) {
            left.clone()
        } else {
            Language::from_kind(Kind::Union(left.clone(), right.clone()))
        }
    }

    /// Cheap, conservative subset check used while building unions.
    fn subsumed_by(&self, other: &Language) -> bool {
        match (self.kind(), other.kind()) {
            (Kind::Literal(a), Kind::Literal(b)) => a == b,
            (Kind::Literal(_), Kind::AnyChar) => true,
            (Kind::Literal(a), Kind::CharSet(set)) => set.contains(a),
            (Kind::Literal(a), Kind::NegatedCharSet(set)) => !set.contains(a),
            (Kind::CharSet(_), Kind::AnyChar) => true,
            (Kind::EmptyString, _) => other.accepts_empty_string(),
            _ => false,
        }
    }

    /// Zero or more repetitions
    pub fn zero_or_more(&self) -> Language {
        if self.is_empty_string_only() || matches!(self.kind(), Kind::Star(_)) {
            self.clone()
        } else if self.rejects_all() {
            Language::epsilon()
        } else {
            Language::from_kind(Kind::Star(self.clone()))
        }
    }

    /// One or more repetitions
    pub fn one_or_more(&self) -> Language {
        if self.is_empty_string_only() {
            self.clone()
        } else if self.rejects_all() {
            Language::empty()
        } else {
            self.then(&self.zero_or_more())
        }
    }

    /// Zero or one occurrence
    pub fn optional(&self) -> Language {
        if self.is_empty_string_only() || self.accepts_empty_string() {
            self.clone()
        } else if self.rejects_all() {
            Language::epsilon()
        } else {
            Language::epsilon().or(self)
        }
    }

    /// Exactly `n` repetitions
    pub fn repeat(&self, n: usize) -> Language {
        match n {
            0 => Language::epsilon(),
            1 => self.clone(),
            _ if self.is_empty_string_only() => Language::epsilon(),
            _ if self.rejects_all() => Language::empty(),
            _ => Language::from_kind(Kind::Repeat(self.clone(), n)),
        }
    }

    /// Number of nodes in the expression tree, counting shared nodes once per use.
    pub fn size(&self) -> usize {
        match self.kind() {
            Kind::Concat(a, b) | Kind::Union(a, b) => 1 + a.size() + b.size(),
            Kind::Star(inner) | Kind::Repeat(inner, _) => 1 + inner.size(),
            _ => 1,
        }
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || (self.0.hash == other.0.hash && self.0.kind == other.0.kind)
    }
}

impl Eq for Language {}

impl Hash for Language {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl BitOr for Language {
    type Output = Language;

    fn bitor(self, rhs: Language) -> Language {
        self.or(&rhs)
    }
}

impl BitOr<&Language> for &Language {
    type Output = Language;

    fn bitor(self, rhs: &Language) -> Language {
        self.or(rhs)
    }
}

fn fmt_set(f: &mut fmt::Formatter<'_>, set: &BTreeSet<char>) -> fmt::Result {
    for c in set {
        write!(f, "{}", c.escape_debug())?;
    }
    Ok(())
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Kind::Literal(c) => write!(f, "'{}'", c.escape_debug()),
            Kind::CharSet(set) => {
                write!(f, "[")?;
                fmt_set(f, set)?;
                write!(f, "]")
            }
            Kind::NegatedCharSet(set) => {
                write!(f, "[^")?;
                fmt_set(f, set)?;
                write!(f, "]")
            }
            Kind::AnyChar => write!(f, "."),
            Kind::EndOfInput => write!(f, "$$$"),
            Kind::EmptyLanguage => write!(f, "∅"),
            Kind::EmptyString => write!(f, "ε"),
            Kind::Concat(a, b) => write!(f, "{}{}", a, b),
            Kind::Union(a, b) => write!(f, "({}|{})", a, b),
            Kind::Star(inner) => write!(f, "({})*", inner),
            Kind::Repeat(inner, n) => write!(f, "({}){{{}}}", inner, n),
        }
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Language({})", self)
    }
}
