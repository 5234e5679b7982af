//! Shorthand constructors used by lexer rule tables

use super::Language;

/// The exact string `s`; the empty string yields [`Language::epsilon`].
pub fn lit(s: &str) -> Language {
    let mut chars = s.chars().rev();
    match chars.next() {
        None => Language::epsilon(),
        Some(last) => chars.fold(Language::literal(last), |suffix, c| {
            Language::literal(c).then(&suffix)
        }),
    }
}

/// Any one character appearing in `chars`
pub fn one_of(chars: &str) -> Language {
    Language::char_set(chars.chars())
}

/// Any one character not appearing in `chars`
pub fn none_of(chars: &str) -> Language {
    Language::negated_char_set(chars.chars())
}

/// Any one character in `from..=to`
pub fn range(from: char, to: char) -> Language {
    Language::char_set(from..=to)
}

/// Any single character
pub fn any_char() -> Language {
    Language::any_char()
}

/// Matches only at the end of a terminated input
pub fn end_of_input() -> Language {
    Language::end_of_input()
}

/// Matches nothing
pub fn empty_language() -> Language {
    Language::empty()
}

/// Matches only the empty string
pub fn empty_string() -> Language {
    Language::epsilon()
}

impl From<&str> for Language {
    fn from(s: &str) -> Self {
        lit(s)
    }
}

impl From<char> for Language {
    fn from(c: char) -> Self {
        Language::literal(c)
    }
}

impl From<&Language> for Language {
    fn from(lang: &Language) -> Self {
        lang.clone()
    }
}
