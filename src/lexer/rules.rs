//! Declared lexer states and their rule tables
//!
//! A grammar is a [`LexerRules`] table: a list of named states, each holding
//! `(pattern, action)` rules in declaration order. The first state declared
//! is where lexing starts.
//!
//! ```rust
//! use klisp_lexer::language::{one_of, range};
//! use klisp_lexer::lexer::{Lexer, LexerRules};
//!
//! let mut rules: LexerRules<String> = LexerRules::new();
//! let main = rules.declare("main");
//! rules.on(main, range('a', 'z').one_or_more()).over(|out, cs| out.emit(cs.iter().collect()));
//! rules.on(main, one_of(" \n").one_or_more()).run(|_| {});
//! rules.on(main, klisp_lexer::language::end_of_input()).run(|out| out.terminate());
//!
//! let words = Lexer::new(rules).unwrap().lex_str("hello world").unwrap();
//! assert_eq!(words, vec!["hello".to_string(), "world".to_string()]);
//! ```

use super::token::Span;
use crate::error::{Error, Result};
use crate::language::Language;
use crate::stream::Source;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Handle to a declared state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(usize);

impl StateId {
    /// Position of the state in declaration order
    pub fn index(self) -> usize {
        self.0
    }
}

/// Payloads of the stateful states, owned by one lexing session
pub(crate) type Payloads = HashMap<StateId, Box<dyn Any>>;

/// What an action sees: where the match is, where tokens go, and the
/// session's stateful payloads.
pub struct Emitter<'a, T> {
    output: &'a Source<T>,
    payloads: &'a mut Payloads,
    span: Span,
    emitted: usize,
}

impl<'a, T> Emitter<'a, T> {
    pub(crate) fn new(output: &'a Source<T>, payloads: &'a mut Payloads, span: Span) -> Self {
        Emitter {
            output,
            payloads,
            span,
            emitted: 0,
        }
    }

    /// Input range of the characters being accepted
    pub fn span(&self) -> Span {
        self.span
    }

    /// Number of items emitted by this action so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Closes the output stream; only meaningful at end of input
    pub fn terminate(&mut self) {
        self.output.terminate();
    }
}

impl<'a, T: Clone> Emitter<'a, T> {
    /// Appends an item to the output stream
    pub fn emit(&mut self, item: T) {
        self.emitted += 1;
        self.output.push_one(item);
    }
}

/// Action fired when a rule wins; returns the state to continue in.
pub type Action<T> = Rc<dyn Fn(&mut Emitter<'_, T>, &[char]) -> StateId>;

fn action_fn<T, F>(f: F) -> Action<T>
where
    F: Fn(&mut Emitter<'_, T>, &[char]) -> StateId + 'static,
{
    Rc::new(f)
}

pub(crate) struct Rule<T> {
    pub(crate) language: Language,
    pub(crate) action: Action<T>,
}

struct MajorState<T> {
    name: String,
    rules: Vec<Rule<T>>,
}

/// A declared state carrying a payload threaded through its actions.
///
/// Update actions get the payload mutably; to stay in the state they
/// return [`StatefulState::id`]. Other states enter it with
/// [`StatefulState::enter`], which replaces the payload.
///
/// Payloads belong to the session, not to the table: every session of a
/// [`Lexer`](super::Lexer) starts from the declared initial value.
pub struct StatefulState<S> {
    id: StateId,
    initial: Rc<S>,
}

impl<S> Clone for StatefulState<S> {
    fn clone(&self) -> Self {
        StatefulState {
            id: self.id,
            initial: Rc::clone(&self.initial),
        }
    }
}

impl<S> StatefulState<S> {
    /// The underlying state handle
    pub fn id(&self) -> StateId {
        self.id
    }
}

impl<S: Clone + 'static> StatefulState<S> {
    /// Replaces this session's payload and returns the state to switch to
    pub fn enter<T>(&self, out: &mut Emitter<'_, T>, payload: S) -> StateId {
        out.payloads.insert(self.id, Box::new(payload));
        self.id
    }

    /// This session's payload, or the initial one if never entered
    pub fn payload<'s, T>(&'s self, out: &'s Emitter<'_, T>) -> &'s S {
        out.payloads
            .get(&self.id)
            .and_then(|boxed| boxed.downcast_ref::<S>())
            .unwrap_or(&*self.initial)
    }

    fn take<T>(&self, out: &mut Emitter<'_, T>) -> S {
        out.payloads
            .remove(&self.id)
            .and_then(|boxed| boxed.downcast::<S>().ok())
            .map_or_else(|| S::clone(&self.initial), |boxed| *boxed)
    }
}

/// Rule table for a lexer
pub struct LexerRules<T> {
    states: Vec<MajorState<T>>,
}

impl<T> Default for LexerRules<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> LexerRules<T> {
    /// Adds a rule that stays in `state` once its action has run
    pub fn on(&mut self, state: StateId, pattern: impl Into<Language>) -> Matcher<'_, T> {
        Matcher {
            rules: self,
            state,
            pattern: pattern.into(),
        }
    }

    /// Adds a rule whose action picks the next state
    pub fn switches_on(&mut self, state: StateId, pattern: impl Into<Language>) -> Switcher<'_, T> {
        Switcher {
            rules: self,
            state,
            pattern: pattern.into(),
        }
    }

    /// Adds a rule to a stateful state; the action can mutate the payload
    pub fn update<S, F>(&mut self, state: &StatefulState<S>, pattern: impl Into<Language>, action: F)
    where
        S: Clone + 'static,
        F: Fn(&mut Emitter<'_, T>, &mut S, &[char]) -> StateId + 'static,
    {
        let state = state.clone();
        let id = state.id;
        self.push(
            id,
            pattern.into(),
            action_fn(move |out, chars| {
                let mut payload = state.take(out);
                let next = action(out, &mut payload, chars);
                // An `enter` made by the action itself wins.
                out.payloads.entry(id).or_insert_with(|| Box::new(payload) as Box<dyn Any>);
                next
            }),
        );
    }

    /// Deletes every rule of `state`
    pub fn reset(&mut self, state: StateId) {
        if let Some(major) = self.states.get_mut(state.0) {
            major.rules.clear();
        }
    }

    fn push(&mut self, state: StateId, language: Language, action: Action<T>) {
        if let Some(major) = self.states.get_mut(state.0) {
            major.rules.push(Rule { language, action });
        }
    }
}

impl<T> LexerRules<T> {
    /// Creates an empty table
    pub fn new() -> Self {
        LexerRules { states: Vec::new() }
    }

    /// Declares a new state with no rules
    pub fn declare(&mut self, name: impl Into<String>) -> StateId {
        self.states.push(MajorState {
            name: name.into(),
            rules: Vec::new(),
        });
        StateId(self.states.len() - 1)
    }

    /// Declares a state carrying `initial` as its payload
    pub fn declare_stateful<S>(&mut self, name: impl Into<String>, initial: S) -> StatefulState<S> {
        StatefulState {
            id: self.declare(name),
            initial: Rc::new(initial),
        }
    }

    /// Checks that every rule consumes at least one character
    pub fn validate(&self) -> Result<()> {
        for state in &self.states {
            if let Some(rule) = state.rules.iter().find(|r| r.language.accepts_empty_string()) {
                return Err(Error::InvalidRule {
                    state: state.name.clone(),
                    pattern: rule.language.to_string(),
                });
            }
        }
        Ok(())
    }

    /// The state lexing starts in
    pub fn initial(&self) -> StateId {
        StateId(0)
    }

    /// Name given when the state was declared
    pub fn name(&self, state: StateId) -> &str {
        self.states.get(state.0).map_or("<undeclared>", |s| s.name.as_str())
    }

    /// Number of declared states
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True if no state has been declared
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub(crate) fn rules(&self, state: StateId) -> &[Rule<T>] {
        self.states
            .get(state.0)
            .map(|s| s.rules.as_slice())
            .unwrap_or(&[])
    }
}

impl<T> fmt::Debug for LexerRules<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.states
                    .iter()
                    .map(|s| (s.name.as_str(), s.rules.len())),
            )
            .finish()
    }
}

/// Half-built rule that keeps the current state
pub struct Matcher<'a, T> {
    rules: &'a mut LexerRules<T>,
    state: StateId,
    pattern: Language,
}

impl<'a, T: 'static> Matcher<'a, T> {
    /// Completes the rule with an action that ignores the matched text
    pub fn run(self, action: impl Fn(&mut Emitter<'_, T>) + 'static) {
        let state = self.state;
        self.rules.push(
            state,
            self.pattern,
            action_fn(move |out, _| {
                action(out);
                state
            }),
        );
    }

    /// Completes the rule with an action that receives the matched text
    pub fn over(self, action: impl Fn(&mut Emitter<'_, T>, &[char]) + 'static) {
        let state = self.state;
        self.rules.push(
            state,
            self.pattern,
            action_fn(move |out, chars| {
                action(out, chars);
                state
            }),
        );
    }
}

/// Half-built rule whose action chooses the next state
pub struct Switcher<'a, T> {
    rules: &'a mut LexerRules<T>,
    state: StateId,
    pattern: Language,
}

impl<'a, T: 'static> Switcher<'a, T> {
    /// Switches to the returned state, ignoring the matched text
    pub fn to(self, action: impl Fn(&mut Emitter<'_, T>) -> StateId + 'static) {
        self.rules
            .push(self.state, self.pattern, action_fn(move |out, _| action(out)));
    }

    /// Switches to the returned state, given the matched text
    pub fn over(self, action: impl Fn(&mut Emitter<'_, T>, &[char]) -> StateId + 'static) {
        self.rules.push(self.state, self.pattern, action_fn(action));
    }
}
