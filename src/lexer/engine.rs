//! Non-blocking lexing engine
//!
//! The engine consumes a [`Stream<char>`] one character at a time. Its
//! current state is a list of live rules, each holding the derivative of
//! its pattern by the characters seen since the state was entered. Per
//! step it:
//!
//! 1. fires immediately when exactly one rule has fully matched and every
//!    other rule is dead,
//! 2. bookmarks the state and input position whenever some rule accepts,
//!    so the longest match seen so far is remembered,
//! 3. backtracks to the bookmark once every rule is dead,
//! 4. at terminated input, differentiates by end-of-input and fires or
//!    backtracks,
//! 5. otherwise consumes one more character.
//!
//! When the input is plugged but not terminated the engine returns. It is
//! registered as a listener on the input source, so the next push or
//! terminate resumes it exactly where it stopped.

use super::config::LexerConfig;
use super::rules::{Emitter, LexerRules, Payloads, StateId};
use super::token::{Position, Span};
use crate::error::{Error, Result};
use crate::language::Language;
use crate::stream::{Source, Stream};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Coarse state of a lexing session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Consuming fresh input
    Stepping,
    /// Replaying input consumed past the last accepted token
    Backtracking,
    /// End of input reached and the output closed
    Terminated,
    /// Stopped by a lexing error
    Failed,
    /// Stopped by [`LexSession::cancel`]
    Cancelled,
}

#[derive(Clone)]
struct LiveRule {
    index: usize,
    language: Language,
}

/// Transient state: the surviving rules plus where their match began.
///
/// The matched characters are not copied; they are the `len` items of
/// the input stream starting at `start_input`.
#[derive(Clone)]
struct LexerState {
    origin: StateId,
    rules: Vec<LiveRule>,
    start: Position,
    start_input: Stream<char>,
}

impl LexerState {
    fn enter<T>(table: &LexerRules<T>, state: StateId, start: Position, input: Stream<char>) -> Self {
        LexerState {
            origin: state,
            rules: table
                .rules(state)
                .iter()
                .enumerate()
                .map(|(index, rule)| LiveRule {
                    index,
                    language: rule.language.clone(),
                })
                .collect(),
            start,
            start_input: input,
        }
    }

    fn is_accept(&self) -> bool {
        self.rules.iter().any(|r| r.language.accepts_empty_string())
    }

    /// One rule matched exactly and nothing else can ever match.
    fn must_accept(&self) -> bool {
        let mut saw_complete = false;
        for rule in &self.rules {
            if rule.language.is_empty_string_only() && !saw_complete {
                saw_complete = true;
            } else if !rule.language.rejects_all() {
                return false;
            }
        }
        saw_complete
    }

    fn is_reject(&self) -> bool {
        self.rules.iter().all(|r| r.language.rejects_all())
    }

    /// Earliest declared rule that accepts
    fn accepting_rule(&self) -> Option<usize> {
        self.rules
            .iter()
            .find(|r| r.language.accepts_empty_string())
            .map(|r| r.index)
    }

    fn next(&self, c: char) -> Self {
        self.derive_with(|lang| lang.derive(c))
    }

    fn terminate(&self) -> Self {
        self.derive_with(Language::derive_end)
    }

    fn derive_with(&self, derive: impl Fn(&Language) -> Language) -> Self {
        LexerState {
            origin: self.origin,
            rules: self
                .rules
                .iter()
                .map(|r| LiveRule {
                    index: r.index,
                    language: derive(&r.language),
                })
                .filter(|r| !r.language.rejects_all())
                .collect(),
            start: self.start,
            start_input: self.start_input.clone(),
        }
    }

    fn chars(&self, end: Position) -> Vec<char> {
        self.start_input
            .iter()
            .take(end.offset - self.start.offset)
            .collect()
    }
}

struct Bookmark {
    state: LexerState,
    input: Stream<char>,
    position: Position,
}

struct Shared {
    status: Cell<SessionStatus>,
    error: RefCell<Option<Error>>,
    cancelled: Cell<bool>,
}

struct Engine<T> {
    rules: Rc<LexerRules<T>>,
    config: LexerConfig,
    current: LexerState,
    input: Stream<char>,
    position: Position,
    bookmark: Option<Bookmark>,
    frontier: usize,
    payloads: RefCell<Payloads>,
    output: Source<T>,
    shared: Rc<Shared>,
}

impl<T: Clone> Engine<T> {
    /// Runs steps until the input is plugged or the session ends.
    fn work(&mut self) -> Result<()> {
        while self.is_live() {
            if self.shared.cancelled.get() {
                tracing::debug!(offset = self.position.offset, "lexing session cancelled");
                *self.shared.error.borrow_mut() = Some(Error::Cancelled);
                self.finish(SessionStatus::Cancelled);
                break;
            }
            match self.step() {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    tracing::warn!(error = %err, "lexing failed");
                    *self.shared.error.borrow_mut() = Some(err.clone());
                    self.finish(SessionStatus::Failed);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn is_live(&self) -> bool {
        matches!(
            self.shared.status.get(),
            SessionStatus::Stepping | SessionStatus::Backtracking
        )
    }

    fn finish(&mut self, status: SessionStatus) {
        self.shared.status.set(status);
        self.bookmark = None;
        if !self.output.is_terminated() {
            self.output.terminate();
        }
    }

    /// One engine step; `false` means no progress is possible right now.
    fn step(&mut self) -> Result<bool> {
        if self.current.must_accept() {
            self.accept_current()?;
            return Ok(true);
        }

        if self.current.is_accept() {
            self.bookmark = Some(Bookmark {
                state: self.current.clone(),
                input: self.input.clone(),
                position: self.position,
            });
        } else if self.current.is_reject() {
            self.backtrack()?;
            return Ok(true);
        }

        if self.input.is_empty() {
            let terminal = self.current.terminate();
            if terminal.is_accept() {
                self.fire(&terminal, self.position)?;
                tracing::debug!(offset = self.position.offset, "end of input; lexing finished");
                self.finish(SessionStatus::Terminated);
                return Ok(false);
            }
            self.backtrack()?;
            return Ok(true);
        }

        if !self.input.is_plugged() {
            let c = *self.input.head();
            self.current = self.current.next(c);
            self.input = self.input.tail();
            self.position = self.position.advance(c);
            self.track_frontier();
            self.check_match_len()?;
            tracing::trace!(
                ch = ?c,
                offset = self.position.offset,
                live_rules = self.current.rules.len(),
                "consumed"
            );
        }

        if !self.input.is_plugged() || self.input.is_empty() || self.current.is_reject() {
            return Ok(true);
        }

        if self.current.must_accept() {
            self.accept_current()?;
            return Ok(true);
        }

        Ok(false)
    }

    fn accept_current(&mut self) -> Result<()> {
        let next = self.fire(&self.current, self.position)?;
        self.current = LexerState::enter(&*self.rules, next, self.position, self.input.clone());
        self.bookmark = None;
        Ok(())
    }

    /// Fires the last accepting state and rewinds the input to just after it.
    fn backtrack(&mut self) -> Result<()> {
        let mark = match self.bookmark.take() {
            Some(mark) => mark,
            None => return Err(self.dead_end()),
        };

        let next = self.fire(&mark.state, mark.position)?;
        if mark.position.offset < self.frontier {
            tracing::debug!(
                from = self.position.offset,
                to = mark.position.offset,
                "backtracking"
            );
            self.shared.status.set(SessionStatus::Backtracking);
        }
        self.current = LexerState::enter(&*self.rules, next, mark.position, mark.input.clone());
        self.input = mark.input;
        self.position = mark.position;
        Ok(())
    }

    fn fire(&self, state: &LexerState, end: Position) -> Result<StateId> {
        let index = match state.accepting_rule() {
            Some(index) => index,
            None => return Err(self.dead_end()),
        };
        let action = match self.rules.rules(state.origin).get(index) {
            Some(rule) => Rc::clone(&rule.action),
            None => return Err(self.dead_end()),
        };

        let chars = state.chars(end);
        let mut payloads = self.payloads.borrow_mut();
        let mut emitter = Emitter::new(&self.output, &mut payloads, Span::new(state.start, end));
        let next = action(&mut emitter, &chars);

        tracing::debug!(
            state = self.rules.name(state.origin),
            rule = index,
            len = chars.len(),
            emitted = emitter.emitted(),
            next = self.rules.name(next),
            "rule fired"
        );
        Ok(next)
    }

    fn track_frontier(&mut self) {
        if self.position.offset > self.frontier {
            self.frontier = self.position.offset;
        }
        if self.shared.status.get() == SessionStatus::Backtracking
            && self.position.offset >= self.frontier
        {
            self.shared.status.set(SessionStatus::Stepping);
        }
    }

    fn check_match_len(&self) -> Result<()> {
        match self.config.max_match_len {
            Some(limit) if self.position.offset - self.current.start.offset > limit => {
                Err(Error::MatchTooLong {
                    limit,
                    line: self.current.start.line,
                    column: self.current.start.column,
                })
            }
            _ => Ok(()),
        }
    }

    fn dead_end(&self) -> Error {
        let start = self.current.start;
        Error::DeadEnd {
            offset: start.offset,
            line: start.line,
            column: start.column,
            remaining: self
                .current
                .start_input
                .iter()
                .take(self.config.error_preview_len)
                .collect(),
        }
    }
}

/// A lexer built from a rule table
pub struct Lexer<T> {
    rules: Rc<LexerRules<T>>,
    config: LexerConfig,
}

impl<T: Clone + 'static> Lexer<T> {
    /// Creates a lexer with the default configuration
    pub fn new(rules: LexerRules<T>) -> Result<Self> {
        Self::with_config(rules, LexerConfig::default())
    }

    /// Creates a lexer, rejecting rules that could match without consuming input
    pub fn with_config(rules: LexerRules<T>, config: LexerConfig) -> Result<Self> {
        rules.validate()?;
        Ok(Lexer {
            rules: Rc::new(rules),
            config,
        })
    }

    /// The rule table
    pub fn rules(&self) -> &LexerRules<T> {
        &self.rules
    }

    /// Starts lexing `input`.
    ///
    /// Everything currently available is processed before this returns; an
    /// error during that first pass is returned directly. Afterwards the
    /// session resumes on every push to (or termination of) the input
    /// source, and later errors are recorded on the session. Dropping the
    /// session detaches it from the input.
    pub fn lex(&self, input: Stream<char>) -> Result<LexSession<T>> {
        let shared = Rc::new(Shared {
            status: Cell::new(SessionStatus::Stepping),
            error: RefCell::new(None),
            cancelled: Cell::new(false),
        });
        let output = Source::new();
        let output_stream = output.stream();
        let start = Position {
            offset: input.offset(),
            ..Position::START
        };

        let engine = Rc::new(RefCell::new(Engine {
            rules: Rc::clone(&self.rules),
            config: self.config.clone(),
            current: LexerState::enter(&*self.rules, self.rules.initial(), start, input.clone()),
            input: input.clone(),
            position: start,
            bookmark: None,
            frontier: start.offset,
            payloads: RefCell::new(Payloads::new()),
            output,
            shared: Rc::clone(&shared),
        }));

        engine.borrow_mut().work()?;

        let weak = Rc::downgrade(&engine);
        input.source().add_listener(move |_: &[char]| {
            if let Some(engine) = weak.upgrade() {
                match engine.try_borrow_mut() {
                    // Errors are recorded on the session.
                    Ok(mut engine) => {
                        let _ = engine.work();
                    }
                    // Pushed from inside an action: the running loop sees it.
                    Err(_) => tracing::trace!("lexer busy; input picked up by the active drain"),
                };
            }
        });

        Ok(LexSession {
            engine,
            shared,
            output: output_stream,
        })
    }

    /// Lexes a complete string and collects the output
    pub fn lex_str(&self, source: &str) -> Result<Vec<T>> {
        let session = self.lex(Stream::of_str(source))?;
        session.check()?;
        Ok(session.output().available())
    }
}

impl<T> fmt::Debug for Lexer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lexer")
            .field("rules", &self.rules)
            .field("config", &self.config)
            .finish()
    }
}

/// A running lexing session
pub struct LexSession<T> {
    engine: Rc<RefCell<Engine<T>>>,
    shared: Rc<Shared>,
    output: Stream<T>,
}

impl<T: Clone> LexSession<T> {
    /// The token stream; it grows as input arrives
    pub fn output(&self) -> Stream<T> {
        self.output.clone()
    }

    /// Everything emitted so far
    pub fn tokens(&self) -> Vec<T> {
        self.output.available()
    }

    /// Current coarse state
    pub fn status(&self) -> SessionStatus {
        self.shared.status.get()
    }

    /// The error that stopped the session, if any
    pub fn error(&self) -> Option<Error> {
        self.shared.error.borrow().clone()
    }

    /// `Err` if the session stopped on an error or was cancelled
    pub fn check(&self) -> Result<()> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Abandons the session and closes its output. Idempotent.
    pub fn cancel(&self) {
        self.cancel_handle().cancel();
    }

    /// A handle that can cancel the session from elsewhere, including
    /// from inside a listener on the output
    pub fn cancel_handle(&self) -> CancelHandle<T> {
        CancelHandle {
            shared: Rc::clone(&self.shared),
            engine: Rc::downgrade(&self.engine),
        }
    }
}

impl<T> fmt::Debug for LexSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LexSession")
            .field("status", &self.shared.status.get())
            .field("output", &self.output)
            .finish()
    }
}

/// Cancels a [`LexSession`]
pub struct CancelHandle<T> {
    shared: Rc<Shared>,
    engine: Weak<RefCell<Engine<T>>>,
}

impl<T> Clone for CancelHandle<T> {
    fn clone(&self) -> Self {
        CancelHandle {
            shared: Rc::clone(&self.shared),
            engine: Weak::clone(&self.engine),
        }
    }
}

impl<T: Clone> CancelHandle<T> {
    /// Requests cancellation. If the engine is idle it stops now; if it is
    /// draining, it stops before its next step.
    pub fn cancel(&self) {
        self.shared.cancelled.set(true);
        if let Some(engine) = self.engine.upgrade() {
            if let Ok(mut engine) = engine.try_borrow_mut() {
                let _ = engine.work();
            };
        }
    }

    /// True once cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.get()
    }
}
