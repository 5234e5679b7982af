//! Growable, push-driven streams
//!
//! A [`Source`] owns a FIFO of items that have been pushed but not yet
//! pulled, a terminated flag, and a list of listeners. A [`Stream`] is a
//! memoizing cursor over a source: its head is pulled on first access and
//! its tail is a new cursor over the same source, computed once.
//!
//! There is no blocking read. A stream with nothing cached and nothing
//! queued is *plugged*; the only thing to do then is return and wait for
//! the next [`Source::push`] or [`Source::terminate`], both of which notify
//! every listener synchronously.
//!
//! ```rust
//! use klisp_lexer::stream::Source;
//!
//! let source = Source::new();
//! let stream = source.stream();
//! assert!(stream.is_plugged());
//!
//! source.push("ab".chars());
//! assert_eq!(*stream.head(), 'a');
//! assert_eq!(*stream.tail().head(), 'b');
//! assert!(stream.tail().tail().is_plugged());
//!
//! source.terminate();
//! assert!(stream.tail().tail().is_empty());
//! ```
//!
//! Each source should have a single cursor chain: two independent
//! [`Source::stream`] roots would split the queued items between them.

use std::cell::{OnceCell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Callback invoked after every push (with the new items) and every
/// terminate (with an empty slice).
pub type Listener<A> = Rc<dyn Fn(&[A])>;

struct SourceState<A> {
    queue: VecDeque<A>,
    pulled: usize,
    terminated: bool,
    listeners: Vec<Listener<A>>,
}

/// Producer side of a growable stream
pub struct Source<A> {
    inner: Rc<RefCell<SourceState<A>>>,
}

impl<A> Clone for Source<A> {
    fn clone(&self) -> Self {
        Source {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A> Default for Source<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Source<A> {
    /// Creates an open, empty source
    pub fn new() -> Self {
        Source {
            inner: Rc::new(RefCell::new(SourceState {
                queue: VecDeque::new(),
                pulled: 0,
                terminated: false,
                listeners: Vec::new(),
            })),
        }
    }

    /// A cursor positioned at the next item this source will yield
    pub fn stream(&self) -> Stream<A> {
        let pulled = self.inner.borrow().pulled;
        Stream::at(self.clone(), pulled)
    }

    /// Registers a listener; listeners run in registration order.
    pub fn add_listener(&self, listener: impl Fn(&[A]) + 'static) {
        self.inner.borrow_mut().listeners.push(Rc::new(listener));
    }

    /// True once [`Source::terminate`] has been called
    pub fn is_terminated(&self) -> bool {
        self.inner.borrow().terminated
    }

    /// True if at least one item is queued
    pub fn has_next(&self) -> bool {
        !self.inner.borrow().queue.is_empty()
    }

    /// True if nothing is queued and nothing ever will be
    pub fn is_empty(&self) -> bool {
        let state = self.inner.borrow();
        state.queue.is_empty() && state.terminated
    }

    /// Number of queued, not yet pulled items
    pub fn len(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    pub(crate) fn next(&self) -> Option<A> {
        let mut state = self.inner.borrow_mut();
        let item = state.queue.pop_front();
        if item.is_some() {
            state.pulled += 1;
        }
        item
    }

    /// Closes the source and notifies listeners with an empty slice.
    ///
    /// Terminating twice only repeats the notification.
    pub fn terminate(&self) {
        self.inner.borrow_mut().terminated = true;
        self.notify(&[]);
    }

    fn notify(&self, items: &[A]) {
        // Listeners may push again, so no borrow is held while they run.
        let listeners = self.inner.borrow().listeners.clone();
        for listener in &listeners {
            listener(items);
        }
    }
}

impl<A: Clone> Source<A> {
    /// Appends items and notifies listeners with exactly those items.
    ///
    /// Items pushed after termination are dropped.
    pub fn push(&self, items: impl IntoIterator<Item = A>) {
        let items: Vec<A> = items.into_iter().collect();
        {
            let mut state = self.inner.borrow_mut();
            if state.terminated {
                tracing::warn!(dropped = items.len(), "push to a terminated source ignored");
                return;
            }
            state.queue.extend(items.iter().cloned());
        }
        self.notify(&items);
    }

    /// Appends a single item
    pub fn push_one(&self, item: A) {
        self.push(std::iter::once(item));
    }
}

impl<A> fmt::Debug for Source<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Source")
            .field("queued", &state.queue.len())
            .field("terminated", &state.terminated)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

struct StreamNode<A> {
    source: Source<A>,
    offset: usize,
    head: OnceCell<A>,
    tail: OnceCell<Stream<A>>,
}

impl<A> Drop for StreamNode<A> {
    fn drop(&mut self) {
        // Unlink memoized tails in a loop; dropping them recursively
        // overflows the stack on long streams.
        let mut next = self.tail.take();
        while let Some(stream) = next {
            next = match Rc::try_unwrap(stream.node) {
                Ok(mut node) => node.tail.take(),
                Err(_) => None,
            };
        }
    }
}

/// Consumer side of a growable stream
pub struct Stream<A> {
    node: Rc<StreamNode<A>>,
}

impl<A> Clone for Stream<A> {
    fn clone(&self) -> Self {
        Stream {
            node: Rc::clone(&self.node),
        }
    }
}

impl<A> Stream<A> {
    fn at(source: Source<A>, offset: usize) -> Self {
        Stream {
            node: Rc::new(StreamNode {
                source,
                offset,
                head: OnceCell::new(),
                tail: OnceCell::new(),
            }),
        }
    }

    /// The source feeding this stream
    pub fn source(&self) -> &Source<A> {
        &self.node.source
    }

    /// Number of items before this position
    pub fn offset(&self) -> usize {
        self.node.offset
    }

    /// No head is cached and the source has nothing queued
    pub fn is_plugged(&self) -> bool {
        self.node.head.get().is_none() && !self.node.source.has_next()
    }

    /// Plugged, and the source is terminated
    pub fn is_empty(&self) -> bool {
        self.is_plugged() && self.node.source.is_terminated()
    }

    /// The item at this position.
    ///
    /// # Panics
    ///
    /// Panics if the stream is plugged; check [`Stream::is_plugged`] first.
    pub fn head(&self) -> &A {
        if let Some(head) = self.node.head.get() {
            return head;
        }
        match self.node.source.next() {
            Some(item) => self.node.head.get_or_init(|| item),
            None => panic!("can't pull a plugged head at offset {}", self.node.offset),
        }
    }

    /// The head, or `None` when plugged
    pub fn try_head(&self) -> Option<&A> {
        if self.is_plugged() {
            None
        } else {
            Some(self.head())
        }
    }

    /// The stream after this position.
    ///
    /// # Panics
    ///
    /// Panics if the stream is plugged; check [`Stream::is_plugged`] first.
    pub fn tail(&self) -> Stream<A> {
        if self.is_plugged() {
            panic!("can't pull a plugged tail at offset {}", self.node.offset);
        }
        self.head();
        self.node
            .tail
            .get_or_init(|| Stream::at(self.node.source.clone(), self.node.offset + 1))
            .clone()
    }

    /// Iterates over the items reachable without plugging
    pub fn iter(&self) -> StreamIter<A> {
        StreamIter {
            current: self.clone(),
        }
    }
}

impl<A: Clone> Stream<A> {
    /// A terminated stream holding exactly `items`
    pub fn from_items(items: impl IntoIterator<Item = A>) -> Self {
        let source = Source::new();
        let stream = source.stream();
        source.push(items);
        source.terminate();
        stream
    }

    /// Clones of every item currently reachable from this position
    pub fn available(&self) -> Vec<A> {
        self.iter().collect()
    }
}

impl Stream<char> {
    /// A terminated character stream over `s`
    pub fn of_str(s: &str) -> Self {
        Stream::from_items(s.chars())
    }
}

impl<A> fmt::Debug for Stream<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("offset", &self.node.offset)
            .field("plugged", &self.is_plugged())
            .field("terminated", &self.node.source.is_terminated())
            .finish()
    }
}

/// Iterator returned by [`Stream::iter`]
pub struct StreamIter<A> {
    current: Stream<A>,
}

impl<A: Clone> Iterator for StreamIter<A> {
    type Item = A;

    fn next(&mut self) -> Option<A> {
        if self.current.is_plugged() {
            return None;
        }
        let item = self.current.head().clone();
        self.current = self.current.tail();
        Some(item)
    }
}
