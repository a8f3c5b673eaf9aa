//! Resolution capabilities and foreign thenables.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::error::Rejection;
use super::{Inner, Outcome};

/// Something a deferred value can be resolved with.
///
/// Either a plain value, or a chainable value whose own outcome becomes the
/// outcome of the deferred value being resolved.
pub enum Resolution<T> {
    /// Fulfill with this value
    Value(T),

    /// Adopt the outcome of this chainable value
    Thenable(Box<dyn Thenable<T>>),
}

impl<T> Resolution<T> {
    /// Adopt the outcome of `thenable`.
    pub fn thenable(thenable: impl Thenable<T> + 'static) -> Self {
        Resolution::Thenable(Box::new(thenable))
    }
}

impl<T> fmt::Debug for Resolution<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Resolution::Thenable(_) => f.write_str("Thenable(..)"),
        }
    }
}

/// A value exposing a compatible chaining operation.
///
/// `then_with` is handed a fresh [`Resolver`] and is expected to call it
/// (now or later) with the eventual outcome. Implementations are not
/// trusted: calling the resolver more than once, returning an error after
/// calling it, or panicking are all tolerated, and only the first
/// settlement counts.
///
/// Any `FnOnce(Resolver<T>) -> Result<(), Rejection>` closure is a
/// thenable.
pub trait Thenable<T>: Send {
    /// Chain onto this value, reporting its outcome through `resolver`.
    fn then_with(self: Box<Self>, resolver: Resolver<T>) -> Result<(), Rejection>;

    /// Address of the deferred state behind this thenable, if any.
    ///
    /// Used to detect a deferred value being resolved with itself.
    fn identity(&self) -> Option<*const ()> {
        None
    }
}

impl<T, F> Thenable<T> for F
where
    F: FnOnce(Resolver<T>) -> Result<(), Rejection> + Send,
{
    fn then_with(self: Box<Self>, resolver: Resolver<T>) -> Result<(), Rejection> {
        (*self)(resolver)
    }
}

/// The `resolve` and `reject` capabilities of one deferred value.
///
/// Clones share a single "first call wins" flag: once any clone has
/// resolved or rejected, every further call on any clone is a no-op.
pub struct Resolver<T> {
    target: Arc<Inner<T>>,
    done: Arc<AtomicBool>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
            done: Arc::clone(&self.done),
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("done", &self.is_done())
            .finish_non_exhaustive()
    }
}

impl<T> Resolver<T> {
    pub(super) fn new(target: Arc<Inner<T>>) -> Self {
        Self {
            target,
            done: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true once this capability pair has been used.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    fn claim(&self) -> bool {
        !self.done.swap(true, Ordering::AcqRel)
    }
}

impl<T> Resolver<T>
where
    T: Clone + Send + 'static,
{
    /// Resolve with a value or adopt the outcome of a thenable.
    pub fn resolve(&self, resolution: Resolution<T>) {
        if self.claim() {
            self.target.resolve(resolution);
        }
    }

    /// Resolve with a plain value.
    pub fn fulfill(&self, value: T) {
        self.resolve(Resolution::Value(value));
    }

    /// Reject with `reason`. Rejection reasons are never unwrapped.
    pub fn reject(&self, reason: impl Into<Rejection>) {
        if self.claim() {
            self.target.settle(Outcome::Rejected(reason.into()));
        }
    }
}
