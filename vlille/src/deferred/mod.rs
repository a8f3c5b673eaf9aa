//! Single-resolution deferred values.
//!
//! A [`Deferred`] starts out pending and settles exactly once, either
//! fulfilled with a value or rejected with a [`Rejection`]. Continuations
//! registered with [`Deferred::then`] (and friends) produce new deferred
//! values, so work can be composed into chains before any of it completes.
//!
//! Key properties:
//! - Settlement is monotonic and idempotent: the first `resolve`/`reject`
//!   wins and every later call is ignored.
//! - Resolving with a [`Thenable`] adopts its outcome, recursively.
//! - Waiters fire in registration order, always from the [`Scheduler`]:
//!   never inside the call that settles the value, nor inside the call that
//!   registers on an already-settled one. Settling a long chain therefore
//!   takes one job per link and no extra stack.
//! - Faults (errors and panics) in resolvers, handlers and thenables become
//!   rejections; nothing unwinds across a continuation boundary.

mod error;
mod release;
mod resolver;

use std::fmt;
use std::future::{Future, IntoFuture};
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::scheduler::Scheduler;

pub use error::{DeferredError, Rejection};
pub use resolver::{Resolution, Resolver, Thenable};

/// Observable state of a deferred value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredState {
    Pending,
    Fulfilled,
    Rejected,
}

#[derive(Clone)]
enum Outcome<T> {
    Fulfilled(T),
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    fn state(&self) -> DeferredState {
        match self {
            Outcome::Fulfilled(_) => DeferredState::Fulfilled,
            Outcome::Rejected(_) => DeferredState::Rejected,
        }
    }
}

type OnFulfilled<T> = Box<dyn FnOnce(T) + Send + 'static>;
type OnRejected = Box<dyn FnOnce(Rejection) + Send + 'static>;

/// A registered pair of continuations. Either side may be absent.
struct Waiter<T> {
    on_fulfilled: Option<OnFulfilled<T>>,
    on_rejected: Option<OnRejected>,
}

impl<T> Waiter<T> {
    fn new(
        on_fulfilled: impl FnOnce(T) + Send + 'static,
        on_rejected: impl FnOnce(Rejection) + Send + 'static,
    ) -> Self {
        Self {
            on_fulfilled: Some(Box::new(on_fulfilled)),
            on_rejected: Some(Box::new(on_rejected)),
        }
    }

    fn fire(self, outcome: Outcome<T>) {
        let result = panic::catch_unwind(AssertUnwindSafe(move || match outcome {
            Outcome::Fulfilled(value) => {
                if let Some(handler) = self.on_fulfilled {
                    handler(value);
                }
            }
            Outcome::Rejected(reason) => {
                if let Some(handler) = self.on_rejected {
                    handler(reason);
                }
            }
        }));

        if let Err(payload) = result {
            let reason = Rejection::from_panic(payload);
            debug!(%reason, "continuation panicked, ignoring");
        }
    }
}

enum State<T> {
    Pending(Vec<Waiter<T>>),
    Settled(Outcome<T>),
}

struct Inner<T> {
    state: Mutex<State<T>>,
    scheduler: Scheduler,
    /// Disposes of the waiters of a value dropped while pending
    release: fn(Vec<Waiter<T>>),
}

impl<T> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        // Waiters own the next links' resolvers. Dropping them here would
        // recurse once per link of an unsettled chain.
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let State::Pending(waiters) = state {
            if !waiters.is_empty() {
                (self.release)(mem::take(waiters));
            }
        }
    }
}

impl<T> Inner<T>
where
    T: Clone + Send + 'static,
{
    /// The resolution procedure. Callers guarantee it runs at most once per
    /// capability pair.
    fn resolve(self: &Arc<Self>, resolution: Resolution<T>) {
        let thenable = match resolution {
            Resolution::Value(value) => return self.settle(Outcome::Fulfilled(value)),
            Resolution::Thenable(thenable) => thenable,
        };

        if thenable.identity() == Some(Arc::as_ptr(self).cast::<()>()) {
            return self.settle(Outcome::Rejected(DeferredError::SelfResolution.into()));
        }

        let forward = Resolver::new(Arc::clone(self));
        let guard = forward.clone();
        match panic::catch_unwind(AssertUnwindSafe(move || thenable.then_with(forward))) {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => guard.reject(reason),
            Err(payload) => guard.reject(Rejection::from_panic(payload)),
        }
    }

    /// Transition out of `Pending` and schedule the waiters, in order.
    fn settle(&self, outcome: Outcome<T>) {
        let waiters = {
            let mut state = self.lock();
            match mem::replace(&mut *state, State::Settled(outcome.clone())) {
                State::Pending(waiters) => waiters,
                previous @ State::Settled(_) => {
                    *state = previous;
                    return;
                }
            }
        };

        trace!(
            state = ?outcome.state(),
            waiters = waiters.len(),
            "deferred value settled"
        );

        for waiter in waiters {
            let outcome = outcome.clone();
            self.scheduler.schedule(Box::new(move || waiter.fire(outcome)));
        }
    }
}

/// A single-resolution asynchronous value.
///
/// Handles are cheap to clone; clones observe the same settlement.
pub struct Deferred<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.inner.lock() {
            State::Pending(_) => DeferredState::Pending,
            State::Settled(outcome) => outcome.state(),
        };
        f.debug_struct("Deferred").field("state", &state).finish()
    }
}

impl<T> Deferred<T>
where
    T: Clone + Send + 'static,
{
    /// Create a deferred value and run `resolver` immediately.
    ///
    /// `resolver` receives the [`Resolver`] for the new value and may keep
    /// it, hand it elsewhere, or use it right away. An `Err` return or a
    /// panic rejects the value, unless it has already been settled.
    pub fn new<F>(scheduler: &Scheduler, resolver: F) -> Self
    where
        F: FnOnce(Resolver<T>) -> Result<(), Rejection>,
    {
        let deferred = Self::pending(scheduler);
        let handle = Resolver::new(Arc::clone(&deferred.inner));
        let guard = handle.clone();

        match panic::catch_unwind(AssertUnwindSafe(move || resolver(handle))) {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => guard.reject(reason),
            Err(payload) => guard.reject(Rejection::from_panic(payload)),
        }

        deferred
    }

    /// A deferred value already fulfilled with `value`.
    pub fn fulfilled(scheduler: &Scheduler, value: T) -> Self {
        let deferred = Self::pending(scheduler);
        deferred.inner.settle(Outcome::Fulfilled(value));
        deferred
    }

    /// A deferred value already rejected with `reason`.
    pub fn rejected(scheduler: &Scheduler, reason: impl Into<Rejection>) -> Self {
        let deferred = Self::pending(scheduler);
        deferred.inner.settle(Outcome::Rejected(reason.into()));
        deferred
    }

    fn pending(scheduler: &Scheduler) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Pending(Vec::new())),
                scheduler: scheduler.clone(),
                release: |waiters| release::release(Box::new(waiters)),
            }),
        }
    }

    /// Current state of the value.
    pub fn state(&self) -> DeferredState {
        match &*self.inner.lock() {
            State::Pending(_) => DeferredState::Pending,
            State::Settled(outcome) => outcome.state(),
        }
    }

    /// Register a pair of optional handlers against the settlement.
    ///
    /// If the value is still pending, the pair is queued behind earlier
    /// registrations and handed to the scheduler once the value settles.
    /// If it has already settled, the matching handler is handed to the
    /// scheduler right away. Either way it runs after this call returns.
    pub fn done<F, R>(&self, on_fulfilled: Option<F>, on_rejected: Option<R>)
    where
        F: FnOnce(T) + Send + 'static,
        R: FnOnce(Rejection) + Send + 'static,
    {
        self.register(Waiter {
            on_fulfilled: on_fulfilled.map(|f| Box::new(f) as OnFulfilled<T>),
            on_rejected: on_rejected.map(|r| Box::new(r) as OnRejected),
        });
    }

    fn register(&self, waiter: Waiter<T>) {
        let outcome = {
            let mut state = self.inner.lock();
            match &mut *state {
                State::Pending(waiters) => {
                    waiters.push(waiter);
                    return;
                }
                State::Settled(outcome) => outcome.clone(),
            }
        };

        self.inner
            .scheduler
            .schedule(Box::new(move || waiter.fire(outcome)));
    }

    /// Chain a pair of handlers, producing a new deferred value.
    ///
    /// The handler matching the outcome runs with the settled value or
    /// reason; whatever it returns resolves the derived value, including
    /// adopting a returned thenable. An `Err` return or a panic rejects the
    /// derived value. This method itself never fails.
    pub fn then<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Deferred<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<Resolution<U>, Rejection> + Send + 'static,
        R: FnOnce(Rejection) -> Result<Resolution<U>, Rejection> + Send + 'static,
    {
        let child = Deferred::pending(&self.inner.scheduler);
        let resolver = Resolver::new(Arc::clone(&child.inner));
        let on_rejection = resolver.clone();

        self.register(Waiter::new(
            move |value| settle_with(&resolver, move || on_fulfilled(value)),
            move |reason| settle_with(&on_rejection, move || on_rejected(reason)),
        ));

        child
    }

    /// Chain a fulfillment handler; rejections pass through unchanged.
    pub fn and_then<U, F>(&self, on_fulfilled: F) -> Deferred<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<Resolution<U>, Rejection> + Send + 'static,
    {
        self.then(on_fulfilled, Err)
    }

    /// Chain a rejection handler; fulfillments pass through unchanged.
    pub fn or_else<R>(&self, on_rejected: R) -> Deferred<T>
    where
        R: FnOnce(Rejection) -> Result<Resolution<T>, Rejection> + Send + 'static,
    {
        self.then(|value| Ok(Resolution::Value(value)), on_rejected)
    }

    /// Derive a value that settles exactly like this one.
    pub fn passthrough(&self) -> Deferred<T> {
        self.then(|value| Ok(Resolution::Value(value)), Err)
    }

    /// Transform the fulfilled value.
    pub fn map<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.and_then(move |value| Ok(Resolution::Value(f(value))))
    }

    /// Transform the rejection reason.
    pub fn map_err<E, F>(&self, f: F) -> Deferred<T>
    where
        E: Into<Rejection>,
        F: FnOnce(Rejection) -> E + Send + 'static,
    {
        self.or_else(move |reason| Err(f(reason).into()))
    }
}

/// Run a chained handler and feed its result into `resolver`.
fn settle_with<U>(
    resolver: &Resolver<U>,
    handler: impl FnOnce() -> Result<Resolution<U>, Rejection>,
) where
    U: Clone + Send + 'static,
{
    match panic::catch_unwind(AssertUnwindSafe(handler)) {
        Ok(Ok(resolution)) => resolver.resolve(resolution),
        Ok(Err(reason)) => resolver.reject(reason),
        Err(payload) => resolver.reject(Rejection::from_panic(payload)),
    }
}

impl<T> Thenable<T> for Deferred<T>
where
    T: Clone + Send + 'static,
{
    fn then_with(self: Box<Self>, resolver: Resolver<T>) -> Result<(), Rejection> {
        let on_rejection = resolver.clone();
        self.register(Waiter::new(
            move |value| resolver.fulfill(value),
            move |reason| on_rejection.reject(reason),
        ));
        Ok(())
    }

    fn identity(&self) -> Option<*const ()> {
        Some(Arc::as_ptr(&self.inner).cast::<()>())
    }
}

impl<T> From<Deferred<T>> for Resolution<T>
where
    T: Clone + Send + 'static,
{
    fn from(deferred: Deferred<T>) -> Self {
        Resolution::thenable(deferred)
    }
}

/// Future returned by awaiting a [`Deferred`].
///
/// The outcome is delivered by a scheduler job, so the future only
/// completes while the deferred value's [`JobQueue`](crate::JobQueue) is
/// being driven. With a scheduler from [`Scheduler::spawn_on`] that
/// happens on its own. With one from [`Scheduler::channel`], awaiting
/// never completes unless something keeps calling
/// [`JobQueue::run_pending`](crate::JobQueue::run_pending) or runs
/// [`JobQueue::run`](crate::JobQueue::run).
#[derive(Debug)]
pub struct Settlement<T> {
    rx: oneshot::Receiver<Result<T, Rejection>>,
}

impl<T> Future for Settlement<T> {
    type Output = Result<T, Rejection>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(DeferredError::Abandoned.into())))
    }
}

impl<T> IntoFuture for Deferred<T>
where
    T: Clone + Send + 'static,
{
    type Output = Result<T, Rejection>;
    type IntoFuture = Settlement<T>;

    fn into_future(self) -> Self::IntoFuture {
        let (tx, rx) = oneshot::channel();
        let slot = Arc::new(Mutex::new(Some(tx)));
        let other = Arc::clone(&slot);

        self.register(Waiter::new(
            move |value| deliver(&slot, Ok(value)),
            move |reason| deliver(&other, Err(reason)),
        ));

        Settlement { rx }
    }
}

type Slot<T> = Mutex<Option<oneshot::Sender<Result<T, Rejection>>>>;

fn deliver<T>(slot: &Slot<T>, result: Result<T, Rejection>) {
    let sender = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(tx) = sender {
        let _ = tx.send(result);
    }
}
