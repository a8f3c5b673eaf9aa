//! Non-recursive teardown of pending chains.
//!
//! A pending value owns its waiters, a waiter owns the resolver of the next
//! value in the chain, and that value owns its own waiters. Dropping the
//! head of a long unsettled chain would otherwise recurse once per link.

use std::any::Any;
use std::cell::RefCell;

thread_local! {
    /// `Some` while a release is running on this thread.
    static QUEUE: RefCell<Option<Vec<Box<dyn Any>>>> = const { RefCell::new(None) };
}

/// Drop `garbage`, flattening any drops it triggers.
///
/// The outermost call on a thread drops its garbage and then everything
/// queued by nested calls, one item at a time, until the queue is empty.
pub(super) fn release(garbage: Box<dyn Any>) {
    let mut garbage = Some(garbage);

    let outermost = QUEUE.try_with(|queue| {
        let mut queue = queue.borrow_mut();
        match queue.as_mut() {
            Some(pending) => {
                pending.extend(garbage.take());
                false
            }
            None => {
                *queue = Some(Vec::new());
                true
            }
        }
    });

    // Nested calls have queued their garbage. During thread teardown the
    // queue is gone and the garbage is dropped in place.
    if !matches!(outermost, Ok(true)) {
        return;
    }

    let _reset = Reset;
    drop(garbage);
    while let Some(next) = QUEUE.with(|queue| queue.borrow_mut().as_mut().and_then(Vec::pop)) {
        drop(next);
    }
}

/// Closes the queue when the outermost release finishes, even by panic.
struct Reset;

impl Drop for Reset {
    fn drop(&mut self) {
        let rest = QUEUE.try_with(|queue| queue.borrow_mut().take());
        drop(rest);
    }
}
