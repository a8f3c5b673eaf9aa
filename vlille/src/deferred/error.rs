//! Rejection reasons.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Failures raised by the deferred machinery itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeferredError {
    /// A resolver, handler or foreign thenable panicked
    #[error("panicked: {0}")]
    Panicked(String),

    /// A deferred value was resolved with itself
    #[error("a deferred value cannot be resolved with itself")]
    SelfResolution,

    /// Every handle to a pending deferred value was dropped
    #[error("deferred value was dropped before it settled")]
    Abandoned,
}

/// The reason a deferred value was rejected.
///
/// Wraps any error type behind a shared pointer, so the same reason can be
/// handed to every waiter. Use [`Rejection::downcast_ref`] to recover the
/// concrete error.
#[derive(Clone)]
pub struct Rejection(Arc<dyn Error + Send + Sync + 'static>);

impl Rejection {
    /// Wrap an error as a rejection reason.
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// Build a rejection from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::new(DeferredError::Panicked(message))
    }

    /// Returns the wrapped error if it is of type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Error + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    /// Returns true if the wrapped error is of type `E`.
    pub fn is<E>(&self) -> bool
    where
        E: Error + 'static,
    {
        self.0.is::<E>()
    }

    /// Borrow the wrapped error.
    pub fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.0
    }
}

impl<E> From<E> for Rejection
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl From<Rejection> for Box<dyn Error + Send + Sync + 'static> {
    fn from(rejection: Rejection) -> Self {
        Box::new(Shared(rejection.0))
    }
}

impl From<Rejection> for Box<dyn Error + 'static> {
    fn from(rejection: Rejection) -> Self {
        Box::new(Shared(rejection.0))
    }
}

/// A shared reason, exposed as an owned error.
struct Shared(Arc<dyn Error + Send + Sync + 'static>);

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for Shared {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rejection").field(&self.0).finish()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
