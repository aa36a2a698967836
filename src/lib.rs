//! Thread-backed promises for Rust.
//!
//! A [`Promise`] is a container for a value that becomes available later.
//! [`Promise::new`] runs an executor on its own thread and hands it a
//! [`Settler`]; the first `resolve` or `reject` wins and every waiter,
//! blocking or async, observes that one outcome. Rejections skip
//! [`then`](Promise::then) continuations and are recovered with
//! [`catch`](Promise::catch); [`all`] and [`race`] combine several promises
//! into one.
//!
//! # Examples
//!
//! ```
//! use promissory::Promise;
//!
//! let p = Promise::new(|settler| settler.resolve(42));
//! let p = p.then(|v| v + 1);
//! assert_eq!(p.wait().unwrap(), 43);
//! ```
//!
//! ```
//! use promissory::{Promise, Reason};
//!
//! let p: Promise<&str> = Promise::new(|settler| settler.reject(Reason::msg("boom")));
//! let recovered = p.catch(|_| "recovered");
//! assert_eq!(recovered.wait().unwrap(), "recovered");
//! ```

mod chain;
pub mod combine;
pub mod promise;

pub use combine::{all, race};
pub use promise::{Promise, Settler, Status};

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Errors raised by the promise machinery itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An executor or continuation panicked. The message is the panic
    /// payload when it was a string, a placeholder otherwise.
    #[error("{0}")]
    Panicked(String),
    /// Every [`Settler`] handle was dropped while the promise was pending.
    #[error("settler dropped without settling the promise")]
    SettlerDropped,
}

/// A rejection carrying a bare message.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

/// Why a promise was rejected.
///
/// `Reason` is a shared handle to the originating error: cloning it and
/// passing it down a chain never loses the error's identity, and
/// [`same`](Reason::same) distinguishes two handles to one error from two
/// errors that merely render alike.
#[derive(Clone)]
pub struct Reason(Arc<dyn StdError + Send + Sync + 'static>);

impl Reason {
    /// Wraps an error value.
    pub fn new<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Reason(Arc::new(err))
    }

    /// Builds a reason from a bare message.
    pub fn msg<M: fmt::Display>(message: M) -> Self {
        Reason(Arc::new(Message(message.to_string())))
    }

    /// True when `self` and `other` are handles to the same underlying
    /// error value.
    pub fn same(&self, other: &Reason) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Borrows the underlying error, e.g. for downcasting.
    pub fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }

    /// True when this rejection came from a caught panic.
    pub fn is_panic(&self) -> bool {
        matches!(self.0.downcast_ref::<Error>(), Some(Error::Panicked(_)))
    }

    /// Converts a panic payload into a rejection reason.
    ///
    /// A payload that already is a `Reason` passes through untouched; a
    /// string payload keeps its message; anything else gets a placeholder.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<Reason>() {
            Ok(reason) => return *reason,
            Err(other) => other,
        };
        let payload = match payload.downcast::<String>() {
            Ok(message) => return Reason::new(Error::Panicked(*message)),
            Err(other) => other,
        };
        match payload.downcast::<&'static str>() {
            Ok(message) => Reason::new(Error::Panicked((*message).to_owned())),
            Err(_) => Reason::new(Error::Panicked("opaque panic payload".to_owned())),
        }
    }
}

impl fmt::Debug for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for Reason {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}
