//! The promise state machine: a write-once cell settled through a
//! [`Settler`] and observed by any number of waiters.

use std::fmt;
use std::future::Future;
use std::mem;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex};
use std::task::{Context, Poll, Waker};
use std::thread;

use crate::{Error, Reason};

/// Where a promise is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Not yet settled.
    Pending,
    /// Settled with a value.
    Fulfilled,
    /// Settled with a [`Reason`].
    Rejected,
}

enum State<T> {
    Pending,
    Fulfilled(T),
    Rejected(Reason),
}

struct Cell<T> {
    state: State<T>,
    wakers: Vec<Waker>,
}

struct Shared<T> {
    cell: Mutex<Cell<T>>,
    settled: Condvar,
}

impl<T> Shared<T> {
    fn new(state: State<T>) -> Arc<Self> {
        Arc::new(Shared {
            cell: Mutex::new(Cell {
                state,
                wakers: Vec::new(),
            }),
            settled: Condvar::new(),
        })
    }

    /// The one transition out of `Pending`. First caller wins; later calls
    /// are no-ops. Returns whether this call was the winner.
    fn settle(&self, outcome: Result<T, Reason>) -> bool {
        let mut cell = self.cell.lock().unwrap();
        if !matches!(cell.state, State::Pending) {
            return false;
        }
        cell.state = match outcome {
            Ok(value) => State::Fulfilled(value),
            Err(reason) => State::Rejected(reason),
        };
        let wakers = mem::take(&mut cell.wakers);
        drop(cell);
        self.settled.notify_all();
        for waker in wakers {
            waker.wake();
        }
        true
    }
}

/// A value that becomes available asynchronously.
///
/// `Promise<T>` is a cheap-clone handle: every clone addresses the same
/// settlement cell, so several threads can wait on one promise and each
/// observes the single settlement. Promises can also be `.await`ed from
/// async code.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Promise {
            shared: self.shared.clone(),
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("status", &self.status())
            .finish()
    }
}

impl<T: Send + 'static> Promise<T> {
    /// Runs `exec` on a fresh thread and returns the promise it settles.
    ///
    /// The promise is still [`Pending`](Status::Pending) when this returns.
    /// A panic inside `exec` is caught at the thread boundary and becomes a
    /// rejection: a payload that is itself a [`Reason`] is used unchanged,
    /// a string payload keeps its message. Should every [`Settler`] clone
    /// be dropped with the promise still pending, the promise is rejected
    /// with [`Error::SettlerDropped`] so waiters are never stranded.
    ///
    /// # Examples
    ///
    /// ```
    /// use promissory::Promise;
    ///
    /// let p = Promise::new(|settler| settler.resolve("🍓"));
    /// assert_eq!(p.wait().unwrap(), "🍓");
    /// ```
    pub fn new<F>(exec: F) -> Self
    where
        F: FnOnce(Settler<T>) + Send + 'static,
    {
        let shared = Shared::new(State::Pending);
        let promise = Promise {
            shared: shared.clone(),
        };
        let settler = Settler::attach(shared);
        thread::spawn(move || {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| exec(settler.clone()))) {
                let reason = Reason::from_panic(payload);
                log::debug!("executor panicked, rejecting promise: {reason}");
                settler.reject(reason);
            }
        });
        promise
    }

    /// An already-fulfilled promise. No thread is spawned; waiting returns
    /// immediately.
    pub fn resolved(value: T) -> Self {
        Promise {
            shared: Shared::new(State::Fulfilled(value)),
        }
    }

    /// An already-rejected promise. No thread is spawned; waiting returns
    /// immediately.
    pub fn rejected(reason: Reason) -> Self {
        Promise {
            shared: Shared::new(State::Rejected(reason)),
        }
    }
}

impl<T> Promise<T> {
    /// Current status, without blocking.
    pub fn status(&self) -> Status {
        match self.shared.cell.lock().unwrap().state {
            State::Pending => Status::Pending,
            State::Fulfilled(_) => Status::Fulfilled,
            State::Rejected(_) => Status::Rejected,
        }
    }

    /// True once the promise has left [`Status::Pending`].
    pub fn is_settled(&self) -> bool {
        self.status() != Status::Pending
    }
}

impl<T: Clone> Promise<T> {
    /// Blocks the calling thread until the promise settles.
    ///
    /// Any number of threads may wait on the same promise, before or after
    /// settlement; each receives the same outcome. Waiters park on a
    /// condvar, they do not spin.
    pub fn wait(&self) -> Result<T, Reason> {
        let mut cell = self.shared.cell.lock().unwrap();
        while matches!(cell.state, State::Pending) {
            cell = self.shared.settled.wait(cell).unwrap();
        }
        match &cell.state {
            State::Fulfilled(value) => Ok(value.clone()),
            State::Rejected(reason) => Err(reason.clone()),
            State::Pending => unreachable!(),
        }
    }

    /// Like [`wait`](Self::wait) but returns `None` while still pending.
    pub fn try_wait(&self) -> Option<Result<T, Reason>> {
        match &self.shared.cell.lock().unwrap().state {
            State::Pending => None,
            State::Fulfilled(value) => Some(Ok(value.clone())),
            State::Rejected(reason) => Some(Err(reason.clone())),
        }
    }
}

impl<T: Clone> Future for Promise<T> {
    type Output = Result<T, Reason>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut cell = self.shared.cell.lock().unwrap();
        match &cell.state {
            State::Fulfilled(value) => Poll::Ready(Ok(value.clone())),
            State::Rejected(reason) => Poll::Ready(Err(reason.clone())),
            State::Pending => {
                // Every polling task keeps its own waker registered; all of
                // them are woken on settlement.
                cell.wakers.push(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// The write end of a promise, handed to executors.
///
/// Clones all point at the same promise. The first `resolve` or `reject`
/// across every clone wins; the guard serializes racing calls, so no caller
/// discipline is needed. When the last clone drops with the promise still
/// pending, the promise is rejected with [`Error::SettlerDropped`].
pub struct Settler<T> {
    shared: Arc<Shared<T>>,
    _guard: Arc<AbandonGuard<T>>,
}

impl<T> Clone for Settler<T> {
    fn clone(&self) -> Self {
        Settler {
            shared: self.shared.clone(),
            _guard: self._guard.clone(),
        }
    }
}

impl<T> Settler<T> {
    fn attach(shared: Arc<Shared<T>>) -> Self {
        let guard = Arc::new(AbandonGuard {
            shared: shared.clone(),
        });
        Settler {
            shared,
            _guard: guard,
        }
    }

    /// Fulfills the promise, unless it already settled.
    pub fn resolve(&self, value: T) {
        self.shared.settle(Ok(value));
    }

    /// Rejects the promise, unless it already settled.
    pub fn reject(&self, reason: Reason) {
        self.shared.settle(Err(reason));
    }
}

/// Dropped when the last [`Settler`] clone goes away; rejects a promise
/// that would otherwise stay pending forever.
struct AbandonGuard<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Drop for AbandonGuard<T> {
    fn drop(&mut self) {
        if self.shared.settle(Err(Reason::new(Error::SettlerDropped))) {
            log::trace!("settler dropped, rejecting abandoned promise");
        }
    }
}
