//! Chaining combinators.
//!
//! Each combinator spawns through the same executor machinery as
//! [`Promise::new`], so attaching a continuation never blocks the caller,
//! and a panicking continuation rejects the chained promise instead of
//! crashing anything.

use crate::{Promise, Reason};

impl<T: Clone + Send + 'static> Promise<T> {
    /// Maps the fulfillment value, producing a new promise.
    ///
    /// The continuation runs once `self` fulfills; a rejection propagates
    /// to the new promise untouched and the continuation is never invoked.
    ///
    /// # Examples
    ///
    /// ```
    /// use promissory::Promise;
    ///
    /// let p = Promise::new(|settler| settler.resolve(42)).then(|v| v + 1);
    /// assert_eq!(p.wait().unwrap(), 43);
    /// ```
    pub fn then<R, F>(&self, on_fulfilled: F) -> Promise<R>
    where
        R: Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        let src = self.clone();
        Promise::new(move |settler| match src.wait() {
            Ok(value) => settler.resolve(on_fulfilled(value)),
            Err(reason) => settler.reject(reason),
        })
    }

    /// Like [`then`](Self::then) for continuations that themselves return a
    /// promise: the new promise adopts the inner promise's eventual
    /// settlement, so chains never nest a promise inside a promise.
    pub fn and_then<R, F>(&self, on_fulfilled: F) -> Promise<R>
    where
        R: Clone + Send + 'static,
        F: FnOnce(T) -> Promise<R> + Send + 'static,
    {
        let src = self.clone();
        Promise::new(move |settler| match src.wait() {
            Ok(value) => match on_fulfilled(value).wait() {
                Ok(inner) => settler.resolve(inner),
                Err(reason) => settler.reject(reason),
            },
            Err(reason) => settler.reject(reason),
        })
    }

    /// Recovers from rejection. Fulfillment passes through unchanged, so a
    /// `catch` stage is transparent on the success path.
    ///
    /// # Examples
    ///
    /// ```
    /// use promissory::{Promise, Reason};
    ///
    /// let p: Promise<&str> = Promise::rejected(Reason::msg("boom"));
    /// assert_eq!(p.catch(|_| "recovered").wait().unwrap(), "recovered");
    /// ```
    pub fn catch<F>(&self, on_rejected: F) -> Promise<T>
    where
        F: FnOnce(Reason) -> T + Send + 'static,
    {
        let src = self.clone();
        Promise::new(move |settler| match src.wait() {
            Ok(value) => settler.resolve(value),
            Err(reason) => settler.resolve(on_rejected(reason)),
        })
    }

    /// Recovery continuation returning a promise, flattened like
    /// [`and_then`](Self::and_then).
    pub fn or_else<F>(&self, on_rejected: F) -> Promise<T>
    where
        F: FnOnce(Reason) -> Promise<T> + Send + 'static,
    {
        let src = self.clone();
        Promise::new(move |settler| match src.wait() {
            Ok(value) => settler.resolve(value),
            Err(reason) => match on_rejected(reason).wait() {
                Ok(value) => settler.resolve(value),
                Err(reason) => settler.reject(reason),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{Promise, Reason};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn then_maps_the_value() {
        let p = Promise::new(|settler| settler.resolve(42)).then(|v| v + 1);
        assert_eq!(p.wait().unwrap(), 43);
    }

    #[test]
    fn then_skips_continuation_on_rejection() {
        let invoked = Arc::new(AtomicBool::new(false));
        let seen = invoked.clone();
        let reason = Reason::msg("boom");

        let p: Promise<i32> = Promise::rejected(reason.clone());
        let chained = p.then(move |v| {
            seen.store(true, Ordering::SeqCst);
            v
        });

        assert!(chained.wait().unwrap_err().same(&reason));
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[test]
    fn catch_passes_fulfillment_through() {
        let p = Promise::new(|settler| settler.resolve(5)).catch(|_| 0);
        assert_eq!(p.wait().unwrap(), 5);
    }

    #[test]
    fn catch_recovers_and_source_keeps_its_rejection() {
        let failure = Reason::msg("bad");
        let p: Promise<&str> = Promise::rejected(failure.clone());

        let recovered = p.catch(|_| "recovered");
        assert_eq!(recovered.wait().unwrap(), "recovered");
        assert!(p.wait().unwrap_err().same(&failure));
    }

    #[test]
    fn and_then_flattens_transitively() {
        let p = Promise::new(|settler| settler.resolve(2))
            .and_then(|v| Promise::new(move |settler| settler.resolve(v * 10)))
            .and_then(|v| Promise::resolved(v + 1));
        assert_eq!(p.wait().unwrap(), 21);
    }

    #[test]
    fn and_then_adopts_inner_rejection() {
        let reason = Reason::msg("inner failure");
        let inner = reason.clone();
        let p = Promise::new(|settler| settler.resolve(1))
            .and_then(move |_| Promise::<i32>::rejected(inner));
        assert!(p.wait().unwrap_err().same(&reason));
    }

    #[test]
    fn or_else_recovers_with_a_promise() {
        let p: Promise<i32> = Promise::rejected(Reason::msg("boom"));
        let recovered = p.or_else(|_| Promise::new(|settler| settler.resolve(99)));
        assert_eq!(recovered.wait().unwrap(), 99);
    }

    #[test]
    fn panicking_continuation_rejects_the_chained_promise() {
        let p = Promise::new(|settler| settler.resolve(1))
            .then(|_: i32| -> i32 { panic!("continuation blew up") });
        let reason = p.wait().unwrap_err();
        assert!(reason.is_panic());
        assert_eq!(reason.to_string(), "continuation blew up");
    }
}
