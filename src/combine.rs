//! Aggregate combinators over sets of promises.
//!
//! Constituent settlements are delivered over channels with capacity for
//! every input, so a slow or losing constituent always hands off its
//! outcome without blocking, and the collector picks whichever signal
//! arrives first.

use std::thread;

use crossbeam_channel::{bounded, select};

use crate::{Promise, Reason};

/// Joins `promises` into one promise of every value.
///
/// The output is index-aligned with the input regardless of completion
/// order. The first constituent rejection rejects the aggregate; the
/// remaining constituents are left to finish on their own. An empty input
/// yields no promise at all, so callers must check for `None` before use.
///
/// # Examples
///
/// ```
/// use promissory::{all, Promise};
///
/// let p = all([Promise::resolved(1), Promise::resolved(2)]).unwrap();
/// assert_eq!(p.wait().unwrap(), vec![1, 2]);
/// ```
pub fn all<T, I>(promises: I) -> Option<Promise<Vec<T>>>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Promise<T>>,
{
    let promises: Vec<_> = promises.into_iter().collect();
    if promises.is_empty() {
        return None;
    }
    Some(Promise::new(move |settler| {
        let (value_tx, value_rx) = bounded(promises.len());
        let (reason_tx, reason_rx) = bounded(promises.len());
        for (idx, promise) in promises.iter().enumerate() {
            let promise = promise.clone();
            let value_tx = value_tx.clone();
            let reason_tx = reason_tx.clone();
            thread::spawn(move || match promise.wait() {
                Ok(value) => {
                    let _ = value_tx.send((idx, value));
                }
                Err(reason) => {
                    let _ = reason_tx.send(reason);
                }
            });
        }

        let mut values: Vec<Option<T>> = vec![None; promises.len()];
        for _ in 0..promises.len() {
            select! {
                recv(value_rx) -> msg => {
                    let (idx, value) = msg.expect("collector keeps a sender alive");
                    values[idx] = Some(value);
                }
                recv(reason_rx) -> msg => {
                    let reason = msg.expect("collector keeps a sender alive");
                    log::trace!("constituent rejected, failing the aggregate: {reason}");
                    settler.reject(reason);
                    return;
                }
            }
        }
        let values = values
            .into_iter()
            .map(|slot| slot.expect("one value per constituent"))
            .collect();
        settler.resolve(values);
    }))
}

/// Settles exactly as whichever constituent settles first, value or reason.
///
/// There is no precedence between success and failure; ties among
/// simultaneous settlements are broken arbitrarily. Losing constituents
/// keep running, and their later settlement is absorbed harmlessly. An
/// empty input yields no promise at all.
///
/// # Examples
///
/// ```
/// use promissory::{race, Promise};
///
/// let p = race([Promise::resolved(1)]).unwrap();
/// assert_eq!(p.wait().unwrap(), 1);
/// ```
pub fn race<T, I>(promises: I) -> Option<Promise<T>>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Promise<T>>,
{
    let promises: Vec<_> = promises.into_iter().collect();
    if promises.is_empty() {
        return None;
    }
    Some(Promise::new(move |settler| {
        let (value_tx, value_rx) = bounded(promises.len());
        let (reason_tx, reason_rx) = bounded(promises.len());
        for promise in &promises {
            let promise = promise.clone();
            let value_tx = value_tx.clone();
            let reason_tx = reason_tx.clone();
            thread::spawn(move || match promise.wait() {
                Ok(value) => {
                    let _ = value_tx.send(value);
                }
                Err(reason) => {
                    let _ = reason_tx.send(reason);
                }
            });
        }

        select! {
            recv(value_rx) -> msg => {
                settler.resolve(msg.expect("collector keeps a sender alive"));
            }
            recv(reason_rx) -> msg => {
                settler.reject(msg.expect("collector keeps a sender alive"));
            }
        }
    }))
}
