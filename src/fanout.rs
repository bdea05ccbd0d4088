//! Concurrent calls whose outcomes are all collected.
//!
//! Every place that talks to GitHub for a batch of items (commits, pull
//! requests, issues, comment targets) goes through [`FanOut::settle_all`].
//! A failing or hung call only costs its own item: the batch always runs to
//! completion, and the caller gets the successes and the failures back
//! separately, in the order the items were submitted.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing as log;

/// How many calls a single fan-out keeps in flight, and how long each may
/// take.
#[derive(Clone, Debug)]
pub struct FanOut {
    limit: usize,
    timeout: Option<Duration>,
}

impl Default for FanOut {
    fn default() -> Self {
        FanOut::new(8, Some(Duration::from_secs(30)))
    }
}

/// An item whose call failed, with the reason.
#[derive(Debug)]
pub struct Failure<K> {
    pub key: K,
    pub error: anyhow::Error,
}

/// The outcome of a fan-out, partitioned.
#[derive(Debug)]
pub struct Settled<K, T> {
    pub successes: Vec<(K, T)>,
    pub failures: Vec<Failure<K>>,
}

impl<K, T> Settled<K, T> {
    /// Drops the keys and returns only the values of successful calls.
    pub fn values(self) -> Vec<T> {
        self.successes.into_iter().map(|(_, v)| v).collect()
    }
}

impl FanOut {
    /// `limit` is clamped to at least one call in flight.
    pub fn new(limit: usize, timeout: Option<Duration>) -> Self {
        FanOut {
            limit: limit.max(1),
            timeout,
        }
    }

    /// Calls `f` once per key, with at most `limit` calls in flight, and
    /// waits for all of them.
    ///
    /// Results keep submission order regardless of completion order. A call
    /// that exceeds the timeout is recorded as a failure like any other
    /// error. Each failure is logged at `warn` under `what`.
    pub async fn settle_all<K, T, F, Fut>(&self, what: &str, keys: Vec<K>, f: F) -> Settled<K, T>
    where
        K: Clone + fmt::Debug,
        F: Fn(K) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let timeout = self.timeout;
        let outcomes: Vec<(K, anyhow::Result<T>)> = stream::iter(keys)
            .map(|key| {
                let call = f(key.clone());
                async move {
                    let result = match timeout {
                        Some(limit) => match tokio::time::timeout(limit, call).await {
                            Ok(result) => result,
                            Err(_) => Err(anyhow::anyhow!(
                                "timed out after {} seconds",
                                limit.as_secs_f64()
                            )),
                        },
                        None => call.await,
                    };
                    (key, result)
                }
            })
            .buffered(self.limit)
            .collect()
            .await;

        let mut settled = Settled {
            successes: Vec::with_capacity(outcomes.len()),
            failures: Vec::new(),
        };
        for (key, result) in outcomes {
            match result {
                Ok(value) => settled.successes.push((key, value)),
                Err(error) => {
                    log::warn!("{what} failed for {key:?}: {error:?}");
                    settled.failures.push(Failure { key, error });
                }
            }
        }
        settled
    }
}
