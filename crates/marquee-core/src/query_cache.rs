//! Request memoization keyed by `(endpoint, params)`.
//!
//! A lookup either returns the resolved value, joins a request already in
//! flight for the same key, or starts a new fetch. Failed entries are kept
//! so their state can be shown, and are fetched again on the next lookup.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;

use crate::error::CoreError;

/// Identity of a request: endpoint path plus sorted parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    endpoint: String,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.endpoint)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{name}={value}")?;
        }
        Ok(())
    }
}

/// Observable state of a cached request.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<V> {
    Pending,
    Resolved(V),
    Failed(String),
}

/// How often, and how patiently, a failing fetch is re-attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Fail on the first error.
    pub fn none() -> Self {
        Self {
            retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Exponential backoff: `base * 2^attempt`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

type Outcome<V> = Option<Result<V, String>>;

enum Slot<V> {
    Pending(watch::Receiver<Outcome<V>>),
    Resolved(V),
    Failed(String),
}

enum Lookup<V> {
    Wait(watch::Receiver<Outcome<V>>),
    Fetch(watch::Sender<Outcome<V>>),
}

/// Memoizes fetches of `V` by [`QueryKey`].
pub struct QueryCache<V> {
    slots: Mutex<HashMap<QueryKey, Slot<V>>>,
    retry: RetryPolicy,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            retry,
        }
    }

    pub fn state(&self, key: &QueryKey) -> Option<QueryState<V>> {
        self.lock().get(key).map(|slot| match slot {
            Slot::Pending(_) => QueryState::Pending,
            Slot::Resolved(v) => QueryState::Resolved(v.clone()),
            Slot::Failed(msg) => QueryState::Failed(msg.clone()),
        })
    }

    /// Drop the entry for `key` so the next lookup fetches again.
    pub fn invalidate(&self, key: &QueryKey) {
        self.lock().remove(key);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Return the cached value for `key`, or run `fetch` (with retries) to get it.
    ///
    /// Concurrent lookups of a key that is already being fetched wait for that
    /// fetch instead of issuing their own.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &QueryKey, fetch: F) -> Result<V, CoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: fmt::Display,
    {
        loop {
            let lookup = {
                let mut slots = self.lock();
                let in_flight = match slots.get(key) {
                    Some(Slot::Resolved(v)) => {
                        tracing::debug!(%key, "cache hit");
                        return Ok(v.clone());
                    }
                    Some(Slot::Pending(rx)) => Some(rx.clone()),
                    Some(Slot::Failed(_)) | None => None,
                };
                match in_flight {
                    Some(rx) => Lookup::Wait(rx),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        slots.insert(key.clone(), Slot::Pending(rx));
                        Lookup::Fetch(tx)
                    }
                }
            };

            match lookup {
                Lookup::Wait(mut rx) => {
                    let outcome = match rx.wait_for(Option::is_some).await {
                        Ok(outcome) => outcome.clone(),
                        // The fetching lookup was dropped; take over on the next pass.
                        Err(_) => continue,
                    };
                    if let Some(result) = outcome {
                        return result.map_err(CoreError::Fetch);
                    }
                }
                Lookup::Fetch(tx) => {
                    let mut guard = PendingGuard {
                        cache: self,
                        key,
                        done: false,
                    };
                    tracing::debug!(%key, "fetching");
                    let result = self.fetch_with_retry(key, &fetch).await;
                    {
                        let mut slots = self.lock();
                        let slot = match &result {
                            Ok(v) => Slot::Resolved(v.clone()),
                            Err(msg) => Slot::Failed(msg.clone()),
                        };
                        slots.insert(key.clone(), slot);
                    }
                    guard.done = true;
                    let _ = tx.send(Some(result.clone()));
                    return result.map_err(CoreError::Fetch);
                }
            }
        }
    }

    async fn fetch_with_retry<F, Fut, E>(&self, key: &QueryKey, fetch: &F) -> Result<V, String>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: fmt::Display,
    {
        let mut attempt = 0;
        loop {
            match fetch().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.retry.retries => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(%key, attempt, ?delay, "fetch failed, retrying: {e}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(%key, "fetch failed: {e}");
                    return Err(e.to_string());
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Slot<V>>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<V: Clone> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

/// Clears a pending slot if the fetching lookup is dropped before it finishes,
/// so the key does not stay pending forever.
struct PendingGuard<'a, V: Clone> {
    cache: &'a QueryCache<V>,
    key: &'a QueryKey,
    done: bool,
}

impl<V: Clone> Drop for PendingGuard<'_, V> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut slots = self.cache.lock();
        if matches!(slots.get(self.key), Some(Slot::Pending(_))) {
            slots.remove(self.key);
        }
    }
}
