//! Time-boxed cache with refresh-on-read.
//!
//! Each entry remembers the instant its refresh was *issued*. An entry is
//! fresh while `now - fetched_at < ttl`; a stale entry is never handed out as
//! fresh. Reading a stale entry runs the refresh function before returning.
//!
//! While a refresh is in flight the entry carries a pending marker, and a
//! concurrent reader gets the previous value flagged as stale instead of
//! issuing a second request. The marker is best effort: a reader arriving when
//! there is no previous value at all still issues its own request.
//!
//! The state lock is a plain `std::sync::Mutex` and is never held across an
//! `.await`.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

/// Why a stale value was served instead of a fresh one.
#[derive(Debug, Clone, PartialEq)]
pub enum StaleReason {
    /// Another caller's refresh has not completed yet.
    RefreshInFlight,
    /// The refresh just attempted failed with this message.
    RefreshFailed(String),
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::RefreshInFlight => write!(f, "refresh in flight"),
            StaleReason::RefreshFailed(msg) => write!(f, "refresh failed: {msg}"),
        }
    }
}

/// Outcome of a cache read.
#[derive(Debug, Clone)]
pub enum Refreshed<V> {
    /// Value within its freshness window (possibly just fetched).
    Fresh(Arc<V>),
    /// Previous value, usable but past its window.
    Stale { value: Arc<V>, reason: StaleReason },
}

impl<V> Refreshed<V> {
    pub fn value(&self) -> &Arc<V> {
        match self {
            Refreshed::Fresh(value) | Refreshed::Stale { value, .. } => value,
        }
    }

    pub fn into_value(self) -> Arc<V> {
        match self {
            Refreshed::Fresh(value) | Refreshed::Stale { value, .. } => value,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Refreshed::Stale { .. })
    }
}

struct Entry<V> {
    stored: Option<(DateTime<Utc>, Arc<V>)>,
    pending_since: Option<DateTime<Utc>>,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            stored: None,
            pending_since: None,
        }
    }
}

/// Keyed cache where each key has its own freshness window.
pub struct TtlCache<K, V> {
    ttl: TimeDelta,
    entries: Mutex<BTreeMap<K, Entry<V>>>,
}

impl<K: Ord + Clone, V> TtlCache<K, V> {
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            ttl,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<K, Entry<V>>> {
        // Entries are replaced wholesale, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_fresh(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - fetched_at < self.ttl
    }

    /// The fresh value for `key`, if any. Never returns a stale value.
    pub fn get_fresh(&self, key: &K, now: DateTime<Utc>) -> Option<Arc<V>> {
        let entries = self.lock();
        match entries.get(key).and_then(|entry| entry.stored.as_ref()) {
            Some((fetched_at, value)) if self.is_fresh(*fetched_at, now) => Some(value.clone()),
            _ => None,
        }
    }

    /// Instant of the last successful refresh of `key`.
    pub fn fetched_at(&self, key: &K) -> Option<DateTime<Utc>> {
        self.lock()
            .get(key)
            .and_then(|entry| entry.stored.as_ref().map(|(at, _)| *at))
    }

    /// Drop the entry for `key` so the next read refreshes.
    pub fn invalidate(&self, key: &K) {
        self.lock().remove(key);
    }

    /// Return the fresh value for `key` or refresh it.
    ///
    /// On refresh failure the previous value, when there is one, comes back as
    /// `Refreshed::Stale` and the entry stays stale so the next read retries.
    /// With no previous value the refresh error is returned.
    pub async fn get_or_refresh<F, Fut, E>(
        &self,
        key: K,
        now: DateTime<Utc>,
        refresh: F,
    ) -> Result<Refreshed<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: fmt::Display,
    {
        {
            let mut entries = self.lock();
            let entry = entries.entry(key.clone()).or_default();

            if let Some((fetched_at, value)) = &entry.stored {
                if self.is_fresh(*fetched_at, now) {
                    return Ok(Refreshed::Fresh(value.clone()));
                }
                if let Some(pending) = entry.pending_since
                    && self.is_fresh(pending, now)
                {
                    return Ok(Refreshed::Stale {
                        value: value.clone(),
                        reason: StaleReason::RefreshInFlight,
                    });
                }
            }

            entry.pending_since = Some(now);
        }

        let result = refresh().await;

        let mut entries = self.lock();
        let entry = entries.entry(key).or_default();
        if entry.pending_since == Some(now) {
            entry.pending_since = None;
        }

        match result {
            Ok(value) => {
                let value = Arc::new(value);
                // A response older than the stored one must not replace it.
                let newer_stored = entry
                    .stored
                    .as_ref()
                    .filter(|(fetched_at, _)| *fetched_at > now)
                    .map(|(_, stored)| stored.clone());
                match newer_stored {
                    Some(stored) => Ok(Refreshed::Fresh(stored)),
                    None => {
                        entry.stored = Some((now, value.clone()));
                        drop(entries);
                        self.prune(now);
                        Ok(Refreshed::Fresh(value))
                    }
                }
            }
            Err(err) => match &entry.stored {
                Some((_, value)) => Ok(Refreshed::Stale {
                    value: value.clone(),
                    reason: StaleReason::RefreshFailed(err.to_string()),
                }),
                None => Err(err),
            },
        }
    }

    /// Remove entries that are stale and have no refresh in flight.
    fn prune(&self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.lock().retain(|_, entry| {
            let fresh = entry
                .stored
                .as_ref()
                .is_some_and(|(fetched_at, _)| now - *fetched_at < ttl);
            fresh || entry.pending_since.is_some()
        });
    }
}
