//! Time source abstraction and the user-adjustable clock offset.
//!
//! The engine never reads the system clock directly. It asks a `TimeSource`
//! for the real instant (used for cache freshness) and adds the `TimeOffset`
//! to obtain the simulated "now" shown on the clock face. Tests inject a
//! `ManualTimeSource` to step time deterministically.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

/// Trait for abstracting the wall clock.
pub trait TimeSource: Send + Sync {
    /// Get the current real instant.
    fn now(&self) -> DateTime<Utc>;

    /// Check if this is a simulated time source
    fn is_simulated(&self) -> bool {
        false
    }
}

/// Real-time implementation that uses actual system time
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and replays.
///
/// Time only moves when `set` or `advance` is called.
pub struct ManualTimeSource {
    current: Mutex<DateTime<Utc>>,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.lock() = instant;
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut guard = self.lock();
        *guard += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock still holds a valid instant.
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Signed millisecond offset between the real clock and the displayed clock.
///
/// Zero by default. Only the offset control mutates it; the engine reads it
/// once per tick.
#[derive(Debug, Default)]
pub struct TimeOffset {
    millis: AtomicI64,
}

impl TimeOffset {
    pub fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn get(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }

    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Add `delta` milliseconds and return the new offset. Saturates at the
    /// `i64` range.
    pub fn adjust(&self, delta: i64) -> i64 {
        let previous = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |millis| {
                Some(millis.saturating_add(delta))
            })
            .unwrap_or_else(|millis| millis);
        previous.saturating_add(delta)
    }

    pub fn reset(&self) {
        self.set(0);
    }

    /// Apply the offset to a real instant.
    ///
    /// An offset that would leave the representable range is ignored and the
    /// real instant is returned unchanged.
    pub fn apply(&self, real: DateTime<Utc>) -> DateTime<Utc> {
        ChronoDuration::try_milliseconds(self.get())
            .and_then(|delta| real.checked_add_signed(delta))
            .unwrap_or(real)
    }
}
