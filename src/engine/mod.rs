//! The clock engine.
//!
//! `Engine` is the context object every tick goes through. It owns the
//! calendar caches (inside its calendar provider), the time offset and the
//! clock, and picks the provider by feed health.
//!
//! ## Module Structure
//!
//! - [`boundary`]: next candle lighting / havdalah with one-day lookahead
//! - [`day_state`]: first-match day classification
//! - [`provider`]: calendar-backed and sunset-backed day-state providers

pub mod boundary;
pub mod day_state;
pub mod provider;

pub use boundary::Boundary;
pub use day_state::{DayKind, DayState, classify_events};
pub use provider::{CalendarProvider, DayStateProvider, DayStatus, SolarProvider, StatusSource};

use chrono::DateTime;
use chrono_tz::Tz;
use std::sync::{Arc, Mutex};

use crate::calendar::{CalendarFeed, EventFetcher};
use crate::common::utils::format_offset;
use crate::config::Config;
use crate::error::EngineResult;
use crate::time_source::{TimeOffset, TimeSource};

/// Calendar feed health as last observed by `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedHealth {
    /// No tick has run yet.
    Unknown,
    Healthy,
    /// The last calendar attempt failed; the solar provider is answering.
    Degraded,
}

pub struct Engine<F> {
    calendar: CalendarProvider<F>,
    solar: SolarProvider,
    clock: Arc<dyn TimeSource>,
    offset: TimeOffset,
    tz: Tz,
    health: Mutex<FeedHealth>,
    last_status: Mutex<Option<DayStatus>>,
}

impl<F: CalendarFeed> Engine<F> {
    pub fn new(config: &Config, feed: F, clock: Arc<dyn TimeSource>) -> Self {
        if clock.is_simulated() {
            log_debug!("Engine running on a simulated clock");
        }
        Self {
            calendar: CalendarProvider::new(feed, config),
            solar: SolarProvider::new(config),
            clock,
            offset: TimeOffset::new(0),
            tz: config.timezone(),
            health: Mutex::new(FeedHealth::Unknown),
            last_status: Mutex::new(None),
        }
    }

    /// The displayed instant: clock plus offset, in the configured timezone.
    pub fn now(&self) -> DateTime<Tz> {
        self.offset.apply(self.clock.now()).with_timezone(&self.tz)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn fetcher(&self) -> &EventFetcher<F> {
        self.calendar.fetcher()
    }

    pub fn health(&self) -> FeedHealth {
        self.health.lock().map(|h| *h).unwrap_or(FeedHealth::Unknown)
    }

    /// Offset in milliseconds.
    pub fn offset(&self) -> i64 {
        self.offset.get()
    }

    pub fn set_offset(&self, millis: i64) {
        self.offset.set(millis);
        log_info!("Clock offset set to {}", format_offset(millis));
    }

    /// Shift the offset by `delta` milliseconds; returns the new offset.
    pub fn adjust_offset(&self, delta: i64) -> i64 {
        let millis = self.offset.adjust(delta);
        log_info!("Clock offset now {}", format_offset(millis));
        millis
    }

    pub fn reset_offset(&self) {
        self.offset.reset();
        log_info!("Clock offset cleared");
    }

    /// Next boundary for `now` from calendar data.
    pub async fn resolve_boundary(&self, now: DateTime<Tz>) -> EngineResult<Boundary> {
        let (boundary, _) = self.calendar.resolve_boundary(now, self.clock.now()).await?;
        Ok(boundary)
    }

    /// Calendar classification of the day containing `now`.
    pub async fn classify_day(&self, now: DateTime<Tz>) -> EngineResult<DayState> {
        let (state, _) = self.calendar.classify_day(now, self.clock.now()).await?;
        Ok(state)
    }

    /// Status for `now`, calendar first, sunset-only on failure.
    pub async fn day_status(&self, now: DateTime<Tz>) -> EngineResult<DayStatus> {
        let real_now = self.clock.now();
        match self.calendar.day_status(now, real_now).await {
            Ok(status) => {
                self.record_health(FeedHealth::Healthy, None);
                Ok(status)
            }
            Err(e) => {
                self.record_health(FeedHealth::Degraded, Some(&e.to_string()));
                self.solar.day_status(now, real_now).await
            }
        }
    }

    /// Status for the current displayed instant. Never fails.
    ///
    /// When both providers fail the last status is repeated with the new
    /// time; with no last status a neutral weekday is returned.
    pub async fn tick(&self) -> DayStatus {
        let now = self.now();
        let status = match self.day_status(now).await {
            Ok(status) => status,
            Err(e) => {
                let last = self.last_status.lock().ok().and_then(|last| last.clone());
                match last {
                    Some(last) => {
                        log_error!("No day state available, repeating the last one: {}", e);
                        DayStatus { now, ..last }
                    }
                    None => {
                        log_critical!("No day state available, showing the plain date: {}", e);
                        DayStatus::neutral(now)
                    }
                }
            }
        };

        if let Ok(mut last) = self.last_status.lock() {
            *last = Some(status.clone());
        }
        status
    }

    /// Log health transitions once.
    fn record_health(&self, observed: FeedHealth, reason: Option<&str>) {
        let Ok(mut health) = self.health.lock() else {
            return;
        };
        if *health == observed {
            return;
        }

        match (*health, observed) {
            (FeedHealth::Degraded, FeedHealth::Healthy) => {
                log_info!("Calendar feed restored");
            }
            (_, FeedHealth::Degraded) => {
                log_warning!(
                    "Calendar feed unavailable, showing sunset times: {}",
                    reason.unwrap_or("unknown error")
                );
            }
            _ => {
                log_debug!("Calendar feed healthy: {}", self.calendar.fetcher().feed().describe());
            }
        }
        *health = observed;
    }
}

impl<F> Drop for Engine<F> {
    fn drop(&mut self) {
        log_debug!("Engine stopped, offset was {}", format_offset(self.offset.get()));
    }
}
