//! Event fetching and per-day filtering.
//!
//! `EventFetcher` owns both caches:
//! - the raw cache holds the classified month window, keyed by fetch time
//! - the day cache holds one filtered slice per calendar date, with its own
//!   (usually shorter) freshness window
//!
//! Cache freshness is measured on the real clock (`fetched_at` vs. `real_now`),
//! while window selection and day filtering use the displayed "now", which
//! may be shifted by the clock offset.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use super::cache::{Refreshed, TtlCache};
use super::event::{CalendarEvent, CategoryMap, RawEvent};
use super::feed::{CalendarFeed, FeedWindow};
use crate::config::Config;
use crate::error::{EngineError, EngineResult};

/// Classified events of one window.
#[derive(Debug)]
pub struct EventBatch {
    pub window: FeedWindow,
    pub events: Arc<[CalendarEvent]>,
}

/// Result of a fetch: the events plus whether they are past their window.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub window: FeedWindow,
    pub events: Arc<[CalendarEvent]>,
    pub stale: bool,
}

/// Events of a single calendar day, in feed order.
#[derive(Debug, Clone)]
pub struct DayEvents {
    pub date: NaiveDate,
    pub events: Arc<[CalendarEvent]>,
    /// True when the underlying month window was served stale.
    pub stale: bool,
}

/// Fetches, classifies and filters calendar events.
pub struct EventFetcher<F> {
    feed: F,
    categories: CategoryMap,
    tz: Tz,
    raw_cache: TtlCache<(), EventBatch>,
    day_cache: TtlCache<NaiveDate, DayEvents>,
}

impl<F: CalendarFeed> EventFetcher<F> {
    pub fn new(feed: F, config: &Config) -> Self {
        Self {
            feed,
            categories: config.category_map(),
            tz: config.timezone(),
            raw_cache: TtlCache::new(config.events_cache_ttl()),
            day_cache: TtlCache::new(config.day_cache_ttl()),
        }
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Classify a batch, skipping items whose date cannot be parsed.
    pub fn classify_all(&self, raw: &[RawEvent]) -> Vec<CalendarEvent> {
        raw.iter()
            .filter_map(
                |item| match CalendarEvent::classify(item, &self.categories, self.tz) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        log_warning!("Skipping calendar item: {}", e);
                        None
                    }
                },
            )
            .collect()
    }

    /// Return the month window of classified events covering `now`.
    ///
    /// A valid cache entry is returned as-is (same `Arc`, no network access).
    /// Otherwise the window `[start_of_day(now), +1 month]` is fetched.
    /// A failed refresh serves the previous batch flagged stale; with no
    /// previous batch the error is returned.
    pub async fn fetch_events(
        &self,
        now: DateTime<Tz>,
        real_now: DateTime<Utc>,
    ) -> EngineResult<FeedSnapshot> {
        self.fetch_events_from(now.with_timezone(&self.tz).date_naive(), real_now)
            .await
    }

    /// Same as [`fetch_events`](Self::fetch_events), for a window starting on
    /// `today`.
    pub async fn fetch_events_from(
        &self,
        today: NaiveDate,
        real_now: DateTime<Utc>,
    ) -> EngineResult<FeedSnapshot> {
        // A window that no longer covers today (offset jump, long uptime) is
        // as good as expired.
        if let Some(batch) = self.raw_cache.get_fresh(&(), real_now)
            && !batch.window.contains(today)
        {
            log_debug!(
                "Cached window {}..{} does not cover {}, refetching",
                batch.window.start,
                batch.window.end,
                today
            );
            self.raw_cache.invalidate(&());
        }

        let window = FeedWindow::month_from(today);
        let refreshed = self
            .raw_cache
            .get_or_refresh((), real_now, || async move {
                log_debug!("Calling the calendar feed: {}", self.feed.describe());
                let raw = self.feed.fetch(window).await?;
                let events = self.classify_all(&raw);
                log_debug!(
                    "Retrieved {} event(s) for {}..{}",
                    events.len(),
                    window.start,
                    window.end
                );
                Ok::<_, EngineError>(EventBatch {
                    window,
                    events: events.into(),
                })
            })
            .await?;

        if let Refreshed::Stale { reason, .. } = &refreshed {
            log_warning!("Serving cached calendar events ({})", reason);
        }

        let stale = refreshed.is_stale();
        let batch = refreshed.into_value();
        Ok(FeedSnapshot {
            window: batch.window,
            events: batch.events.clone(),
            stale,
        })
    }

    /// Events whose instant falls on the same calendar day as `now`.
    ///
    /// Served from the day cache while fresh; otherwise runs the fetch check
    /// and filters the window. Feed order is preserved.
    pub async fn events_on_day(
        &self,
        now: DateTime<Tz>,
        real_now: DateTime<Utc>,
    ) -> EngineResult<DayEvents> {
        self.events_on_date(now.with_timezone(&self.tz).date_naive(), real_now)
            .await
    }

    /// Events dated on the calendar day `date`.
    pub async fn events_on_date(
        &self,
        date: NaiveDate,
        real_now: DateTime<Utc>,
    ) -> EngineResult<DayEvents> {
        let refreshed = self
            .day_cache
            .get_or_refresh(date, real_now, || async move {
                let snapshot = self.fetch_events_from(date, real_now).await?;
                let events: Vec<CalendarEvent> = snapshot
                    .events
                    .iter()
                    .filter(|event| event.date() == date)
                    .cloned()
                    .collect();
                log_debug!("Found {} event(s) on {}", events.len(), date);
                Ok::<_, EngineError>(DayEvents {
                    date,
                    events: events.into(),
                    stale: snapshot.stale,
                })
            })
            .await?;

        let stale = refreshed.is_stale();
        let day = refreshed.into_value();
        Ok(DayEvents {
            date: day.date,
            events: day.events.clone(),
            stale: day.stale || stale,
        })
    }
}
