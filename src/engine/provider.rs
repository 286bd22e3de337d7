//! Day-state providers.
//!
//! Two ways to answer "what kind of day is it and what comes next":
//! - [`CalendarProvider`] reads the calendar feed (authoritative)
//! - [`SolarProvider`] derives Shabbat from sunset alone, used while the feed
//!   is unavailable

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::future::Future;

use super::boundary::Boundary;
use super::day_state::{DayKind, DayState, classify_events};
use crate::calendar::{CalendarEvent, CalendarFeed, EventFetcher};
use crate::config::{Config, RestPeriodAuthority};
use crate::error::EngineResult;
use crate::geo::SolarRules;

/// Where a status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    /// Calendar feed; `stale` when a previous batch was served.
    Calendar { stale: bool },
    /// Sunset-only fallback.
    Solar,
}

/// Everything the clock face needs for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct DayStatus {
    pub now: DateTime<Tz>,
    pub state: DayState,
    pub source: StatusSource,
}

impl DayStatus {
    /// Neutral weekday with nothing to show.
    pub fn neutral(now: DateTime<Tz>) -> Self {
        Self {
            now,
            state: DayState::weekday(),
            source: StatusSource::Solar,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self.source, StatusSource::Calendar { stale: true })
    }
}

/// Source of day states.
pub trait DayStateProvider: Send + Sync {
    /// Status for the displayed instant `now`.
    ///
    /// `real_now` is the unshifted wall clock, used for cache freshness.
    fn day_status(
        &self,
        now: DateTime<Tz>,
        real_now: DateTime<Utc>,
    ) -> impl Future<Output = EngineResult<DayStatus>> + Send;

    fn name(&self) -> &'static str;
}

/// Calendar-feed backed provider.
pub struct CalendarProvider<F> {
    fetcher: EventFetcher<F>,
    authority: RestPeriodAuthority,
}

impl<F: CalendarFeed> CalendarProvider<F> {
    pub fn new(feed: F, config: &Config) -> Self {
        Self {
            fetcher: EventFetcher::new(feed, config),
            authority: config.rest_period_authority(),
        }
    }

    pub fn fetcher(&self) -> &EventFetcher<F> {
        &self.fetcher
    }

    /// Next candle lighting and havdalah, looking one day ahead once today's
    /// relevant boundary has passed.
    pub async fn resolve_boundary(
        &self,
        now: DateTime<Tz>,
        real_now: DateTime<Utc>,
    ) -> EngineResult<(Boundary, bool)> {
        let today = self.fetcher.events_on_day(now, real_now).await?;
        let boundary = Boundary::from_events(today.date, &today.events);

        if !boundary.has_elapsed(now) {
            return Ok((boundary, today.stale));
        }

        // Next calendar day, not now + 24h: DST days are 23 or 25 hours long
        let Some(next_date) = today.date.succ_opt() else {
            return Ok((boundary, today.stale));
        };
        let tomorrow = self.fetcher.events_on_date(next_date, real_now).await?;
        log_debug!(
            "Boundary on {} has passed, looking at {}",
            today.date,
            tomorrow.date
        );
        Ok((
            Boundary::from_events(tomorrow.date, &tomorrow.events),
            today.stale || tomorrow.stale,
        ))
    }

    /// Classify the day containing `now`.
    pub async fn classify_day(
        &self,
        now: DateTime<Tz>,
        real_now: DateTime<Utc>,
    ) -> EngineResult<(DayState, bool)> {
        let today = self.fetcher.events_on_day(now, real_now).await?;
        Ok((classify_events(&today.events), today.stale))
    }
}

impl<F: CalendarFeed> DayStateProvider for CalendarProvider<F> {
    async fn day_status(&self, now: DateTime<Tz>, real_now: DateTime<Utc>) -> EngineResult<DayStatus> {
        let (boundary, boundary_stale) = self.resolve_boundary(now, real_now).await?;
        let (state, state_stale) = self.classify_day(now, real_now).await?;

        let rest_period = match self.authority {
            RestPeriodAuthority::Calendar => state.rest_period,
            RestPeriodAuthority::Boundary => boundary.ends_rest_period(),
        };

        if rest_period != state.rest_period {
            log_debug!(
                "Boundary and classifier disagree on {} ({}), using {:?}",
                now.date_naive(),
                state.kind,
                self.authority
            );
        }

        Ok(DayStatus {
            now,
            state: DayState {
                rest_period,
                ..state.with_boundary(boundary.next().cloned())
            },
            source: StatusSource::Calendar {
                stale: boundary_stale || state_stale,
            },
        })
    }

    fn name(&self) -> &'static str {
        "calendar"
    }
}

/// Sunset-only provider. Knows Shabbat but no holidays.
pub struct SolarProvider {
    rules: SolarRules,
}

impl SolarProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            rules: SolarRules {
                latitude: config.latitude(),
                longitude: config.longitude(),
                start_offset: config.solar_start_offset(),
                end_offset: config.solar_end_offset(),
            },
        }
    }

    pub fn status_at(&self, now: DateTime<Tz>) -> EngineResult<DayStatus> {
        let state = match self.rules.shabbat_window(now)? {
            Some(window) if window.active => DayState {
                kind: DayKind::Shabbat,
                label: Some(DayKind::Shabbat.display_name().to_string()),
                rest_period: true,
                boundary: Some(CalendarEvent::synthetic_boundary(
                    "Shabbat Ends",
                    window.end,
                    false,
                )),
            },
            Some(window) if now < window.start => DayState::weekday().with_boundary(Some(
                CalendarEvent::synthetic_boundary("Shabbat Starts", window.start, true),
            )),
            _ => DayState::weekday(),
        };

        Ok(DayStatus {
            now,
            state,
            source: StatusSource::Solar,
        })
    }
}

impl DayStateProvider for SolarProvider {
    async fn day_status(&self, now: DateTime<Tz>, _real_now: DateTime<Utc>) -> EngineResult<DayStatus> {
        self.status_at(now)
    }

    fn name(&self) -> &'static str {
        "solar"
    }
}
