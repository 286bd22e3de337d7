//! Next rest-period boundary.
//!
//! The clock always shows a future boundary: once today's relevant boundary
//! has passed, resolution looks one day ahead.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

use crate::calendar::CalendarEvent;

/// Earliest candle lighting and havdalah of the day they were found on.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub candle_lighting: Option<CalendarEvent>,
    pub havdalah: Option<CalendarEvent>,
    pub effective_day: NaiveDate,
}

impl Boundary {
    /// Pick the earliest boundary of each kind from one day's events.
    ///
    /// Equal instants keep feed order.
    pub fn from_events(effective_day: NaiveDate, events: &[CalendarEvent]) -> Self {
        Self {
            candle_lighting: earliest(events, CalendarEvent::is_candle_lighting),
            havdalah: earliest(events, CalendarEvent::is_havdalah),
            effective_day,
        }
    }

    /// Whether the boundary that matters for this day is already behind `now`.
    ///
    /// Candle lighting decides when present; otherwise havdalah does.
    pub fn has_elapsed(&self, now: DateTime<Tz>) -> bool {
        match (&self.candle_lighting, &self.havdalah) {
            (Some(candles), _) => now >= candles.instant(),
            (None, Some(havdalah)) => now >= havdalah.instant(),
            (None, None) => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candle_lighting.is_none() && self.havdalah.is_none()
    }

    /// The boundary to display: whichever comes first.
    pub fn next(&self) -> Option<&CalendarEvent> {
        match (&self.candle_lighting, &self.havdalah) {
            (Some(candles), Some(havdalah)) if havdalah.instant() < candles.instant() => {
                Some(havdalah)
            }
            (Some(candles), _) => Some(candles),
            (None, havdalah) => havdalah.as_ref(),
        }
    }

    /// True when the day ends a rest period without starting one.
    pub fn ends_rest_period(&self) -> bool {
        self.havdalah.is_some() && self.candle_lighting.is_none()
    }
}

fn earliest(events: &[CalendarEvent], pred: fn(&CalendarEvent) -> bool) -> Option<CalendarEvent> {
    let mut matching: Vec<&CalendarEvent> = events.iter().filter(|e| pred(e)).collect();
    // sort_by_key is stable
    matching.sort_by_key(|e| e.instant());
    matching.first().map(|e| (*e).clone())
}
