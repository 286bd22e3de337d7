//! Day-state classification.
//!
//! A day's events are reduced to one `DayKind` by first-match precedence:
//! Yom Tov, then Shabbat, then Holiday, then Weekday. The first event of the
//! winning category in feed order supplies the label.

use std::fmt;

use crate::calendar::CalendarEvent;

/// Classification of a calendar day.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum DayKind {
    /// Major holiday with Shabbat-like rest status
    YomTov,
    /// Weekly rest day
    Shabbat,
    /// Holiday without rest status (minor holidays, fasts, Rosh Chodesh)
    Holiday,
    /// Nothing notable
    Weekday,
}

impl fmt::Display for DayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl DayKind {
    /// Whether the day is a rest period.
    pub fn is_rest_period(&self) -> bool {
        matches!(self, Self::YomTov | Self::Shabbat)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::YomTov => "Yom Tov",
            Self::Shabbat => "Shabbat",
            Self::Holiday => "Holiday",
            Self::Weekday => "Weekday",
        }
    }
}

/// What the clock shows for the current moment.
#[derive(Debug, Clone, PartialEq)]
pub struct DayState {
    pub kind: DayKind,
    /// Title of the event that decided `kind`; `None` on a weekday.
    pub label: Option<String>,
    /// Drives the rest-period styling.
    pub rest_period: bool,
    /// Next candle lighting or havdalah to display.
    pub boundary: Option<CalendarEvent>,
}

impl DayState {
    /// Neutral state shown when nothing is known.
    pub fn weekday() -> Self {
        Self {
            kind: DayKind::Weekday,
            label: None,
            rest_period: false,
            boundary: None,
        }
    }

    pub fn with_boundary(mut self, boundary: Option<CalendarEvent>) -> Self {
        self.boundary = boundary;
        self
    }
}

impl Default for DayState {
    fn default() -> Self {
        Self::weekday()
    }
}

/// Classify a day from its events (feed order).
pub fn classify_events(events: &[CalendarEvent]) -> DayState {
    let first = |pred: fn(&CalendarEvent) -> bool| events.iter().find(|e| pred(e));

    let matched = first(CalendarEvent::is_yom_tov)
        .map(|e| (DayKind::YomTov, e))
        .or_else(|| first(CalendarEvent::is_shabbat).map(|e| (DayKind::Shabbat, e)))
        .or_else(|| first(CalendarEvent::is_holiday).map(|e| (DayKind::Holiday, e)));

    match matched {
        Some((kind, event)) => DayState {
            kind,
            label: Some(event.title().to_string()),
            rest_period: kind.is_rest_period(),
            boundary: None,
        },
        None => DayState::weekday(),
    }
}
