//! Clock face text.
//!
//! `ClockFace` is what the driver puts on screen for one tick: the 12-hour
//! time, an AM/PM indicator, a date line (or greeting), an optional boundary
//! line and the rest-period highlight.

use chrono::{Datelike, Timelike, Weekday};
use std::fmt;

use crate::calendar::CalendarEvent;
use crate::common::utils::format_time;
use crate::engine::{DayKind, DayStatus, StatusSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meridiem::Am => f.write_str("AM"),
            Meridiem::Pm => f.write_str("PM"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockFace {
    /// `h:mm:ss`, 12-hour
    pub time: String,
    pub meridiem: Meridiem,
    pub date_line: String,
    pub info_line: Option<String>,
    /// Rest-period styling.
    pub highlighted: bool,
    /// Data is cached past its freshness window, or derived from sunset only.
    pub degraded: bool,
}

impl ClockFace {
    pub fn compose(status: &DayStatus) -> Self {
        let now = status.now;
        let (is_pm, hour) = now.hour12();
        let state = &status.state;

        let date_line = match (state.kind, state.label.as_deref()) {
            (DayKind::Shabbat, _) => "Shabbat Shalom".to_string(),
            (DayKind::YomTov, Some(label)) => format!("Chag Sameach · {label}"),
            (DayKind::YomTov, None) => "Chag Sameach".to_string(),
            (DayKind::Holiday, Some(label)) => format!("{} · {label}", long_date(status)),
            _ => long_date(status),
        };

        Self {
            time: format!("{hour}:{:02}:{:02}", now.minute(), now.second()),
            meridiem: if is_pm { Meridiem::Pm } else { Meridiem::Am },
            date_line,
            info_line: state.boundary.as_ref().map(boundary_line),
            highlighted: state.rest_period,
            degraded: !matches!(status.source, StatusSource::Calendar { stale: false }),
        }
    }

    /// Same face apart from the seconds ticking.
    pub fn same_content(&self, other: &ClockFace) -> bool {
        self.date_line == other.date_line
            && self.info_line == other.info_line
            && self.highlighted == other.highlighted
            && self.degraded == other.degraded
    }
}

impl fmt::Display for ClockFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}  {}", self.time, self.meridiem, self.date_line)?;
        if let Some(info) = &self.info_line {
            write!(f, "  |  {info}")?;
        }
        if self.highlighted {
            f.write_str("  [rest]")?;
        }
        Ok(())
    }
}

/// `Friday, June 21, 2024`
fn long_date(status: &DayStatus) -> String {
    status.now.format("%A, %B %-d, %Y").to_string()
}

/// Boundary text, naming Shabbat when the boundary falls on a Friday
/// (candle lighting) or Saturday (havdalah).
fn boundary_line(event: &CalendarEvent) -> String {
    let weekday = event.instant().weekday();
    let label = if event.is_candle_lighting() {
        if weekday == Weekday::Fri {
            "Shabbat Starts"
        } else {
            "Candle Lighting"
        }
    } else if weekday == Weekday::Sat {
        "Shabbat Ends"
    } else {
        "Havdalah"
    };
    format!("{label}: {}", format_time(&event.instant()))
}
