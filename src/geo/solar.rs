//! Sunrise/sunset and the sunset-derived Shabbat window.
//!
//! Used when calendar data is unavailable. The window only knows about the
//! weekly Shabbat; holidays need the calendar feed.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc, Weekday};
use chrono_tz::Tz;
use sunrise::{Coordinates, SolarDay, SolarEvent};

use crate::error::{EngineError, EngineResult};

/// Sunrise and sunset of one date at one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunTimes {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// Compute sunrise and sunset for `date` at the given coordinates.
pub fn sun_times(date: NaiveDate, latitude: f64, longitude: f64) -> EngineResult<SunTimes> {
    let coord = Coordinates::new(latitude, longitude).ok_or(EngineError::InvalidCoordinates {
        lat: latitude,
        lon: longitude,
    })?;
    let solar_day = SolarDay::new(coord, date);

    Ok(SunTimes {
        sunrise: solar_day.event_time(SolarEvent::Sunrise),
        sunset: solar_day.event_time(SolarEvent::Sunset),
    })
}

/// Shabbat as bounded by sunset on Friday and Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShabbatWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    /// Whether `now` was inside the window when it was computed.
    pub active: bool,
}

/// Location and offsets for the sunset-only calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarRules {
    pub latitude: f64,
    pub longitude: f64,
    /// Subtracted from Friday's sunset.
    pub start_offset: TimeDelta,
    /// Added to Saturday's sunset.
    pub end_offset: TimeDelta,
}

impl SolarRules {
    /// The Shabbat window around `now`, or `None` from Sunday to Thursday.
    ///
    /// - Friday: starts at today's sunset minus the start offset, ends at
    ///   tomorrow's sunset plus the end offset; active once started
    /// - Saturday: started at yesterday's sunset minus the start offset, ends
    ///   at today's sunset plus the end offset; active until it ends
    pub fn shabbat_window(&self, now: DateTime<Tz>) -> EngineResult<Option<ShabbatWindow>> {
        let tz = now.timezone();
        let today = now.date_naive();

        let (friday, saturday) = match today.weekday() {
            Weekday::Fri => (today, next_day(today)?),
            Weekday::Sat => (previous_day(today)?, today),
            _ => return Ok(None),
        };

        let start = self.sunset(friday)?.with_timezone(&tz) - self.start_offset;
        let end = self.sunset(saturday)?.with_timezone(&tz) + self.end_offset;
        let active = if today.weekday() == Weekday::Fri {
            now >= start
        } else {
            now < end
        };

        log_debug!(
            "Solar Shabbat window {} to {} (active: {})",
            start.format("%a %H:%M"),
            end.format("%a %H:%M"),
            active
        );

        Ok(Some(ShabbatWindow { start, end, active }))
    }

    fn sunset(&self, date: NaiveDate) -> EngineResult<DateTime<Utc>> {
        sun_times(date, self.latitude, self.longitude).map(|times| times.sunset)
    }
}

fn next_day(date: NaiveDate) -> EngineResult<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| EngineError::AmbiguousLocalTime(format!("no day after {date}")))
}

fn previous_day(date: NaiveDate) -> EngineResult<NaiveDate> {
    date.pred_opt()
        .ok_or_else(|| EngineError::AmbiguousLocalTime(format!("no day before {date}")))
}
