//! Calendar events: raw feed items and their classified form.
//!
//! Classification is a pure function. It resolves the item's date string to
//! an instant in the clock's timezone and derives the semantic flags from the
//! category tag through a `CategoryMap`.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::common::constants::{DATE_ONLY_HOUR, DATE_ONLY_MINUTE, DATE_ONLY_SECOND};
use crate::error::{EngineError, EngineResult};

/// One item as delivered by the calendar feed.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawEvent {
    pub title: String,
    /// Either a bare `YYYY-MM-DD` or a full timestamp.
    pub date: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub yomtov: bool,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub hebrew: Option<String>,
}

impl RawEvent {
    pub fn new(title: &str, category: &str, date: &str) -> Self {
        Self {
            title: title.to_string(),
            date: date.to_string(),
            category: category.to_string(),
            yomtov: false,
            memo: None,
            hebrew: None,
        }
    }

    pub fn yom_tov(mut self) -> Self {
        self.yomtov = true;
        self
    }
}

/// Category tags recognized for each flag, compared by exact equality.
///
/// The Shabbat flag is a list because the weekly-portion tag has changed
/// name across feed versions ("shabbat", later "parashat").
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMap {
    pub holiday: Vec<String>,
    pub shabbat: Vec<String>,
    pub candles: Vec<String>,
    pub havdalah: Vec<String>,
}

impl Default for CategoryMap {
    fn default() -> Self {
        use crate::common::constants::*;
        let owned = |tags: &[&str]| tags.iter().map(|s| s.to_string()).collect();
        Self {
            holiday: owned(DEFAULT_HOLIDAY_CATEGORIES),
            shabbat: owned(DEFAULT_SHABBAT_CATEGORIES),
            candles: owned(DEFAULT_CANDLE_CATEGORIES),
            havdalah: owned(DEFAULT_HAVDALAH_CATEGORIES),
        }
    }
}

impl CategoryMap {
    /// Flags for a category tag; unknown tags map to all-false.
    pub fn flags_for(&self, category: &str, yom_tov: bool) -> EventFlags {
        let has = |tags: &[String]| tags.iter().any(|tag| tag == category);
        EventFlags {
            holiday: has(&self.holiday),
            shabbat: has(&self.shabbat),
            yom_tov,
            candle_lighting: has(&self.candles),
            havdalah: has(&self.havdalah),
        }
    }
}

/// Semantic flags derived once at classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFlags {
    pub holiday: bool,
    pub shabbat: bool,
    pub yom_tov: bool,
    pub candle_lighting: bool,
    pub havdalah: bool,
}

/// A classified calendar event. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    title: String,
    yom_tov_flag: bool,
    instant: DateTime<Tz>,
    has_time: bool,
    flags: EventFlags,
}

impl CalendarEvent {
    /// Classify a raw feed item.
    pub fn classify(raw: &RawEvent, categories: &CategoryMap, tz: Tz) -> EngineResult<Self> {
        let (instant, has_time) =
            parse_event_date(&raw.date, tz).ok_or_else(|| EngineError::MalformedEvent {
                title: raw.title.clone(),
                date: raw.date.clone(),
            })?;

        Ok(Self {
            title: raw.title.clone(),
            yom_tov_flag: raw.yomtov,
            instant,
            has_time,
            flags: categories.flags_for(&raw.category, raw.yomtov),
        })
    }

    /// Build a boundary event that did not come from the feed (sunset fallback).
    pub fn synthetic_boundary(title: &str, instant: DateTime<Tz>, candle_lighting: bool) -> Self {
        Self {
            title: title.to_string(),
            yom_tov_flag: false,
            instant,
            has_time: true,
            flags: EventFlags {
                candle_lighting,
                havdalah: !candle_lighting,
                ..EventFlags::default()
            },
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn yom_tov_flag(&self) -> bool {
        self.yom_tov_flag
    }

    pub fn instant(&self) -> DateTime<Tz> {
        self.instant
    }

    /// False when the feed gave a bare date.
    pub fn has_time(&self) -> bool {
        self.has_time
    }

    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    pub fn is_holiday(&self) -> bool {
        self.flags.holiday
    }

    pub fn is_shabbat(&self) -> bool {
        self.flags.shabbat
    }

    pub fn is_yom_tov(&self) -> bool {
        self.flags.yom_tov
    }

    pub fn is_candle_lighting(&self) -> bool {
        self.flags.candle_lighting
    }

    pub fn is_havdalah(&self) -> bool {
        self.flags.havdalah
    }

    /// Calendar date of the instant in its own timezone.
    pub fn date(&self) -> NaiveDate {
        self.instant.date_naive()
    }
}

/// Resolve a feed date string to an instant in `tz`.
///
/// Returns the instant and whether the string carried a time. Accepted forms:
/// - RFC 3339 (`2024-06-21T20:31:00-04:00`): the instant is kept as given
/// - local timestamp (`2024-06-21T20:31:00`, `2024-06-21 20:31`): read in `tz`
/// - bare date (`2024-06-21`): 00:00:01 in `tz`
pub fn parse_event_date(date: &str, tz: Tz) -> Option<(DateTime<Tz>, bool)> {
    let date = date.trim();
    let has_time = date.contains('T') || date.contains(':');

    if !has_time {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        let time = NaiveTime::from_hms_opt(DATE_ONLY_HOUR, DATE_ONLY_MINUTE, DATE_ONLY_SECOND)?;
        return local_instant(tz, day.and_time(time)).map(|instant| (instant, false));
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(date) {
        return Some((instant.with_timezone(&tz), true));
    }

    const LOCAL_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(date, format).ok())
        .and_then(|naive| local_instant(tz, naive))
        .map(|instant| (instant, true))
}

/// Map a wall time to an instant, taking the earlier reading across a DST fold.
///
/// A wall time skipped by a forward transition is read with the offset in
/// force before the gap, which lands it just past the gap on the same date
/// (00:00:01 in a midnight gap becomes 01:00:01).
fn local_instant(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(instant) => Some(instant),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let before = naive.checked_sub_signed(TimeDelta::hours(GAP_LOOKBACK_HOURS))?;
            let offset = tz.from_local_datetime(&before).earliest()?.offset().fix();
            let utc = naive
                .checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))?;
            Some(tz.from_utc_datetime(&utc))
        }
    }
}

/// Far enough back to step over any real DST gap.
const GAP_LOOKBACK_HOURS: i64 = 6;
