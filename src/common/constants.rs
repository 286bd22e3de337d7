//! Application-wide constants and compiled defaults.
//!
//! Every configurable value has its default here, next to the bounds the
//! validation module enforces.

// # Location (Vaughan, Ontario)

pub const DEFAULT_LATITUDE: f64 = 43.8563;
pub const DEFAULT_LONGITUDE: f64 = -79.5085;
pub const DEFAULT_TIMEZONE: &str = "America/Toronto";

// # Calendar feed

pub const DEFAULT_FEED_URL: &str = "https://www.hebcal.com/hebcal";
pub const DEFAULT_FEED_TIMEOUT: u64 = 10; // seconds
pub const MINIMUM_FEED_TIMEOUT: u64 = 1;
pub const MAXIMUM_FEED_TIMEOUT: u64 = 120;

/// Minutes before sunset the feed reports candle lighting.
pub const DEFAULT_CANDLE_LIGHTING_MINUTES: u32 = 18;
/// Minutes after sunset the feed reports havdalah.
pub const DEFAULT_HAVDALAH_MINUTES: u32 = 42;
pub const MAXIMUM_OFFSET_MINUTES: u32 = 120;

// # Caches

pub const DEFAULT_EVENTS_CACHE_TTL: u64 = 5 * 60; // seconds
pub const DEFAULT_DAY_CACHE_TTL: u64 = 30; // seconds
pub const MINIMUM_EVENTS_CACHE_TTL: u64 = 1;
pub const MAXIMUM_CACHE_TTL: u64 = 24 * 60 * 60;

// # Category tags

pub const DEFAULT_HOLIDAY_CATEGORIES: &[&str] = &["holiday"];
/// Both names have been observed for the weekly portion across feed versions.
pub const DEFAULT_SHABBAT_CATEGORIES: &[&str] = &["parashat", "shabbat"];
pub const DEFAULT_CANDLE_CATEGORIES: &[&str] = &["candles"];
pub const DEFAULT_HAVDALAH_CATEGORIES: &[&str] = &["havdalah"];

// # Solar fallback window

/// Shabbat starts this many minutes before Friday sunset.
pub const DEFAULT_SOLAR_START_OFFSET: u32 = 18;
/// Shabbat ends this many minutes after Saturday sunset.
pub const DEFAULT_SOLAR_END_OFFSET: u32 = 40;

// # Clock driver

/// Tick period of the clock driver in milliseconds.
pub const TICK_INTERVAL_MS: u64 = 1000;

/// Largest clock offset accepted on the command line, in either direction.
pub const MAXIMUM_CLOCK_OFFSET_MINUTES: i64 = 100 * 366 * 24 * 60;
pub const MILLIS_PER_MINUTE: i64 = 60_000;

/// Time component given to events that arrive as a bare date.
///
/// One second past midnight, so a date-only event never reads as an event
/// scheduled exactly at the start of the day.
pub const DATE_ONLY_HOUR: u32 = 0;
pub const DATE_ONLY_MINUTE: u32 = 0;
pub const DATE_ONLY_SECOND: u32 = 1;

// # Exit codes

pub const EXIT_FAILURE: i32 = 1;
