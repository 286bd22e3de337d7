//! Configuration system for shabbat-clock.
//!
//! Settings live in `shabbat-clock.toml`, searched in:
//! 1. the directory given with `--config DIR`
//! 2. **XDG_CONFIG_HOME**/shabbat-clock/shabbat-clock.toml
//!
//! A missing file is not an error: every field has a compiled default and the
//! clock runs for Vaughan, Ontario out of the box.
//!
//! ```toml
//! #[Location]
//! latitude = 43.8563            # Geographic latitude
//! longitude = -79.5085          # Geographic longitude
//! timezone = "America/Toronto"  # IANA timezone of the location
//!
//! #[Calendar feed]
//! feed_url = "https://www.hebcal.com/hebcal"
//! feed_timeout = 10             # Request timeout in seconds (1-120)
//! candle_lighting_minutes = 18  # Minutes before sunset (0-120)
//! havdalah_minutes = 42         # Minutes after sunset (0-120)
//!
//! #[Caches]
//! events_cache_ttl = 300        # Month window freshness in seconds
//! day_cache_ttl = 30            # Per-day filter freshness in seconds (0 = off)
//!
//! #[Categories]
//! shabbat_categories = ["parashat", "shabbat"]
//! holiday_categories = ["holiday"]
//! candle_categories = ["candles"]
//! havdalah_categories = ["havdalah"]
//!
//! #[Display]
//! rest_period_authority = "calendar"  # "calendar" or "boundary"
//!
//! #[Sunset fallback]
//! solar_start_offset = 18       # Minutes before Friday sunset
//! solar_end_offset = 40         # Minutes after Saturday sunset
//! ```

pub mod loading;
pub mod validation;

use chrono::TimeDelta;
use serde::Deserialize;
use std::path::PathBuf;

use crate::calendar::CategoryMap;
use crate::common::constants::*;

// Re-export public API
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};

/// Which computation decides the rest-period highlight.
///
/// The boundary resolver and the state classifier look at the same day from
/// different angles and can disagree right after havdalah: the boundary has
/// rolled over to Sunday while Saturday's events still carry the Shabbat flag.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RestPeriodAuthority {
    /// The state classifier decides (Yom Tov or Shabbat events on the day).
    #[default]
    Calendar,
    /// The boundary resolver decides: a rest period is in progress when the
    /// resolved day has a havdalah and no candle lighting.
    Boundary,
}

/// Configuration as read from `shabbat-clock.toml`.
///
/// All fields are optional; the accessor methods apply the defaults.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,

    pub feed_url: Option<String>,
    pub feed_timeout: Option<u64>,
    pub candle_lighting_minutes: Option<u32>,
    pub havdalah_minutes: Option<u32>,

    pub events_cache_ttl: Option<u64>,
    pub day_cache_ttl: Option<u64>,

    pub shabbat_categories: Option<Vec<String>>,
    pub holiday_categories: Option<Vec<String>>,
    pub candle_categories: Option<Vec<String>>,
    pub havdalah_categories: Option<Vec<String>>,

    pub rest_period_authority: Option<RestPeriodAuthority>,

    pub solar_start_offset: Option<u32>,
    pub solar_end_offset: Option<u32>,
}

impl Config {
    /// Load configuration using automatic path detection.
    pub fn load() -> anyhow::Result<Self> {
        load()
    }

    /// Get the configuration file path.
    pub fn get_config_path() -> anyhow::Result<PathBuf> {
        get_config_path()
    }

    pub fn latitude(&self) -> f64 {
        self.latitude.unwrap_or(DEFAULT_LATITUDE)
    }

    pub fn longitude(&self) -> f64 {
        self.longitude.unwrap_or(DEFAULT_LONGITUDE)
    }

    /// The configured timezone.
    ///
    /// Validation rejects unknown names, so a fallback to the default only
    /// happens for configs that skipped validation.
    pub fn timezone(&self) -> chrono_tz::Tz {
        self.timezone
            .as_deref()
            .and_then(|name| name.parse().ok())
            .or_else(|| DEFAULT_TIMEZONE.parse().ok())
            .unwrap_or(chrono_tz::UTC)
    }

    pub fn feed_url(&self) -> &str {
        self.feed_url.as_deref().unwrap_or(DEFAULT_FEED_URL)
    }

    pub fn feed_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.feed_timeout.unwrap_or(DEFAULT_FEED_TIMEOUT))
    }

    pub fn candle_lighting_minutes(&self) -> u32 {
        self.candle_lighting_minutes
            .unwrap_or(DEFAULT_CANDLE_LIGHTING_MINUTES)
    }

    pub fn havdalah_minutes(&self) -> u32 {
        self.havdalah_minutes.unwrap_or(DEFAULT_HAVDALAH_MINUTES)
    }

    pub fn events_cache_ttl(&self) -> TimeDelta {
        TimeDelta::seconds(self.events_cache_ttl.unwrap_or(DEFAULT_EVENTS_CACHE_TTL) as i64)
    }

    pub fn day_cache_ttl(&self) -> TimeDelta {
        TimeDelta::seconds(self.day_cache_ttl.unwrap_or(DEFAULT_DAY_CACHE_TTL) as i64)
    }

    /// Category tags mapped to event flags.
    pub fn category_map(&self) -> CategoryMap {
        fn or_default(tags: &Option<Vec<String>>, defaults: &[&str]) -> Vec<String> {
            tags.clone()
                .unwrap_or_else(|| defaults.iter().map(|s| s.to_string()).collect())
        }

        CategoryMap {
            holiday: or_default(&self.holiday_categories, DEFAULT_HOLIDAY_CATEGORIES),
            shabbat: or_default(&self.shabbat_categories, DEFAULT_SHABBAT_CATEGORIES),
            candles: or_default(&self.candle_categories, DEFAULT_CANDLE_CATEGORIES),
            havdalah: or_default(&self.havdalah_categories, DEFAULT_HAVDALAH_CATEGORIES),
        }
    }

    pub fn rest_period_authority(&self) -> RestPeriodAuthority {
        self.rest_period_authority.unwrap_or_default()
    }

    pub fn solar_start_offset(&self) -> TimeDelta {
        TimeDelta::minutes(self.solar_start_offset.unwrap_or(DEFAULT_SOLAR_START_OFFSET) as i64)
    }

    pub fn solar_end_offset(&self) -> TimeDelta {
        TimeDelta::minutes(self.solar_end_offset.unwrap_or(DEFAULT_SOLAR_END_OFFSET) as i64)
    }

    /// Log the effective configuration.
    pub fn log_config(&self, resolved_path: Option<&std::path::Path>) {
        log_block_start!("Loaded configuration");
        match resolved_path {
            Some(path) => log_indented!("Source: {}", crate::common::utils::private_path(path)),
            None => log_indented!("Source: built-in defaults"),
        }
        log_indented!(
            "Location: {:.4}°, {:.4}° ({})",
            self.latitude(),
            self.longitude(),
            self.timezone()
        );
        log_indented!("Calendar feed: {}", self.feed_url());
        log_indented!(
            "Candle lighting: {} min before sunset, havdalah: {} min after",
            self.candle_lighting_minutes(),
            self.havdalah_minutes()
        );
        log_indented!(
            "Cache: events {}s, day {}s",
            self.events_cache_ttl().num_seconds(),
            self.day_cache_ttl().num_seconds()
        );
        log_indented!(
            "Rest period authority: {:?}",
            self.rest_period_authority()
        );
    }
}
