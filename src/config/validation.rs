//! Configuration validation.
//!
//! Rejects values the engine cannot work with: coordinates off the globe,
//! unknown timezones, offsets outside the feed's accepted range, and category
//! tags claimed by two flags at once.

use anyhow::Result;
use std::collections::HashMap;

use super::Config;
use crate::common::constants::*;

/// Validate every field that is set.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if let Some(name) = config.timezone.as_deref()
        && name.parse::<chrono_tz::Tz>().is_err()
    {
        anyhow::bail!("timezone '{}' is not a known IANA timezone name", name);
    }

    if let Some(url) = config.feed_url.as_deref()
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        anyhow::bail!("feed_url must be an http(s) URL (got '{}')", url);
    }

    if let Some(timeout) = config.feed_timeout
        && !(MINIMUM_FEED_TIMEOUT..=MAXIMUM_FEED_TIMEOUT).contains(&timeout)
    {
        anyhow::bail!(
            "feed_timeout ({}s) must be between {} and {} seconds",
            timeout,
            MINIMUM_FEED_TIMEOUT,
            MAXIMUM_FEED_TIMEOUT
        );
    }

    validate_minutes(config.candle_lighting_minutes, "candle_lighting_minutes")?;
    validate_minutes(config.havdalah_minutes, "havdalah_minutes")?;
    validate_minutes(config.solar_start_offset, "solar_start_offset")?;
    validate_minutes(config.solar_end_offset, "solar_end_offset")?;

    if let Some(ttl) = config.events_cache_ttl
        && !(MINIMUM_EVENTS_CACHE_TTL..=MAXIMUM_CACHE_TTL).contains(&ttl)
    {
        anyhow::bail!(
            "events_cache_ttl ({}s) must be between {} and {} seconds",
            ttl,
            MINIMUM_EVENTS_CACHE_TTL,
            MAXIMUM_CACHE_TTL
        );
    }

    // Zero is allowed here: it turns the per-day cache off.
    if let Some(ttl) = config.day_cache_ttl
        && ttl > MAXIMUM_CACHE_TTL
    {
        anyhow::bail!(
            "day_cache_ttl ({}s) must not exceed {} seconds",
            ttl,
            MAXIMUM_CACHE_TTL
        );
    }

    validate_categories(config)?;

    Ok(())
}

fn validate_minutes(value: Option<u32>, field: &str) -> Result<()> {
    if let Some(minutes) = value
        && minutes > MAXIMUM_OFFSET_MINUTES
    {
        anyhow::bail!(
            "{} ({} min) must be between 0 and {} minutes",
            field,
            minutes,
            MAXIMUM_OFFSET_MINUTES
        );
    }
    Ok(())
}

/// Each group needs at least one non-blank tag and no tag may map to two flags.
fn validate_categories(config: &Config) -> Result<()> {
    let map = config.category_map();
    let groups = [
        ("holiday_categories", &map.holiday),
        ("shabbat_categories", &map.shabbat),
        ("candle_categories", &map.candles),
        ("havdalah_categories", &map.havdalah),
    ];

    let mut owners: HashMap<&str, &str> = HashMap::new();
    for (field, tags) in groups {
        if tags.is_empty() {
            anyhow::bail!("{} must list at least one category tag", field);
        }
        for tag in tags.iter() {
            if tag.trim().is_empty() {
                anyhow::bail!("{} contains a blank category tag", field);
            }
            if let Some(previous) = owners.insert(tag.as_str(), field)
                && previous != field
            {
                anyhow::bail!(
                    "category tag '{}' appears in both {} and {}",
                    tag,
                    previous,
                    field
                );
            }
        }
    }

    Ok(())
}
