//! Remote calendar feed.
//!
//! `CalendarFeed` is the seam between the engine and the network; the engine
//! is generic over it so tests can substitute a scripted feed. `HebcalFeed`
//! talks to the Hebcal REST API (or anything serving the same JSON).

use chrono::{Months, NaiveDate};
use serde::Deserialize;
use std::future::Future;

use super::event::RawEvent;
use crate::config::Config;
use crate::error::{EngineError, EngineResult};

/// Inclusive date range requested from the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FeedWindow {
    /// One month starting on `day`.
    ///
    /// Month arithmetic clamps to the last valid day (Jan 31 → Feb 29).
    pub fn month_from(day: NaiveDate) -> Self {
        let end = day
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        Self { start: day, end }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Source of raw calendar items.
pub trait CalendarFeed: Send + Sync {
    /// Fetch every item inside `window`.
    fn fetch(&self, window: FeedWindow) -> impl Future<Output = EngineResult<Vec<RawEvent>>> + Send;

    /// Short description for logs.
    fn describe(&self) -> String;
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    items: Vec<RawEvent>,
}

/// Decode a feed response body.
pub fn decode_items(body: &str) -> EngineResult<Vec<RawEvent>> {
    serde_json::from_str::<FeedResponse>(body)
        .map(|response| response.items)
        .map_err(|e| EngineError::FeedUnavailable(format!("malformed response: {e}")))
}

/// Hebcal calendar client.
pub struct HebcalFeed {
    client: reqwest::Client,
    url: String,
    latitude: f64,
    longitude: f64,
    tzid: String,
    candle_lighting_minutes: u32,
    havdalah_minutes: u32,
}

impl HebcalFeed {
    pub fn new(config: &Config) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.feed_timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: config.feed_url().to_string(),
            latitude: config.latitude(),
            longitude: config.longitude(),
            tzid: config.timezone().name().to_string(),
            candle_lighting_minutes: config.candle_lighting_minutes(),
            havdalah_minutes: config.havdalah_minutes(),
        })
    }

    /// Query parameters for a window request.
    pub fn query(&self, window: FeedWindow) -> Vec<(&'static str, String)> {
        vec![
            ("v", "1".to_string()),
            ("cfg", "json".to_string()),
            ("start", window.start.format("%Y-%m-%d").to_string()),
            ("end", window.end.format("%Y-%m-%d").to_string()),
            ("maj", "on".to_string()),
            ("min", "on".to_string()),
            ("c", "on".to_string()),
            ("s", "on".to_string()),
            ("geo", "pos".to_string()),
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("tzid", self.tzid.clone()),
            ("b", self.candle_lighting_minutes.to_string()),
            ("m", self.havdalah_minutes.to_string()),
        ]
    }
}

impl CalendarFeed for HebcalFeed {
    fn fetch(&self, window: FeedWindow) -> impl Future<Output = EngineResult<Vec<RawEvent>>> + Send {
        let request = self.client.get(&self.url).query(&self.query(window));

        async move {
            log_debug!(
                "Requesting calendar events {} to {}",
                window.start,
                window.end
            );

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(EngineError::FeedUnavailable(format!(
                    "HTTP {status} from calendar feed"
                )));
            }

            let body = response.text().await?;
            decode_items(&body)
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_window() {
        let window = FeedWindow::month_from(ymd(2024, 6, 21));
        assert_eq!(window.end, ymd(2024, 7, 21));
        assert!(window.contains(ymd(2024, 6, 21)));
        assert!(window.contains(ymd(2024, 7, 21)));
        assert!(!window.contains(ymd(2024, 6, 20)));
        assert!(!window.contains(ymd(2024, 7, 22)));
    }

    #[test]
    fn test_month_window_clamps_short_month() {
        let window = FeedWindow::month_from(ymd(2024, 1, 31));
        assert_eq!(window.end, ymd(2024, 2, 29));
    }

    #[test]
    fn test_query_parameters() {
        let feed = HebcalFeed::new(&Config::default()).unwrap();
        let query = feed.query(FeedWindow::month_from(ymd(2024, 6, 21)));
        let get = |key: &str| {
            query
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("cfg"), Some("json"));
        assert_eq!(get("start"), Some("2024-06-21"));
        assert_eq!(get("end"), Some("2024-07-21"));
        assert_eq!(get("c"), Some("on"));
        assert_eq!(get("s"), Some("on"));
        assert_eq!(get("b"), Some("18"));
        assert_eq!(get("m"), Some("42"));
        assert_eq!(get("latitude"), Some("43.8563"));
        assert_eq!(get("longitude"), Some("-79.5085"));
        assert_eq!(get("tzid"), Some("America/Toronto"));
    }

    #[test]
    fn test_decode_items() {
        let body = r#"{
            "title": "Hebcal Vaughan June 2024",
            "items": [
                {"title": "Candle lighting: 8:31pm", "date": "2024-06-21T20:31:00-04:00", "category": "candles"},
                {"title": "Parashat Balak", "date": "2024-06-22", "category": "parashat", "hebrew": "פרשת בלק"},
                {"title": "Havdalah: 9:50pm", "date": "2024-06-22T21:50:00-04:00", "category": "havdalah"}
            ]
        }"#;
        let items = decode_items(body).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].category, "parashat");
        assert_eq!(items[1].hebrew.as_deref(), Some("פרשת בלק"));
    }

    #[test]
    fn test_decode_rejects_malformed_body() {
        assert!(matches!(
            decode_items("<html>502</html>"),
            Err(EngineError::FeedUnavailable(_))
        ));
        assert!(matches!(
            decode_items(r#"{"error": "bad tzid"}"#),
            Err(EngineError::FeedUnavailable(_))
        ));
    }
}
