//! Calendar feed ingestion: fetching, caching, classification and per-day filtering.
//!
//! ## Module Structure
//!
//! - [`event`]: raw feed items, classified `CalendarEvent`s and the category map
//! - [`feed`]: the `CalendarFeed` seam and the Hebcal HTTP client
//! - [`cache`]: keyed TTL cache with refresh-on-read and stale serving
//! - [`fetcher`]: month-window fetch and the per-day filter, each with its own cache

pub mod cache;
pub mod event;
pub mod feed;
pub mod fetcher;

pub use cache::{Refreshed, StaleReason, TtlCache};
pub use event::{CalendarEvent, CategoryMap, EventFlags, RawEvent, parse_event_date};
pub use feed::{CalendarFeed, FeedWindow, HebcalFeed};
pub use fetcher::{DayEvents, EventFetcher, FeedSnapshot};
