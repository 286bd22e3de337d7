//! # shabbat-clock
//!
//! Library behind the `shabbat-clock` binary: a wall clock that shows the
//! time, the date or a Shabbat/Yom Tov greeting, and the next candle lighting
//! or havdalah.
//!
//! ## Architecture
//!
//! - **Calendar**: `calendar` fetches a month of events from the Hebcal feed,
//!   classifies them and serves per-day slices from two TTL caches
//! - **Engine**: `engine` resolves the next boundary, classifies the day and
//!   falls back to sunset-only rules (`geo`) when the feed is down
//! - **Display**: `display` turns a day status into clock face text
//! - **Driver**: `driver` ticks once a second and draws the face
//! - **Infrastructure**: configuration, logging, signals and the time source

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod common;

pub mod args;
pub mod calendar;
pub mod config;
pub mod display;
pub mod driver;
pub mod engine;
pub mod error;
pub mod geo;
pub mod signals;
pub mod time_source;

pub use engine::{DayKind, DayState, DayStatus, Engine};
pub use error::{EngineError, EngineResult};
