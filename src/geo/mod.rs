//! Solar geometry for the sunset-only fallback.
//!
//! ## Module Structure
//!
//! - [`solar`]: sunrise/sunset via the `sunrise` crate and the Friday/Saturday
//!   Shabbat window derived from them

pub mod solar;

pub use solar::{ShabbatWindow, SolarRules, SunTimes, sun_times};
