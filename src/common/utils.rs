//! Small formatting helpers shared by the renderer, the driver and the logs.

use chrono::{DateTime, TimeZone, Timelike};
use std::path::Path;

/// Format an instant as a 12-hour wall time, e.g. `8:31 PM`.
pub fn format_time<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    let (is_pm, hour) = instant.hour12();
    let meridiem = if is_pm { "PM" } else { "AM" };
    format!("{hour}:{:02} {meridiem}", instant.minute())
}

/// Format a signed millisecond offset as `+1h 30m`, `-45m` or `+0m`.
pub fn format_offset(offset_ms: i64) -> String {
    let sign = if offset_ms < 0 { '-' } else { '+' };
    let total_minutes = offset_ms.unsigned_abs() / 60_000;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    match (days, hours) {
        (0, 0) => format!("{sign}{minutes}m"),
        (0, _) => format!("{sign}{hours}h {minutes}m"),
        _ => format!("{sign}{days}d {hours}h {minutes}m"),
    }
}

/// Replace the home directory prefix of a path with `~` for log output.
pub fn private_path(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(stripped) => format!("~/{}", stripped.display()),
            Err(_) => path.display().to_string(),
        },
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Toronto;

    #[test]
    fn test_format_time_twelve_hour() {
        let evening = Toronto.with_ymd_and_hms(2024, 6, 21, 20, 31, 0).unwrap();
        assert_eq!(format_time(&evening), "8:31 PM");

        let midnight = Toronto.with_ymd_and_hms(2024, 6, 21, 0, 5, 0).unwrap();
        assert_eq!(format_time(&midnight), "12:05 AM");

        let noon = Toronto.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();
        assert_eq!(format_time(&noon), "12:00 PM");
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(0), "+0m");
        assert_eq!(format_offset(45 * 60_000), "+45m");
        assert_eq!(format_offset(-90 * 60_000), "-1h 30m");
        assert_eq!(format_offset(26 * 3_600_000), "+1d 2h 0m");
    }
}
