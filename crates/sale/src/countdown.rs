//! Countdown formatting.
//!
//! Countdowns are always derived from two absolute instants, never by
//! decrementing a stored counter, so re-rendering once per second cannot
//! drift.

use chrono::{DateTime, Utc};

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

/// Whole days, hours, minutes and seconds of a positive span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountdownParts {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl CountdownParts {
    /// Splits `total_secs` into units, each taken modulo its parent unit.
    #[must_use]
    pub fn from_secs(total_secs: i64) -> Self {
        let total = total_secs.max(0);
        Self {
            days: total / SECS_PER_DAY,
            hours: (total / SECS_PER_HOUR) % 24,
            minutes: (total / SECS_PER_MINUTE) % 60,
            seconds: total % 60,
        }
    }

    /// Renders non-zero units largest first, space separated.
    #[must_use]
    pub fn render(&self) -> String {
        let units = [
            (self.days, 'd'),
            (self.hours, 'h'),
            (self.minutes, 'm'),
            (self.seconds, 's'),
        ];
        units
            .iter()
            .filter(|(value, _)| *value > 0)
            .map(|(value, suffix)| format!("{value}{suffix}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Formats the time left until `target` as seen at `now`.
///
/// Returns an empty string when `target <= now`. Sub-second remainders are
/// floored, so a target less than one second away also renders as `""`.
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use mintsale_core::countdown::format_countdown;
///
/// let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
/// let target = now + Duration::seconds(90_061);
/// assert_eq!(format_countdown(target, now), "1d 1h 1m 1s");
/// assert_eq!(format_countdown(now, now), "");
/// ```
#[must_use]
pub fn format_countdown(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff_ms = target.signed_duration_since(now).num_milliseconds();
    if diff_ms <= 0 {
        return String::new();
    }
    CountdownParts::from_secs(diff_ms / 1000).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 9, 0, 0, 0).unwrap()
    }

    #[test]
    fn one_of_each_unit() {
        let now = base();
        assert_eq!(format_countdown(now + Duration::seconds(90_061), now), "1d 1h 1m 1s");
    }

    #[test]
    fn past_or_equal_target_is_empty() {
        let now = base();
        assert_eq!(format_countdown(now, now), "");
        assert_eq!(format_countdown(now - Duration::seconds(5), now), "");
    }

    #[test]
    fn zero_units_are_omitted_anywhere() {
        let now = base();
        assert_eq!(format_countdown(now + Duration::seconds(86_400 + 5), now), "1d 5s");
        assert_eq!(format_countdown(now + Duration::seconds(3600), now), "1h");
        assert_eq!(format_countdown(now + Duration::seconds(61), now), "1m 1s");
    }

    #[test]
    fn sub_second_remainder_is_floored() {
        let now = base();
        assert_eq!(format_countdown(now + Duration::milliseconds(999), now), "");
        assert_eq!(format_countdown(now + Duration::milliseconds(1999), now), "1s");
    }

    #[test]
    fn ticking_one_second_drops_exactly_one_second() {
        let target = base() + Duration::seconds(125);
        let mut rendered = Vec::new();
        for tick in 0..6 {
            rendered.push(format_countdown(target, base() + Duration::seconds(tick)));
        }
        assert_eq!(rendered, vec!["2m 5s", "2m 4s", "2m 3s", "2m 2s", "2m 1s", "2m"]);
    }

    #[test]
    fn parts_carry_into_parent_units() {
        let parts = CountdownParts::from_secs(2 * 86_400 + 23 * 3600 + 59 * 60 + 59);
        assert_eq!(
            parts,
            CountdownParts {
                days: 2,
                hours: 23,
                minutes: 59,
                seconds: 59
            }
        );
    }
}
