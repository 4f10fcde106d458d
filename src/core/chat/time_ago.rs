//=========================================================================
// Relative Time Labels
//=========================================================================
//
// Compact "how long ago" labels for chat lines.
//
//   age <    10s → "now"
//   age <    60s → "{s}s ago"
//   age <  3600s → "{m}m ago"
//   age < 86400s → "{h}h ago"
//   otherwise    → "{d}d ago"
//
// Units are floored. Timestamps in the future read as "now".
//
//=========================================================================

//=== External Dependencies ===============================================

use chrono::{DateTime, Utc};

//=== Thresholds ==========================================================

const NOW_SECS: i64 = 10;
const MINUTE_SECS: i64 = 60;
const HOUR_SECS: i64 = 60 * MINUTE_SECS;
const DAY_SECS: i64 = 24 * HOUR_SECS;

//=== Public API ==========================================================

/// Label for something created at `created_at`, seen at `now`.
pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    age_label((now - created_at).num_seconds())
}

/// Label for an age given in whole seconds.
pub fn age_label(age_secs: i64) -> String {
    match age_secs {
        age if age < NOW_SECS => "now".to_string(),
        age if age < MINUTE_SECS => format!("{}s ago", age),
        age if age < HOUR_SECS => format!("{}m ago", age / MINUTE_SECS),
        age if age < DAY_SECS => format!("{}h ago", age / HOUR_SECS),
        age => format!("{}d ago", age / DAY_SECS),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn aged(secs: i64) -> String {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        time_ago(created, created + Duration::seconds(secs))
    }

    #[test]
    fn exact_thresholds() {
        assert_eq!(aged(0), "now");
        assert_eq!(aged(9), "now");
        assert_eq!(aged(10), "10s ago");
        assert_eq!(aged(59), "59s ago");
        assert_eq!(aged(60), "1m ago");
        assert_eq!(aged(3599), "59m ago");
        assert_eq!(aged(3600), "1h ago");
        assert_eq!(aged(86_399), "23h ago");
        assert_eq!(aged(86_400), "1d ago");
        assert_eq!(aged(3 * 86_400 + 5), "3d ago");
    }

    #[test]
    fn units_are_floored() {
        assert_eq!(aged(119), "1m ago");
        assert_eq!(aged(7199), "1h ago");
    }

    #[test]
    fn sub_second_remainder_is_ignored() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let now = created + Duration::milliseconds(9_999);
        assert_eq!(time_ago(created, now), "now");
    }

    #[test]
    fn future_timestamps_read_as_now() {
        assert_eq!(aged(-30), "now");
    }
}
