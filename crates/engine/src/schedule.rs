//! Candle-boundary alignment.
//!
//! The upstream indicator only changes once per closed candle, so ticks are
//! aligned to exact multiples of the timeframe in UTC epoch time (for a
//! 5-minute timeframe: :00, :05, :10, ...). Timeframes that do not map to a
//! fixed second count (e.g. "1day") fall back to a fixed polling interval.

/// Seconds per candle for a TwelveData-style interval string.
///
/// `"5min"` / `"5m"` → 300, `"2h"` → 7200. Returns `None` for anything else,
/// including daily and malformed intervals.
pub fn interval_to_seconds(interval: &str) -> Option<u64> {
    let s = interval.trim().to_ascii_lowercase();
    let (digits, unit_seconds) = if let Some(d) = s.strip_suffix("min") {
        (d, 60)
    } else if let Some(d) = s.strip_suffix('m') {
        (d, 60)
    } else if let Some(d) = s.strip_suffix('h') {
        (d, 3600)
    } else {
        return None;
    };
    digits
        .parse::<u64>()
        .ok()
        .filter(|&n| n > 0)
        .map(|n| n * unit_seconds)
}

/// Seconds to sleep until the next exact multiple of `step` after `now`
/// (UTC epoch seconds). Always at least 1, so the loop makes forward
/// progress even when called exactly on a boundary.
pub fn seconds_until_next_boundary(step: u64, now: f64) -> u64 {
    let next = ((now / step as f64).floor() as u64 + 1) * step;
    let delta = (next as f64 - now).round() as i64;
    delta.max(1) as u64
}

/// Current UTC epoch time with sub-second precision.
pub fn epoch_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_suffix_parses() {
        assert_eq!(interval_to_seconds("1min"), Some(60));
        assert_eq!(interval_to_seconds("15min"), Some(900));
        assert_eq!(interval_to_seconds("45min"), Some(2700));
    }

    #[test]
    fn short_minute_suffix_parses() {
        assert_eq!(interval_to_seconds("5m"), Some(300));
    }

    #[test]
    fn hours_suffix_parses() {
        assert_eq!(interval_to_seconds("1h"), Some(3600));
        assert_eq!(interval_to_seconds("2h"), Some(7200));
    }

    #[test]
    fn unalignable_intervals_return_none() {
        assert_eq!(interval_to_seconds("1day"), None);
        assert_eq!(interval_to_seconds("1week"), None);
        assert_eq!(interval_to_seconds("min"), None);
        assert_eq!(interval_to_seconds("0min"), None);
        assert_eq!(interval_to_seconds("garbage"), None);
        assert_eq!(interval_to_seconds(""), None);
    }

    #[test]
    fn interval_is_case_insensitive_and_trimmed() {
        assert_eq!(interval_to_seconds(" 5MIN "), Some(300));
        assert_eq!(interval_to_seconds("2H"), Some(7200));
    }

    #[test]
    fn boundary_offset_is_remainder_to_next_multiple() {
        // T mod 300 = 47 → wake in 253s
        assert_eq!(seconds_until_next_boundary(300, 1_700_000_147.0), 253);
    }

    #[test]
    fn boundary_at_exact_multiple_sleeps_full_step() {
        assert_eq!(seconds_until_next_boundary(300, 1_700_000_100.0), 300);
    }

    #[test]
    fn boundary_never_sleeps_less_than_one_second() {
        // 0.4s before the boundary rounds down to 0, clamped to 1
        assert_eq!(seconds_until_next_boundary(60, 119.6), 1);
    }
}
