//! Traffic-status classification and wait-time estimation.
//!
//! Both operations are pure: status is always a function of the current user
//! count, and the wait estimate is always a function of (position, status).

use serde::{Deserialize, Serialize};

pub const MEDIUM_THRESHOLD: u32 = 500;
pub const HIGH_THRESHOLD: u32 = 1000;
pub const CRITICAL_THRESHOLD: u32 = 1500;

/// Coarse classification of current load. Ordering follows severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficStatus {
    Low,
    Medium,
    High,
    Critical,
}

impl TrafficStatus {
    /// Seconds of wait attributed to each queue position at this load level.
    pub fn seconds_per_position(self) -> u64 {
        match self {
            TrafficStatus::Low => 5,
            TrafficStatus::Medium => 15,
            TrafficStatus::High => 30,
            TrafficStatus::Critical => 60,
        }
    }
}

/// Map a user count to a traffic status. Boundary counts belong to the
/// next-higher band.
pub fn classify(user_count: u32) -> TrafficStatus {
    if user_count < MEDIUM_THRESHOLD {
        TrafficStatus::Low
    } else if user_count < HIGH_THRESHOLD {
        TrafficStatus::Medium
    } else if user_count < CRITICAL_THRESHOLD {
        TrafficStatus::High
    } else {
        TrafficStatus::Critical
    }
}

/// Estimated wait in seconds for a queue position at the given load level.
/// `None` and position 0 both mean "no wait".
pub fn estimate_wait_seconds(position: Option<u32>, status: TrafficStatus) -> u64 {
    match position {
        Some(position) => u64::from(position) * status.seconds_per_position(),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_respects_band_boundaries() {
        assert_eq!(classify(0), TrafficStatus::Low);
        assert_eq!(classify(499), TrafficStatus::Low);
        assert_eq!(classify(500), TrafficStatus::Medium);
        assert_eq!(classify(999), TrafficStatus::Medium);
        assert_eq!(classify(1000), TrafficStatus::High);
        assert_eq!(classify(1499), TrafficStatus::High);
        assert_eq!(classify(1500), TrafficStatus::Critical);
        assert_eq!(classify(u32::MAX), TrafficStatus::Critical);
    }

    #[test]
    fn classify_is_monotone_in_severity() {
        let mut previous = classify(0);
        for count in (0..4000).step_by(50) {
            let status = classify(count);
            assert!(status >= previous, "severity dropped at count {count}");
            previous = status;
        }
    }

    #[test]
    fn estimate_scales_linearly_with_position() {
        for status in [
            TrafficStatus::Low,
            TrafficStatus::Medium,
            TrafficStatus::High,
            TrafficStatus::Critical,
        ] {
            for position in [1, 7, 120] {
                assert_eq!(
                    estimate_wait_seconds(Some(2 * position), status),
                    2 * estimate_wait_seconds(Some(position), status)
                );
            }
        }
    }

    #[test]
    fn estimate_uses_per_status_rates() {
        assert_eq!(estimate_wait_seconds(Some(3), TrafficStatus::Low), 15);
        assert_eq!(estimate_wait_seconds(Some(3), TrafficStatus::Medium), 45);
        assert_eq!(estimate_wait_seconds(Some(3), TrafficStatus::High), 90);
        assert_eq!(estimate_wait_seconds(Some(3), TrafficStatus::Critical), 180);
    }

    #[test]
    fn no_position_means_no_wait() {
        for status in [
            TrafficStatus::Low,
            TrafficStatus::Medium,
            TrafficStatus::High,
            TrafficStatus::Critical,
        ] {
            assert_eq!(estimate_wait_seconds(None, status), 0);
            assert_eq!(estimate_wait_seconds(Some(0), status), 0);
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        let value = serde_json::to_value(TrafficStatus::Critical).expect("serialize status");
        assert_eq!(value, serde_json::json!("critical"));
    }
}
