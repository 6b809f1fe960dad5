//! Fraud classification over persisted checklist entries.
//!
//! A flag is always derived from the record at read time and never stored,
//! so it cannot drift from the underlying data. Every surface that shows a
//! flag goes through [`classify`]; thresholds live in [`FraudPolicy`], not
//! in the code.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::config::FraudConfig;
use crate::features::checklist::models::ChecklistEntry;

/// Derived plausibility classification of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudFlag {
    Ok,
    GpsInvalid,
    TimestampMismatch,
    NoGps,
    OtherSuspicious,
}

impl FraudFlag {
    pub fn is_suspicious(&self) -> bool {
        *self != FraudFlag::Ok
    }
}

impl std::fmt::Display for FraudFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FraudFlag::Ok => write!(f, "OK"),
            FraudFlag::GpsInvalid => write!(f, "GPS_INVALID"),
            FraudFlag::TimestampMismatch => write!(f, "TIMESTAMP_MISMATCH"),
            FraudFlag::NoGps => write!(f, "NO_GPS"),
            FraudFlag::OtherSuspicious => write!(f, "OTHER_SUSPICIOUS"),
        }
    }
}

/// Classification thresholds. Deployment policy, injected everywhere a
/// flag is computed.
#[derive(Debug, Clone)]
pub struct FraudPolicy {
    /// Maximum tolerated gap between capture and upload timestamps
    pub timestamp_threshold: Duration,
    /// Aggregate alert fires when invalid_gps / total exceeds this ratio
    pub invalid_ratio_alert: f64,
    /// Whether a GPS-bearing entry with no capture timestamp is suspicious
    pub flag_missing_capture_time: bool,
}

impl FraudPolicy {
    pub fn from_config(config: &FraudConfig) -> Self {
        Self {
            timestamp_threshold: Duration::seconds(config.timestamp_threshold_secs),
            invalid_ratio_alert: config.invalid_ratio_alert,
            flag_missing_capture_time: config.flag_missing_capture_time,
        }
    }
}

impl Default for FraudPolicy {
    fn default() -> Self {
        Self {
            timestamp_threshold: Duration::minutes(5),
            invalid_ratio_alert: 0.15,
            flag_missing_capture_time: true,
        }
    }
}

/// Classify one entry. First match wins:
/// 1. missing coordinates
/// 2. proximity check evaluated and failed
/// 3. capture/upload timestamp gap beyond the threshold
/// 4. capture timestamp absent entirely (policy-controlled)
pub fn classify(entry: &ChecklistEntry, policy: &FraudPolicy) -> FraudFlag {
    if entry.latitude.is_none() || entry.longitude.is_none() {
        return FraudFlag::NoGps;
    }

    if entry.is_gps_valid == Some(false) {
        return FraudFlag::GpsInvalid;
    }

    match entry.photo_timestamp {
        Some(captured_at) => {
            let gap = (entry.created_at - captured_at).abs();
            if gap > policy.timestamp_threshold {
                return FraudFlag::TimestampMismatch;
            }
        }
        None => {
            if policy.flag_missing_capture_time {
                return FraudFlag::OtherSuspicious;
            }
        }
    }

    FraudFlag::Ok
}

/// Pair every suspicious entry with its flag, preserving input order.
pub fn report<'a>(
    entries: &'a [ChecklistEntry],
    policy: &FraudPolicy,
) -> Vec<(&'a ChecklistEntry, FraudFlag)> {
    entries
        .iter()
        .map(|entry| (entry, classify(entry, policy)))
        .filter(|(_, flag)| flag.is_suspicious())
        .collect()
}

/// Aggregate GPS statistics over a set of entries.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GpsStats {
    pub total: i64,
    pub with_gps: i64,
    pub valid_gps: i64,
    pub invalid_gps: i64,
    pub no_gps: i64,
    pub avg_score: f64,
}

impl GpsStats {
    pub fn empty() -> Self {
        Self {
            total: 0,
            with_gps: 0,
            valid_gps: 0,
            invalid_gps: 0,
            no_gps: 0,
            avg_score: 0.0,
        }
    }

    /// Aggregate-level alert condition, independent of per-entry flags.
    pub fn alert_triggered(&self, policy: &FraudPolicy) -> bool {
        self.total > 0 && self.invalid_gps as f64 / self.total as f64 > policy.invalid_ratio_alert
    }
}

/// Pure reduction over a snapshot of entries.
pub fn aggregate(entries: &[ChecklistEntry]) -> GpsStats {
    if entries.is_empty() {
        return GpsStats::empty();
    }

    let mut stats = GpsStats::empty();
    let mut score_sum: i64 = 0;

    for entry in entries {
        stats.total += 1;
        score_sum += entry.score as i64;

        if entry.coordinate().is_some() {
            stats.with_gps += 1;
            match entry.is_gps_valid {
                Some(true) => stats.valid_gps += 1,
                Some(false) => stats.invalid_gps += 1,
                None => {}
            }
        } else {
            stats.no_gps += 1;
        }
    }

    stats.avg_score = score_sum as f64 / stats.total as f64;
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn entry() -> ChecklistEntry {
        let uploaded = Utc.with_ymd_and_hms(2025, 10, 5, 10, 0, 0).unwrap();
        ChecklistEntry {
            id: Uuid::new_v4(),
            location: "Toilet Lobby".to_string(),
            day: 5,
            month: 10,
            year: 2025,
            score: 90,
            photo_url: "https://cdn.example.com/photo.jpg".to_string(),
            uploaded_by: "worker-1".to_string(),
            latitude: Some(-6.2088),
            longitude: Some(106.8456),
            gps_address: Some("Jalan Sudirman, Jakarta".to_string()),
            photo_timestamp: Some(uploaded - Duration::minutes(2)),
            is_gps_valid: Some(true),
            device_audit: None,
            device_fingerprint: None,
            created_at: uploaded,
            updated_at: uploaded,
            approved_by: None,
            approved_at: None,
        }
    }

    #[test]
    fn test_missing_coordinates_is_no_gps() {
        let mut e = entry();
        e.latitude = None;
        assert_eq!(classify(&e, &FraudPolicy::default()), FraudFlag::NoGps);
    }

    #[test]
    fn test_failed_proximity_is_gps_invalid() {
        let mut e = entry();
        e.is_gps_valid = Some(false);
        assert_eq!(classify(&e, &FraudPolicy::default()), FraudFlag::GpsInvalid);
    }

    #[test]
    fn test_no_gps_wins_over_invalid() {
        let mut e = entry();
        e.latitude = None;
        e.is_gps_valid = Some(false);
        assert_eq!(classify(&e, &FraudPolicy::default()), FraudFlag::NoGps);
    }

    #[test]
    fn test_timestamp_gap_beyond_threshold() {
        let mut e = entry();
        e.photo_timestamp = Some(e.created_at - Duration::minutes(6));
        assert_eq!(
            classify(&e, &FraudPolicy::default()),
            FraudFlag::TimestampMismatch
        );
    }

    #[test]
    fn test_timestamp_gap_within_threshold_is_ok() {
        let mut e = entry();
        e.photo_timestamp = Some(e.created_at - Duration::minutes(4));
        assert_eq!(classify(&e, &FraudPolicy::default()), FraudFlag::Ok);
    }

    #[test]
    fn test_future_capture_timestamp_also_counts_as_gap() {
        let mut e = entry();
        e.photo_timestamp = Some(e.created_at + Duration::minutes(10));
        assert_eq!(
            classify(&e, &FraudPolicy::default()),
            FraudFlag::TimestampMismatch
        );
    }

    #[test]
    fn test_missing_capture_time_is_other_suspicious() {
        let mut e = entry();
        e.photo_timestamp = None;
        assert_eq!(
            classify(&e, &FraudPolicy::default()),
            FraudFlag::OtherSuspicious
        );

        let lenient = FraudPolicy {
            flag_missing_capture_time: false,
            ..FraudPolicy::default()
        };
        assert_eq!(classify(&e, &lenient), FraudFlag::Ok);
    }

    #[test]
    fn test_threshold_is_policy_not_constant() {
        let mut e = entry();
        e.photo_timestamp = Some(e.created_at - Duration::minutes(6));
        let wide = FraudPolicy {
            timestamp_threshold: Duration::minutes(10),
            ..FraudPolicy::default()
        };
        assert_eq!(classify(&e, &wide), FraudFlag::Ok);
    }

    #[test]
    fn test_report_filters_to_suspicious_in_order() {
        let ok = entry();
        let mut no_gps = entry();
        no_gps.latitude = None;
        let mut invalid = entry();
        invalid.is_gps_valid = Some(false);

        let entries = vec![ok, no_gps.clone(), invalid.clone()];
        let flagged = report(&entries, &FraudPolicy::default());

        assert_eq!(flagged.len(), 2);
        assert_eq!(flagged[0].0.id, no_gps.id);
        assert_eq!(flagged[0].1, FraudFlag::NoGps);
        assert_eq!(flagged[1].0.id, invalid.id);
        assert_eq!(flagged[1].1, FraudFlag::GpsInvalid);
    }

    #[test]
    fn test_aggregate_empty_set() {
        assert_eq!(aggregate(&[]), GpsStats::empty());
        assert_eq!(GpsStats::empty().avg_score, 0.0);
    }

    #[test]
    fn test_aggregate_buckets_and_average() {
        let mut no_gps = entry();
        no_gps.latitude = None;
        no_gps.longitude = None;
        no_gps.score = 60;

        let mut invalid = entry();
        invalid.is_gps_valid = Some(false);
        invalid.score = 70;

        let mut unevaluated = entry();
        unevaluated.is_gps_valid = None;
        unevaluated.score = 80;

        let stats = aggregate(&[entry(), no_gps, invalid, unevaluated]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.with_gps, 3);
        assert_eq!(stats.valid_gps, 1);
        assert_eq!(stats.invalid_gps, 1);
        assert_eq!(stats.no_gps, 1);
        assert_eq!(stats.avg_score, 75.0);
        // buckets partition the set
        assert_eq!(stats.no_gps + stats.with_gps, stats.total);
    }

    #[test]
    fn test_alert_threshold_on_aggregate() {
        let policy = FraudPolicy::default();

        let mut invalid = entry();
        invalid.is_gps_valid = Some(false);

        // 1 invalid out of 4 -> 25% > 15%
        let stats = aggregate(&[entry(), entry(), entry(), invalid.clone()]);
        assert!(stats.alert_triggered(&policy));

        // 1 invalid out of 10 -> 10% < 15%
        let mut many = vec![invalid];
        many.extend(std::iter::repeat_with(entry).take(9));
        let stats = aggregate(&many);
        assert!(!stats.alert_triggered(&policy));

        assert!(!GpsStats::empty().alert_triggered(&policy));
    }

    #[test]
    fn test_valid_submission_end_to_end() {
        use crate::features::geo::{distance, Coordinate};

        // Worker photographs "Toilet Lobby" exactly at the reference point
        let reference = Coordinate::new(-6.2088, 106.8456);
        let actual = Coordinate::new(-6.2088, 106.8456);
        let check = distance::validate_proximity(&actual, &reference, 100.0);
        assert!(check.valid);
        assert_eq!(check.distance_meters, 0);

        let mut e = entry();
        e.is_gps_valid = Some(check.valid);
        e.photo_timestamp = Some(e.created_at - Duration::minutes(2));
        assert_eq!(classify(&e, &FraudPolicy::default()), FraudFlag::Ok);

        let stats = aggregate(std::slice::from_ref(&e));
        assert_eq!(stats.valid_gps, 1);
        assert_eq!(stats.avg_score, 90.0);
    }

    #[test]
    fn test_flag_serializes_to_contract_literals() {
        assert_eq!(serde_json::to_string(&FraudFlag::Ok).unwrap(), "\"OK\"");
        assert_eq!(
            serde_json::to_string(&FraudFlag::GpsInvalid).unwrap(),
            "\"GPS_INVALID\""
        );
        assert_eq!(
            serde_json::to_string(&FraudFlag::TimestampMismatch).unwrap(),
            "\"TIMESTAMP_MISMATCH\""
        );
        assert_eq!(
            serde_json::to_string(&FraudFlag::NoGps).unwrap(),
            "\"NO_GPS\""
        );
        assert_eq!(
            serde_json::to_string(&FraudFlag::OtherSuspicious).unwrap(),
            "\"OTHER_SUSPICIOUS\""
        );
    }
}
