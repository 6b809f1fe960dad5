//! Great-circle distance and proximity checks.
//!
//! Pure numeric module: no I/O, no state. The proximity tolerance is a
//! parameter so deployments can tighten or loosen it per location.

use serde::Serialize;
use utoipa::ToSchema;

use crate::features::geo::coordinate::Coordinate;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Default proximity tolerance in meters when a location has no override
pub const DEFAULT_PROXIMITY_TOLERANCE_M: f64 = 100.0;

/// Outcome of a proximity check between an actual and an expected position.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProximityCheck {
    pub valid: bool,
    pub distance_meters: i64,
    pub message: String,
}

/// Haversine great-circle distance between two coordinates, in meters.
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    let (lat1, lon1) = a.to_radians();
    let (lat2, lon2) = b.to_radians();

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Judge whether `actual` lies within `max_distance_m` of `expected`.
pub fn validate_proximity(
    actual: &Coordinate,
    expected: &Coordinate,
    max_distance_m: f64,
) -> ProximityCheck {
    let distance = distance_meters(actual, expected);
    let valid = distance <= max_distance_m;
    let distance_meters = distance.round() as i64;

    let message = if valid {
        format!(
            "Position within tolerance: {} m (max {} m)",
            distance_meters, max_distance_m as i64
        )
    } else {
        format!(
            "Position {} m from expected location (max {} m)",
            distance_meters, max_distance_m as i64
        )
    };

    ProximityCheck {
        valid,
        distance_meters,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn jakarta() -> Coordinate {
        Coordinate::new(-6.2088, 106.8456)
    }

    /// Offset north by roughly `meters` (1 deg latitude ~ 111.32 km)
    fn offset_north(base: Coordinate, meters: f64) -> Coordinate {
        Coordinate::new(base.latitude + meters / 111_320.0, base.longitude)
    }

    #[test]
    fn test_distance_is_commutative() {
        let a = jakarta();
        let b = Coordinate::new(-6.1751, 106.8650);
        assert_relative_eq!(
            distance_meters(&a, &b),
            distance_meters(&b, &a),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_distance_identity_is_zero() {
        let a = jakarta();
        assert_relative_eq!(distance_meters(&a, &a), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_triangle_inequality() {
        let points = [
            Coordinate::new(-6.2088, 106.8456),
            Coordinate::new(-6.9147, 107.6098),
            Coordinate::new(-7.2575, 112.7521),
            Coordinate::new(3.5952, 98.6722),
        ];
        for a in &points {
            for b in &points {
                for c in &points {
                    let ac = distance_meters(a, c);
                    let ab = distance_meters(a, b);
                    let bc = distance_meters(b, c);
                    assert!(
                        ac <= ab + bc + 1e-6,
                        "triangle inequality violated: {} > {} + {}",
                        ac,
                        ab,
                        bc
                    );
                }
            }
        }
    }

    #[test]
    fn test_known_distance_berlin_paris() {
        let berlin = Coordinate::new(52.5200, 13.4050);
        let paris = Coordinate::new(48.8566, 2.3522);
        let km = distance_meters(&berlin, &paris) / 1000.0;
        assert!((km - 878.0).abs() < 10.0, "got {} km", km);
    }

    #[test]
    fn test_proximity_within_tolerance() {
        let expected = jakarta();
        let actual = offset_north(expected, 50.0);
        let check = validate_proximity(&actual, &expected, DEFAULT_PROXIMITY_TOLERANCE_M);
        assert!(check.valid);
        assert!((check.distance_meters - 50).abs() <= 2);
    }

    #[test]
    fn test_proximity_outside_tolerance() {
        let expected = jakarta();
        let actual = offset_north(expected, 150.0);
        let check = validate_proximity(&actual, &expected, DEFAULT_PROXIMITY_TOLERANCE_M);
        assert!(!check.valid);
        assert!((check.distance_meters - 150).abs() <= 2);
    }
}
