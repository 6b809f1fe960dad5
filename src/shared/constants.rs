/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Fraud reports are capped to the most recent entries
pub const FRAUD_REPORT_LIMIT: i64 = 50;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Inspector role - can submit checklist photos for assigned locations
pub const ROLE_INSPECTOR: &str = "inspector";

/// Supervisor role - can approve entries and read fraud reports
pub const ROLE_SUPERVISOR: &str = "supervisor";

// =============================================================================
// ADDRESS LITERALS
// =============================================================================

/// Persisted address value while reverse geocoding is still in flight
pub const ADDRESS_PENDING: &str = "Loading address...";

/// Fallback address line when reverse geocoding is unavailable
pub const FALLBACK_ADDRESS: &str = "GPS Location";

/// Fallback city/country when reverse geocoding is unavailable
pub const FALLBACK_UNKNOWN: &str = "Unknown";

/// Manual-verification map link, consumed verbatim by the reporting surface
pub fn maps_link(lat: f64, lon: f64) -> String {
    format!("https://www.google.com/maps?q={},{}", lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_link_matches_contract() {
        assert_eq!(
            maps_link(-6.2088, 106.8456),
            "https://www.google.com/maps?q=-6.2088,106.8456"
        );
    }
}
