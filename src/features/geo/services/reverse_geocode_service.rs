use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::config::GeocodingConfig;
use crate::features::geo::coordinate::Coordinate;
use crate::shared::constants::{FALLBACK_ADDRESS, FALLBACK_UNKNOWN};

/// A resolved, human-readable address. Always fully populated: when the
/// lookup is unavailable every field degrades to a deterministic literal
/// so callers can present *some* address string unconditionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoAddress {
    pub address: String,
    pub city: String,
    pub country: String,
    pub formatted: String,
}

impl GeoAddress {
    /// Coordinate-string fallback used whenever the lookup fails.
    pub fn fallback(coord: &Coordinate) -> Self {
        Self {
            address: FALLBACK_ADDRESS.to_string(),
            city: FALLBACK_UNKNOWN.to_string(),
            country: FALLBACK_UNKNOWN.to_string(),
            formatted: coord.display_pair(),
        }
    }
}

/// Nominatim reverse lookup response structure
#[derive(Debug, Deserialize)]
struct NominatimReverseResponse {
    display_name: Option<String>,
    address: Option<NominatimAddress>,
}

/// Nominatim address components
#[derive(Debug, Default, Deserialize)]
pub struct NominatimAddress {
    pub road: Option<String>,
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl NominatimAddress {
    /// Get city, falling back to town or village
    pub fn get_city(&self) -> Option<String> {
        self.city
            .clone()
            .or_else(|| self.town.clone())
            .or_else(|| self.village.clone())
    }

    /// Road preferred over the broader suburb
    pub fn get_street(&self) -> Option<String> {
        self.road.clone().or_else(|| self.suburb.clone())
    }

    /// Join available components with ", ", skipping absent parts
    pub fn format_components(&self) -> String {
        [
            self.get_street(),
            self.get_city(),
            self.state.clone(),
            self.country.clone(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Service for reverse geocoding coordinates using Nominatim
pub struct ReverseGeocodeService {
    client: reqwest::Client,
    base_url: String,
}

impl ReverseGeocodeService {
    pub fn new(config: &GeocodingConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(config.user_agent.clone())
                .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: config.base_url.clone(),
        }
    }

    /// Resolve a coordinate to a human-readable address.
    ///
    /// Never fails outward: non-success responses, network errors and
    /// malformed payloads all degrade to the coordinate-string fallback.
    pub async fn resolve(&self, coord: &Coordinate) -> GeoAddress {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json&zoom=18&addressdetails=1",
            self.base_url, coord.latitude, coord.longitude
        );

        tracing::debug!("Reverse geocoding: {} -> {}", coord.display_pair(), url);

        match self.execute_request(&url).await {
            Some(response) => Self::to_geo_address(coord, response),
            None => GeoAddress::fallback(coord),
        }
    }

    async fn execute_request(&self, url: &str) -> Option<NominatimReverseResponse> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Nominatim request failed: {:?}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Nominatim returned status: {}", response.status());
            return None;
        }

        match response.json::<NominatimReverseResponse>().await {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Failed to parse Nominatim response: {:?}", e);
                None
            }
        }
    }

    fn to_geo_address(coord: &Coordinate, response: NominatimReverseResponse) -> GeoAddress {
        let components = response.address.unwrap_or_default();

        let formatted = {
            let joined = components.format_components();
            if !joined.is_empty() {
                joined
            } else if let Some(display_name) = response.display_name.filter(|d| !d.is_empty()) {
                display_name
            } else {
                coord.display_pair()
            }
        };

        GeoAddress {
            address: components
                .get_street()
                .unwrap_or_else(|| FALLBACK_ADDRESS.to_string()),
            city: components
                .get_city()
                .unwrap_or_else(|| FALLBACK_UNKNOWN.to_string()),
            country: components
                .country
                .unwrap_or_else(|| FALLBACK_UNKNOWN.to_string()),
            formatted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(
        road: Option<&str>,
        suburb: Option<&str>,
        city: Option<&str>,
        town: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
    ) -> NominatimAddress {
        NominatimAddress {
            road: road.map(String::from),
            suburb: suburb.map(String::from),
            city: city.map(String::from),
            town: town.map(String::from),
            village: None,
            state: state.map(String::from),
            country: country.map(String::from),
        }
    }

    #[test]
    fn test_format_components_skips_missing_parts() {
        let addr = components(
            Some("Jalan Sudirman"),
            None,
            Some("Jakarta"),
            None,
            None,
            Some("Indonesia"),
        );
        assert_eq!(
            addr.format_components(),
            "Jalan Sudirman, Jakarta, Indonesia"
        );
    }

    #[test]
    fn test_street_prefers_road_over_suburb() {
        let addr = components(Some("Jalan Thamrin"), Some("Menteng"), None, None, None, None);
        assert_eq!(addr.get_street(), Some("Jalan Thamrin".to_string()));

        let addr = components(None, Some("Menteng"), None, None, None, None);
        assert_eq!(addr.get_street(), Some("Menteng".to_string()));
    }

    #[test]
    fn test_city_falls_back_to_town() {
        let addr = components(None, None, None, Some("Sumedang"), None, None);
        assert_eq!(addr.get_city(), Some("Sumedang".to_string()));
    }

    #[test]
    fn test_fallback_literals() {
        let coord = Coordinate::new(-6.2088, 106.8456);
        let fallback = GeoAddress::fallback(&coord);
        assert_eq!(fallback.address, "GPS Location");
        assert_eq!(fallback.city, "Unknown");
        assert_eq!(fallback.country, "Unknown");
        assert_eq!(fallback.formatted, "-6.208800°, 106.845600°");
    }

    #[tokio::test]
    async fn test_resolve_network_failure_degrades_to_fallback() {
        // Port 9 (discard) refuses connections immediately
        let service = ReverseGeocodeService::new(&crate::core::config::GeocodingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            user_agent: "SiteproofCore/test".to_string(),
            request_timeout_secs: 1,
        });
        let coord = Coordinate::new(-6.2088, 106.8456);
        let address = service.resolve(&coord).await;
        assert_eq!(address, GeoAddress::fallback(&coord));
    }
}
