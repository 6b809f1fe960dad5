mod reverse_geocode_service;

pub use reverse_geocode_service::{GeoAddress, ReverseGeocodeService};
