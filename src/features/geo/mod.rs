pub mod acquirer;
pub mod coordinate;
pub mod distance;
pub mod services;

pub use acquirer::{CoordinateAcquirer, PositionFix, PositionSource};
pub use coordinate::Coordinate;
pub use services::{GeoAddress, ReverseGeocodeService};
