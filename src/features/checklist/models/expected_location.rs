use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::features::geo::coordinate::Coordinate;

/// Reference coordinates for a named location, used to judge whether a
/// submission was captured where it claims to be. Locations without a
/// reference are simply not evaluated.
#[derive(Debug, Clone, FromRow)]
pub struct ExpectedLocation {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub tolerance_m: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpectedLocation {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
