//! Overlay content and layout for the capture-context watermark.
//!
//! Everything here is pure: the four text lines and the layout metrics are
//! exact functions of the spec and the photo width, so the textual contract
//! can be tested without rendering a single pixel.

use chrono::{DateTime, Utc};

use crate::features::geo::coordinate::Coordinate;

/// Literal rendered in place of coordinates when no fix was available
pub const GPS_UNAVAILABLE: &str = "GPS unavailable";

/// Number of text lines on every watermark
pub const LINE_COUNT: u32 = 4;

/// What gets baked into the photo.
#[derive(Debug, Clone)]
pub struct WatermarkSpec {
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub coords: Option<Coordinate>,
}

impl WatermarkSpec {
    /// The four overlay lines, fixed order and fixed prefixes.
    pub fn lines(&self) -> [String; LINE_COUNT as usize] {
        let coords_line = match &self.coords {
            Some(coord) => format!("🌍 {}", coord.display_pair()),
            None => format!("🌍 {}", GPS_UNAVAILABLE),
        };

        [
            format!("📍 {}", self.location),
            format!("📅 {}", self.timestamp.format("%d %B %Y")),
            format!("🕐 {}", self.timestamp.format("%H:%M:%S")),
            coords_line,
        ]
    }
}

/// Layout metrics derived from the photo width. The overlay scales with the
/// source resolution so it stays legible on both phone photos and scans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    pub font_size: f32,
    pub line_height: f32,
    pub padding: f32,
}

impl OverlayLayout {
    pub fn for_width(width: u32) -> Self {
        let font_size = (width as f32 / 30.0).max(24.0);
        Self {
            font_size,
            line_height: font_size * 1.4,
            padding: font_size * 0.8,
        }
    }

    /// Total height of the four-line text block
    pub fn block_height(&self) -> f32 {
        self.line_height * LINE_COUNT as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn spec_at(coords: Option<Coordinate>) -> WatermarkSpec {
        WatermarkSpec {
            location: "Toilet Lobby".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 10, 5, 14, 30, 5).unwrap(),
            coords,
        }
    }

    #[test]
    fn test_lines_with_coordinates() {
        let spec = spec_at(Some(Coordinate::new(-6.2088, 106.8456)));
        let lines = spec.lines();
        assert_eq!(lines[0], "📍 Toilet Lobby");
        assert_eq!(lines[1], "📅 05 October 2025");
        assert_eq!(lines[2], "🕐 14:30:05");
        assert_eq!(lines[3], "🌍 -6.208800°, 106.845600°");
    }

    #[test]
    fn test_lines_without_coordinates() {
        let lines = spec_at(None).lines();
        assert!(lines[3].contains(GPS_UNAVAILABLE));
    }

    #[test]
    fn test_layout_scales_with_width() {
        let layout = OverlayLayout::for_width(3000);
        assert_eq!(layout.font_size, 100.0);
        assert_eq!(layout.line_height, 140.0);
        assert_eq!(layout.padding, 80.0);
    }

    #[test]
    fn test_layout_floors_at_minimum_font_size() {
        let layout = OverlayLayout::for_width(300);
        assert_eq!(layout.font_size, 24.0);
    }

    #[test]
    fn test_block_height_covers_all_lines() {
        let layout = OverlayLayout::for_width(1200);
        assert_eq!(layout.block_height(), layout.line_height * 4.0);
    }
}
