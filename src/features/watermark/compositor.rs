//! Watermark compositing onto photo bytes.
//!
//! The output keeps the input's pixel dimensions and encoded format; any
//! decode, draw or encode failure surfaces as an explicit error so an
//! unwatermarked photo can never slip through the pipeline unnoticed.

use std::io::Cursor;

use ab_glyph::{FontVec, PxScale};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat, Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::core::config::WatermarkConfig;
use crate::core::error::{AppError, Result};
use crate::features::watermark::overlay::{OverlayLayout, WatermarkSpec};

/// Backdrop opacity (0.75 of full black)
const BACKDROP_ALPHA: u8 = 191;

/// Shadow blur sigma; the 8 px reference blur is roughly 3 sigma
const SHADOW_BLUR_SIGMA: f32 = 8.0 / 3.0;

/// Shadow offset in pixels
const SHADOW_OFFSET: i64 = 2;

const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const SHADOW_COLOR: Rgba<u8> = Rgba([0, 0, 0, 200]);

pub struct WatermarkCompositor {
    font: FontVec,
    jpeg_quality: u8,
}

impl WatermarkCompositor {
    /// Load the overlay font from the configured path. Failing here keeps a
    /// half-configured service from accepting submissions it cannot stamp.
    pub fn new(config: &WatermarkConfig) -> Result<Self> {
        let font_bytes = std::fs::read(&config.font_path).map_err(|e| {
            AppError::Internal(format!(
                "Failed to read watermark font '{}': {}",
                config.font_path, e
            ))
        })?;

        let font = FontVec::try_from_vec(font_bytes).map_err(|e| {
            AppError::Internal(format!(
                "Invalid watermark font '{}': {}",
                config.font_path, e
            ))
        })?;

        Ok(Self {
            font,
            jpeg_quality: config.jpeg_quality,
        })
    }

    /// Bake the overlay into `photo`, returning bytes in the same encoded
    /// format with identical pixel dimensions.
    pub fn compose(&self, photo: &[u8], spec: &WatermarkSpec) -> Result<Vec<u8>> {
        let format = image::guess_format(photo)
            .map_err(|e| AppError::Watermark(format!("Unrecognized image format: {}", e)))?;

        let decoded = image::load_from_memory_with_format(photo, format)
            .map_err(|e| AppError::Watermark(format!("Failed to decode photo: {}", e)))?;

        let (width, height) = decoded.dimensions();
        let mut canvas = decoded.into_rgba8();

        self.draw_overlay(&mut canvas, spec);

        debug_assert_eq!(canvas.dimensions(), (width, height));

        self.encode(canvas, format)
    }

    fn draw_overlay(&self, canvas: &mut RgbaImage, spec: &WatermarkSpec) {
        let (width, height) = canvas.dimensions();
        let layout = OverlayLayout::for_width(width);
        let scale = PxScale::from(layout.font_size);
        let lines = spec.lines();

        let max_line_width = lines
            .iter()
            .map(|line| text_size(scale, &self.font, line).0)
            .max()
            .unwrap_or(0) as f32;

        // Anchor the block to the bottom-left with uniform padding
        let text_x = layout.padding;
        let block_top = height as f32 - layout.padding - layout.block_height();

        // Backdrop: half a padding of breathing room around the text block
        let inset = layout.padding * 0.5;
        blend_rect(
            canvas,
            (text_x - inset).max(0.0) as i64,
            (block_top - inset).max(0.0) as i64,
            (max_line_width + layout.padding) as u32,
            (layout.block_height() + layout.padding) as u32,
            Rgba([0, 0, 0, BACKDROP_ALPHA]),
        );

        // Shadow pass: offset glyphs on a transparent band, blurred, then
        // alpha-composited under the crisp text
        let band_top = (block_top - inset).max(0.0) as i64;
        let band_height = (layout.block_height() + layout.padding).min(height as f32) as u32;
        let mut shadow_band = RgbaImage::new(width, band_height);
        for (i, line) in lines.iter().enumerate() {
            let line_y = block_top + i as f32 * layout.line_height - band_top as f32;
            draw_text_mut(
                &mut shadow_band,
                SHADOW_COLOR,
                text_x as i32 + SHADOW_OFFSET as i32,
                line_y as i32 + SHADOW_OFFSET as i32,
                scale,
                &self.font,
                line,
            );
        }
        let shadow_band = image::imageops::blur(&shadow_band, SHADOW_BLUR_SIGMA);
        image::imageops::overlay(canvas, &shadow_band, 0, band_top);

        for (i, line) in lines.iter().enumerate() {
            let line_y = block_top + i as f32 * layout.line_height;
            draw_text_mut(
                canvas,
                TEXT_COLOR,
                text_x as i32,
                line_y as i32,
                scale,
                &self.font,
                line,
            );
        }
    }

    fn encode(&self, canvas: RgbaImage, format: ImageFormat) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());

        match format {
            ImageFormat::Jpeg => {
                // JPEG has no alpha channel; flatten before encoding
                let rgb = DynamicImage::ImageRgba8(canvas).into_rgb8();
                let encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
                rgb.write_with_encoder(encoder)
                    .map_err(|e| AppError::Watermark(format!("Failed to encode JPEG: {}", e)))?;
            }
            _ => {
                DynamicImage::ImageRgba8(canvas)
                    .write_to(&mut out, format)
                    .map_err(|e| {
                        AppError::Watermark(format!("Failed to encode {:?}: {}", format, e))
                    })?;
            }
        }

        Ok(out.into_inner())
    }
}

/// Blend a semi-opaque rectangle over the canvas, clipped to its bounds.
fn blend_rect(canvas: &mut RgbaImage, x: i64, y: i64, w: u32, h: u32, color: Rgba<u8>) {
    let (width, height) = canvas.dimensions();
    for py in y.max(0)..(y + h as i64).min(height as i64) {
        for px in x.max(0)..(x + w as i64).min(width as i64) {
            canvas.get_pixel_mut(px as u32, py as u32).blend(&color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::geo::coordinate::Coordinate;
    use chrono::TimeZone;
    use chrono::Utc;

    fn test_compositor() -> Option<WatermarkCompositor> {
        let config = WatermarkConfig {
            font_path: std::env::var("WATERMARK_FONT_PATH")
                .unwrap_or_else(|_| "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string()),
            jpeg_quality: 95,
        };
        match WatermarkCompositor::new(&config) {
            Ok(c) => Some(c),
            Err(_) => {
                eprintln!("skipping: no font at {}", config.font_path);
                None
            }
        }
    }

    fn test_spec() -> WatermarkSpec {
        WatermarkSpec {
            location: "Toilet Lobby".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 10, 5, 14, 30, 5).unwrap(),
            coords: Some(Coordinate::new(-6.2088, 106.8456)),
        }
    }

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([40, 120, 200, 255]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_compose_preserves_dimensions_and_format() {
        let Some(compositor) = test_compositor() else {
            return;
        };
        let photo = sample_png(640, 480);
        let stamped = compositor.compose(&photo, &test_spec()).unwrap();

        assert_eq!(image::guess_format(&stamped).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&stamped).unwrap();
        assert_eq!(decoded.dimensions(), (640, 480));
    }

    #[test]
    fn test_compose_preserves_jpeg_format() {
        let Some(compositor) = test_compositor() else {
            return;
        };
        let img = RgbaImage::from_pixel(320, 240, Rgba([10, 10, 10, 255]));
        let mut out = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut out, 90)
            .encode_image(&DynamicImage::ImageRgba8(img).into_rgb8())
            .unwrap();
        let photo = out.into_inner();

        let stamped = compositor.compose(&photo, &test_spec()).unwrap();
        assert_eq!(image::guess_format(&stamped).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&stamped).unwrap();
        assert_eq!(decoded.dimensions(), (320, 240));
    }

    #[test]
    fn test_compose_rejects_garbage_bytes() {
        let Some(compositor) = test_compositor() else {
            return;
        };
        let result = compositor.compose(b"not an image at all", &test_spec());
        assert!(matches!(result, Err(AppError::Watermark(_))));
    }

    #[test]
    fn test_blend_rect_clips_to_canvas() {
        let mut canvas = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        blend_rect(&mut canvas, 5, 5, 20, 20, Rgba([0, 0, 0, BACKDROP_ALPHA]));
        // Inside the rect the white is darkened, outside it is untouched
        assert!(canvas.get_pixel(7, 7)[0] < 255);
        assert_eq!(canvas.get_pixel(2, 2)[0], 255);
    }
}
