//! Image normalization: raw capture → bounded-width baseline JPEG.
//!
//! Phone cameras deliver multi-megapixel photos. Each page is decoded,
//! downscaled to at most `target_width` pixels wide (aspect ratio kept,
//! never upscaled) and re-encoded as an RGB JPEG at the requested quality
//! before it is embedded in the PDF. Alpha channels are dropped.
//!
//! The function is pure and CPU-bound; the scanner runs it inside
//! `spawn_blocking`.

use crate::error::NormalizationError;
use crate::output::{CapturedPage, NormalizedPage, JPEG_MIME};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use tracing::debug;

/// Downscale and re-encode one captured page.
///
/// # Arguments
/// * `page` — the capture to normalize
/// * `target_width` — maximum output width in pixels (≥ 1)
/// * `quality` — JPEG quality in `0.0..=1.0`
///
/// # Errors
/// * [`NormalizationError::InvalidParameters`] for a zero width or an
///   out-of-range quality
/// * [`NormalizationError::UnsupportedFormat`] when the bytes are not a
///   decodable image
pub fn normalize(
    page: &CapturedPage,
    target_width: u32,
    quality: f32,
) -> Result<NormalizedPage, NormalizationError> {
    if target_width == 0 {
        return Err(NormalizationError::InvalidParameters(
            "target width must be at least 1 px".into(),
        ));
    }
    if !(0.0..=1.0).contains(&quality) {
        return Err(NormalizationError::InvalidParameters(format!(
            "quality must be 0.0–1.0, got {quality}"
        )));
    }

    let img = image::load_from_memory(page.raw.as_bytes()).map_err(|e| {
        NormalizationError::UnsupportedFormat {
            index: page.sequence_index,
            detail: e.to_string(),
        }
    })?;

    let (src_w, src_h) = img.dimensions();
    let (width, height) = scaled_dimensions(src_w, src_h, target_width);
    let img = if width < src_w {
        img.resize_exact(width, height, FilterType::Triangle)
    } else {
        img
    };
    let rgb = img.to_rgb8();

    let mut encoded_bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded_bytes, jpeg_quality(quality))
        .encode_image(&rgb)
        .map_err(|e| NormalizationError::UnsupportedFormat {
            index: page.sequence_index,
            detail: format!("JPEG encoding failed: {e}"),
        })?;

    debug!(
        "Normalized page {}: {}x{} → {}x{}, {} → {} bytes",
        page.sequence_index,
        src_w,
        src_h,
        width,
        height,
        page.raw.len(),
        encoded_bytes.len()
    );

    Ok(NormalizedPage {
        source: page.clone(),
        encoded_bytes,
        width,
        height,
        mime_type: JPEG_MIME,
    })
}

/// Output size for a `src_w`×`src_h` image bounded to `target_width`.
///
/// Downscale only; the height follows the aspect ratio and is at least 1.
pub fn scaled_dimensions(src_w: u32, src_h: u32, target_width: u32) -> (u32, u32) {
    if src_w <= target_width || src_w == 0 {
        return (src_w, src_h);
    }
    let height = (u64::from(src_h) * u64::from(target_width) + u64::from(src_w) / 2)
        / u64::from(src_w);
    (target_width, height.max(1) as u32)
}

/// Map a `0.0..=1.0` quality to the encoder's `1..=100` scale.
fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}
