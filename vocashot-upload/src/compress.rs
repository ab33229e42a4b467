//! Fitting images under a provider's size ceiling.
//!
//! Files already under the limit pass through untouched. Larger files are
//! decoded, flattened to RGB over white, and re-encoded as JPEG down a
//! quality ladder, then down a scale ladder at a fixed quality.

use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageFormat, ImageReader, RgbImage};
use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use vocashot_core::ImageAsset;

use crate::error::CompressionError;
use crate::validate::{ACCEPTED_FORMATS, ResolvedPath};

/// JPEG qualities tried in order before any downscaling.
pub const QUALITY_LADDER: [u8; 6] = [85, 75, 65, 55, 45, 35];

/// Scale factors tried in order once the quality ladder is exhausted.
pub const SCALE_LADDER: [f32; 4] = [0.8, 0.6, 0.4, 0.2];

/// Quality used with every scale step.
pub const SCALED_QUALITY: u8 = 75;

// ============================================================================
// Image Compressor
// ============================================================================

/// Conditions source files for one provider's size limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCompressor;

impl ImageCompressor {
    /// Creates a compressor.
    pub fn new() -> Self {
        Self
    }

    /// Returns the file as an [`ImageAsset`] no larger than `limit` bytes.
    ///
    /// The re-encode runs on the blocking pool and stops at the next ladder
    /// step once `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError::UnsupportedFormat`] for non-raster or
    /// unknown input, [`CompressionError::CannotCompress`] when no step
    /// of either ladder gets under `limit`, and [`CompressionError::Cancelled`]
    /// if `cancel` fired first.
    #[instrument(skip(self, source, cancel), fields(path = %source.path.display()))]
    pub async fn fit(
        &self,
        source: &ResolvedPath,
        limit: u64,
        cancel: &CancellationToken,
    ) -> Result<ImageAsset, CompressionError> {
        let bytes = tokio::fs::read(&source.path).await?;
        let filename = source.file_name();
        let format = detect_format(&bytes)?;

        if bytes.len() as u64 <= limit {
            debug!(size = bytes.len(), "Within limit, sending original");
            return Ok(ImageAsset::original(bytes, filename, format.to_mime_type()));
        }

        let original_size = bytes.len();
        let cancel = cancel.clone();
        let compressed = tokio::task::spawn_blocking(move || compress_bytes_until(&bytes, limit, &cancel))
            .await
            .map_err(|e| CompressionError::Encode(format!("compression task failed: {e}")))??;

        info!(
            from = original_size,
            to = compressed.len(),
            "Compressed image to fit provider limit"
        );
        Ok(ImageAsset::recompressed_jpeg(compressed, &filename))
    }
}

// ============================================================================
// Encoding
// ============================================================================

fn detect_format(bytes: &[u8]) -> Result<ImageFormat, CompressionError> {
    let format = image::guess_format(bytes)
        .map_err(|_| CompressionError::UnsupportedFormat("unrecognized data".to_string()))?;
    if ACCEPTED_FORMATS.contains(&format) {
        Ok(format)
    } else {
        Err(CompressionError::UnsupportedFormat(format!("{format:?}")))
    }
}

/// Re-encodes `raw` as JPEG no larger than `limit` bytes.
///
/// # Errors
///
/// See [`ImageCompressor::fit`].
pub fn compress_bytes(raw: &[u8], limit: u64) -> Result<Vec<u8>, CompressionError> {
    compress_bytes_until(raw, limit, &CancellationToken::new())
}

/// Like [`compress_bytes`], checking `cancel` before every ladder step.
///
/// # Errors
///
/// See [`ImageCompressor::fit`].
pub fn compress_bytes_until(
    raw: &[u8],
    limit: u64,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, CompressionError> {
    let reader = ImageReader::new(Cursor::new(raw)).with_guessed_format()?;
    match reader.format() {
        Some(f) if ACCEPTED_FORMATS.contains(&f) => {}
        Some(f) => return Err(CompressionError::UnsupportedFormat(format!("{f:?}"))),
        None => {
            return Err(CompressionError::UnsupportedFormat(
                "unrecognized data".to_string(),
            ));
        }
    }

    let decoded = reader
        .decode()
        .map_err(|e| CompressionError::Decode(e.to_string()))?;
    let rgb = flatten_onto_white(&decoded);

    let mut best = u64::MAX;

    for quality in QUALITY_LADDER {
        if cancel.is_cancelled() {
            return Err(CompressionError::Cancelled);
        }
        let encoded = encode_jpeg(&rgb, quality)?;
        let size = encoded.len() as u64;
        debug!(quality, size, "Quality step");
        if size <= limit {
            return Ok(encoded);
        }
        best = best.min(size);
    }

    let (width, height) = rgb.dimensions();
    for scale in SCALE_LADDER {
        if cancel.is_cancelled() {
            return Err(CompressionError::Cancelled);
        }
        let w = scaled_dimension(width, scale);
        let h = scaled_dimension(height, scale);
        let resized = imageops::resize(&rgb, w, h, FilterType::Lanczos3);
        let encoded = encode_jpeg(&resized, SCALED_QUALITY)?;
        let size = encoded.len() as u64;
        debug!(scale, width = w, height = h, size, "Scale step");
        if size <= limit {
            return Ok(encoded);
        }
        best = best.min(size);
    }

    Err(CompressionError::CannotCompress { limit, best })
}

/// Converts any color mode to RGB, compositing transparency over white.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| -> u8 {
            let v = (u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255;
            u8::try_from(v).unwrap_or(u8::MAX)
        };
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, CompressionError> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| CompressionError::Encode(e.to_string()))?;
    Ok(buf)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn scaled_dimension(value: u32, scale: f32) -> u32 {
    ((value as f32 * scale).round() as u32).max(1)
}

// ============================================================================
// Tests
// ============================================================================
