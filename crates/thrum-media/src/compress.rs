//! Compression strategies and the never-throws pipeline boundary.

use std::io::Cursor;
use std::sync::OnceLock;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use miette::Diagnostic;

use crate::profile::{CompressionConfig, CompressionRequest, OutputFormat};

/// Quality ladder floor and step for the primary strategy.
const MIN_QUALITY: u8 = 20;
const QUALITY_STEP: u8 = 10;

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum CompressError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// The strategy's capability probe failed at startup.
    #[error("compressor unavailable")]
    Unavailable,
}

/// A compression strategy.
pub trait Compressor: Send + Sync {
    /// Capability probe. A strategy that reports `false` is skipped in favor
    /// of the fallback.
    fn is_available(&self) -> bool;

    fn compress(&self, data: &[u8], config: &CompressionConfig) -> Result<Vec<u8>, CompressError>;
}

/// Scale `width`x`height` to fit within `max` on both sides, preserving
/// aspect ratio. A no-op when already within bounds; otherwise the larger
/// dimension becomes `max` and the other scales proportionally, rounded to
/// nearest.
pub fn fit_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if max == 0 || (width <= max && height <= max) {
        return (width, height);
    }
    let scale = max as f64 / width.max(height) as f64;
    let fitted = |side: u32| ((side as f64 * scale).round() as u32).max(1);
    if width >= height {
        (max, fitted(height))
    } else {
        (fitted(width), max)
    }
}

fn decode(data: &[u8]) -> Result<DynamicImage, CompressError> {
    image::load_from_memory(data).map_err(CompressError::Decode)
}

fn resize_to_fit(img: DynamicImage, max: u32, filter: FilterType) -> DynamicImage {
    let (width, height) = img.dimensions();
    let (new_width, new_height) = fit_dimensions(width, height, max);
    if (new_width, new_height) == (width, height) {
        img
    } else {
        img.resize_exact(new_width, new_height, filter)
    }
}

fn quality_percent(quality: f32) -> u8 {
    (quality.clamp(0.05, 1.0) * 100.0).round() as u8
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
    // JPEG has no alpha channel; flatten before encoding.
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)
        .map_err(CompressError::Encode)?;
    Ok(buf)
}

fn encode_plain(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, CompressError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format)
        .map_err(CompressError::Encode)?;
    Ok(buf.into_inner())
}

/// Primary strategy: decode, fit-resize, then walk a quality ladder downward
/// until the byte target is met or the floor is reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecCompressor;

impl CodecCompressor {
    /// Round-trip a 1x1 image through the JPEG codec once, at startup.
    fn probe() -> bool {
        static PROBED: OnceLock<bool> = OnceLock::new();
        *PROBED.get_or_init(|| {
            let img = DynamicImage::new_rgb8(1, 1);
            match encode_jpeg(&img, 80) {
                Ok(buf) => decode(&buf).is_ok(),
                Err(_) => false,
            }
        })
    }
}

impl Compressor for CodecCompressor {
    fn is_available(&self) -> bool {
        Self::probe()
    }

    fn compress(&self, data: &[u8], config: &CompressionConfig) -> Result<Vec<u8>, CompressError> {
        let img = resize_to_fit(decode(data)?, config.max_dimension, FilterType::Lanczos3);

        match config.output {
            OutputFormat::Jpeg => {
                let target = config.target_bytes();
                let mut quality = quality_percent(config.quality);
                let mut best = encode_jpeg(&img, quality)?;
                while best.len() > target && quality > MIN_QUALITY {
                    quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
                    let attempt = encode_jpeg(&img, quality)?;
                    if attempt.len() < best.len() {
                        best = attempt;
                    }
                }
                Ok(best)
            }
            // No quality knob for these codecs; one pass is all there is.
            output => encode_plain(&img, output.image_format()),
        }
    }
}

/// Fallback strategy: one decode, one resize, one re-encode at the
/// configured quality. No byte targeting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResizeFallbackCompressor;

impl Compressor for ResizeFallbackCompressor {
    fn is_available(&self) -> bool {
        true
    }

    fn compress(&self, data: &[u8], config: &CompressionConfig) -> Result<Vec<u8>, CompressError> {
        let img = resize_to_fit(decode(data)?, config.max_dimension, FilterType::Triangle);
        match config.output {
            OutputFormat::Jpeg => encode_jpeg(&img, quality_percent(config.quality)),
            output => encode_plain(&img, output.image_format()),
        }
    }
}

/// Outcome of compressing one file. Never an error: total failure is a
/// `success: false` result carrying the original bytes, and the caller
/// decides whether to upload those.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub data: Bytes,
    pub original_size: usize,
    pub compressed_size: usize,
    /// `round(100 * (1 - compressed/original))`; 0 on failure or when the
    /// original bytes were kept.
    pub compression_ratio: u8,
    pub success: bool,
    pub error: Option<String>,
}

fn ratio(original: usize, compressed: usize) -> u8 {
    if original == 0 || compressed >= original {
        return 0;
    }
    (100.0 * (1.0 - compressed as f64 / original as f64)).round() as u8
}

/// A primary and a fallback strategy, selected at startup.
pub struct CompressionPipeline {
    primary: Box<dyn Compressor>,
    fallback: Box<dyn Compressor>,
}

impl Default for CompressionPipeline {
    fn default() -> Self {
        Self::detect()
    }
}

impl CompressionPipeline {
    /// Probe the codec strategy and fall back to the plain resize path.
    pub fn detect() -> Self {
        let primary = CodecCompressor;
        if !primary.is_available() {
            tracing::warn!("codec compressor failed its probe, resize fallback only");
        }
        Self::with_strategies(Box::new(primary), Box::new(ResizeFallbackCompressor))
    }

    pub fn with_strategies(primary: Box<dyn Compressor>, fallback: Box<dyn Compressor>) -> Self {
        Self { primary, fallback }
    }

    /// Compress `data` under the resolved config. Output that fails to beat
    /// the input is discarded in favor of the original bytes.
    pub fn compress(&self, data: &Bytes, request: &CompressionRequest) -> CompressionResult {
        let config = request.resolve(data.len());
        let original_size = data.len();

        let attempt = if self.primary.is_available() {
            self.primary.compress(data, &config)
        } else {
            Err(CompressError::Unavailable)
        };
        let attempt = match attempt {
            Ok(buf) => Ok(buf),
            Err(err) => {
                tracing::warn!(%err, "primary compressor failed, trying fallback");
                self.fallback.compress(data, &config)
            }
        };

        match attempt {
            Ok(buf) if buf.len() < original_size => CompressionResult {
                compressed_size: buf.len(),
                compression_ratio: ratio(original_size, buf.len()),
                data: Bytes::from(buf),
                original_size,
                success: true,
                error: None,
            },
            Ok(_) => CompressionResult {
                data: data.clone(),
                original_size,
                compressed_size: original_size,
                compression_ratio: 0,
                success: true,
                error: None,
            },
            Err(err) => {
                tracing::warn!(%err, "all compression strategies failed, keeping original");
                CompressionResult {
                    data: data.clone(),
                    original_size,
                    compressed_size: original_size,
                    compression_ratio: 0,
                    success: false,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}
