use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::path::Path;
use tracing::debug;

use crate::config::ServerConfig;

/// Result of normalizing one image
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Shrinks images to fit a bounding box and re-encodes them as JPEG.
/// Images already inside the box keep their dimensions.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    max_width: u32,
    max_height: u32,
    quality: u8,
}

impl ImageNormalizer {
    pub fn new(max_width: u32, max_height: u32, quality: u8) -> Self {
        Self {
            max_width: max_width.max(1),
            max_height: max_height.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.image_max_width,
            config.image_max_height,
            config.image_quality,
        )
    }

    /// Decode, fit inside the bounds, encode as JPEG
    pub fn normalize(&self, data: &[u8]) -> Result<NormalizedImage> {
        let img =
            image::load_from_memory(data).map_err(|e| anyhow!("Failed to load image: {}", e))?;

        let (width, height) = img.dimensions();
        let img = if width > self.max_width || height > self.max_height {
            // `resize` keeps the aspect ratio and fits inside the box
            img.resize(self.max_width, self.max_height, FilterType::Lanczos3)
        } else {
            img
        };

        let (out_width, out_height) = img.dimensions();
        debug!(
            "Normalized image {}x{} -> {}x{} (quality {})",
            width, height, out_width, out_height, self.quality
        );

        Ok(NormalizedImage {
            data: self.encode_jpeg(&img)?,
            width: out_width,
            height: out_height,
        })
    }

    fn encode_jpeg(&self, img: &DynamicImage) -> Result<Vec<u8>> {
        // JPEG carries no alpha channel
        let rgb = img.to_rgb8();

        let mut out_data = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out_data, self.quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| anyhow!("Failed to encode JPEG: {}", e))?;
        Ok(out_data)
    }

    /// Normalizes `data` on the blocking pool and writes the result to
    /// `dest`, replacing any existing file. Returns the bytes written.
    pub async fn compress_to_file(&self, data: Bytes, dest: &Path) -> Result<u64> {
        let normalizer = self.clone();
        let normalized = tokio::task::spawn_blocking(move || normalizer.normalize(&data))
            .await
            .context("Image normalization task failed")??;

        tokio::fs::write(dest, &normalized.data)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;

        Ok(normalized.data.len() as u64)
    }
}
