// SPDX-License-Identifier: GPL-3.0-only

//! Async JPEG encoding for captured frames
//!
//! Encoding runs on a blocking task so the capture flow never stalls the
//! runtime. Quality matches the 0.95 setting the service's web client used
//! for canvas exports.

use super::processing::ProcessedImage;
use crate::errors::CaptureError;
use image::RgbImage;
use tracing::debug;

/// Encoded image data ready for upload or saving
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub mirrored: bool,
}

/// Photo encoder
pub struct PhotoEncoder {
    quality: u8,
}

impl PhotoEncoder {
    /// Create an encoder with the given JPEG quality (1-100)
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    /// Encode a processed image asynchronously
    pub async fn encode(&self, processed: ProcessedImage) -> Result<EncodedImage, CaptureError> {
        let quality = self.quality;
        let width = processed.width;
        let height = processed.height;
        let mirrored = processed.mirrored;

        // Run encoding in a background task (CPU-bound)
        let data = tokio::task::spawn_blocking(move || encode_jpeg(&processed.image, quality))
            .await
            .map_err(|e| CaptureError::EncodeFailed(format!("encoding task error: {}", e)))??;

        if data.is_empty() {
            return Err(CaptureError::EncodeFailed(
                "encoder produced no data".to_string(),
            ));
        }

        debug!(size = data.len(), quality, "Encoding complete");

        Ok(EncodedImage {
            data,
            width,
            height,
            mirrored,
        })
    }

}

/// Encode an RGB image as JPEG
fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, CaptureError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);

    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| CaptureError::EncodeFailed(format!("JPEG encoding failed: {}", e)))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_jpeg_magic() {
        let image = RgbImage::from_pixel(8, 8, image::Rgb([200, 100, 50]));
        let data = encode_jpeg(&image, 95).unwrap();
        assert!(data.len() > 2);
        // JPEG SOI marker
        assert_eq!(&data[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_quality_is_clamped() {
        let encoder = PhotoEncoder::new(200);
        assert_eq!(encoder.quality, 100);
        let encoder = PhotoEncoder::new(0);
        assert_eq!(encoder.quality, 1);
    }
}
