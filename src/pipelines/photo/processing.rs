// SPDX-License-Identifier: GPL-3.0-only

//! Frame post-processing for photo capture
//!
//! Converts raw RGBA camera frames to RGB and applies mirror correction.
//! Mirror correction matters for front-facing captures: the preview is
//! rendered mirrored, so the encoded image must be flipped the same way or
//! the saved photo appears reversed relative to what the user saw.

use crate::backends::camera::CameraFrame;
use crate::errors::CaptureError;
use image::RgbImage;
use tracing::debug;

/// Processed image data ready for encoding
#[derive(Debug)]
pub struct ProcessedImage {
    pub image: RgbImage,
    pub width: u32,
    pub height: u32,
    /// Whether mirror correction was applied
    pub mirrored: bool,
}

/// Frame processor for captured frames
pub struct FrameProcessor {
    mirror: bool,
}

impl FrameProcessor {
    /// Create a processor; `mirror` enables horizontal flip (front camera)
    pub fn new(mirror: bool) -> Self {
        Self { mirror }
    }

    /// Process a raw camera frame into an RGB image
    pub fn process(&self, frame: &CameraFrame) -> Result<ProcessedImage, CaptureError> {
        let mut image = rgba_to_rgb(&frame.data, frame.width, frame.height)?;

        if self.mirror {
            image::imageops::flip_horizontal_in_place(&mut image);
        }

        debug!(
            width = frame.width,
            height = frame.height,
            mirrored = self.mirror,
            "Frame processed"
        );

        Ok(ProcessedImage {
            width: frame.width,
            height: frame.height,
            image,
            mirrored: self.mirror,
        })
    }
}

/// Convert RGBA data to an RGB image (drop alpha channel)
fn rgba_to_rgb(rgba_data: &[u8], width: u32, height: u32) -> Result<RgbImage, CaptureError> {
    let expected_size = (width as usize) * (height as usize) * 4;
    if rgba_data.len() < expected_size {
        return Err(CaptureError::ProcessingFailed(format!(
            "RGBA data too small: expected {}, got {}",
            expected_size,
            rgba_data.len()
        )));
    }

    let rgb_data: Vec<u8> = rgba_data
        .chunks(4)
        .take((width * height) as usize)
        .flat_map(|rgba| [rgba[0], rgba[1], rgba[2]])
        .collect();

    RgbImage::from_raw(width, height, rgb_data).ok_or_else(|| {
        CaptureError::ProcessingFailed("failed to build RGB image from frame data".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    fn frame_with_gradient(width: u32, height: u32) -> CameraFrame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _y in 0..height {
            for x in 0..width {
                let r = (x * 255 / (width - 1)) as u8;
                data.extend_from_slice(&[r, 0, 0, 255]);
            }
        }
        CameraFrame {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            captured_at: Instant::now(),
        }
    }

    #[test]
    fn test_mirror_reverses_columns() {
        let frame = frame_with_gradient(4, 2);

        let plain = FrameProcessor::new(false).process(&frame).unwrap();
        let mirrored = FrameProcessor::new(true).process(&frame).unwrap();

        for y in 0..2 {
            for x in 0..4 {
                assert_eq!(
                    plain.image.get_pixel(x, y),
                    mirrored.image.get_pixel(3 - x, y),
                    "pixel ({}, {}) not mirrored",
                    x,
                    y
                );
            }
        }
        assert!(mirrored.mirrored);
        assert!(!plain.mirrored);
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let frame = CameraFrame {
            width: 640,
            height: 480,
            data: Arc::from(vec![0u8; 16].into_boxed_slice()),
            captured_at: Instant::now(),
        };
        let err = FrameProcessor::new(false).process(&frame).unwrap_err();
        assert!(matches!(err, CaptureError::ProcessingFailed(_)));
    }
}
