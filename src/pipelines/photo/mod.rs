// SPDX-License-Identifier: GPL-3.0-only

//! Async photo capture pipeline
//!
//! ```text
//! Camera frame → Processing (RGB + mirror) → JPEG encoding
//! ```
//!
//! Both stages are orchestrated here so the capture sequencer only deals
//! with one call. Frames come in as RGBA, leave as JPEG bytes.

pub mod encoding;
pub mod processing;

pub use encoding::{EncodedImage, PhotoEncoder};
pub use processing::{FrameProcessor, ProcessedImage};

use crate::backends::camera::CameraFrame;
use crate::errors::CaptureError;

/// Complete photo pipeline: process then encode
pub struct PhotoPipeline {
    quality: u8,
}

impl PhotoPipeline {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    /// Run the full pipeline on a captured frame
    ///
    /// `mirror` applies horizontal mirror correction (front-facing capture).
    pub async fn process_and_encode(
        &self,
        frame: &CameraFrame,
        mirror: bool,
    ) -> Result<EncodedImage, CaptureError> {
        let processed = FrameProcessor::new(mirror).process(frame)?;
        PhotoEncoder::new(self.quality).encode(processed).await
    }
}

impl Default for PhotoPipeline {
    fn default() -> Self {
        Self::new(crate::constants::capture::JPEG_QUALITY)
    }
}
