// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use crate::constants::capture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Which physical camera a capture device is streaming from.
///
/// Front (selfie) cameras are mirror-rendered so users see themselves as
/// in a mirror; rear cameras are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FacingMode {
    /// Front / selfie camera
    Front,
    /// Rear / world-facing camera
    #[default]
    Rear,
}

impl FacingMode {
    /// Get the opposite facing mode (used by the flip operation)
    pub fn opposite(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Rear,
            FacingMode::Rear => FacingMode::Front,
        }
    }

    /// Whether this facing mode triggers mirror correction
    pub fn is_front(self) -> bool {
        matches!(self, FacingMode::Front)
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::Front => write!(f, "front"),
            FacingMode::Rear => write!(f, "rear"),
        }
    }
}

impl std::str::FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "front" | "selfie" | "user" => Ok(FacingMode::Front),
            "rear" | "back" | "environment" => Ok(FacingMode::Rear),
            other => Err(format!("unknown facing mode '{}'", other)),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone)]
pub struct CameraDevice {
    /// Human-readable name (V4L2 card name or synthetic label)
    pub name: String,
    /// Path to the capture device (e.g., /dev/video0)
    pub path: String,
    /// Reported camera location, when the platform exposes one
    pub location: Option<String>,
}

impl CameraDevice {
    /// Guess the facing mode from the device's reported name/location.
    ///
    /// Linux exposes no portable front/rear flag for UVC webcams, so this
    /// is a best-effort hint used to honor the facing *preference* when
    /// selecting among several devices.
    pub fn facing_hint(&self) -> Option<FacingMode> {
        let haystack = match &self.location {
            Some(loc) => format!("{} {}", self.name, loc).to_lowercase(),
            None => self.name.to_lowercase(),
        };
        if haystack.contains("front") || haystack.contains("integrated") {
            Some(FacingMode::Front)
        } else if haystack.contains("back") || haystack.contains("rear") {
            Some(FacingMode::Rear)
        } else {
            None
        }
    }
}

/// Constraints for opening a capture stream.
///
/// The facing mode is a preference, never a hard requirement: a device that
/// cannot satisfy it is still acceptable. Resolution is layered - the first
/// tier asks for the ideal resolution with a minimum floor, the relaxed tier
/// accepts whatever the device offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl StreamConstraints {
    /// First attempt: high-resolution constraints (ideal 1280x720, 16:9,
    /// at least 640x480)
    pub fn high_resolution() -> Self {
        Self {
            ideal_width: capture::IDEAL_WIDTH,
            ideal_height: capture::IDEAL_HEIGHT,
            min_width: capture::MIN_WIDTH,
            min_height: capture::MIN_HEIGHT,
        }
    }

    /// Retry attempt: relaxed minimums, accept whatever the device offers
    pub fn relaxed() -> Self {
        Self {
            ideal_width: capture::MIN_WIDTH,
            ideal_height: capture::MIN_HEIGHT,
            min_width: 1,
            min_height: 1,
        }
    }
}

/// A single frame from the camera, in RGBA with no row padding.
///
/// Frame data is reference-counted so frames can be cloned into the
/// latest-frame slot and handed to the photo pipeline without copying
/// pixels.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, `width * height * 4` bytes
    pub data: Arc<[u8]>,
    /// Timestamp when the frame was captured
    pub captured_at: Instant,
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Device access denied by the OS
    PermissionDenied(String),
    /// Device path does not exist or disappeared
    DeviceNotFound(String),
    /// Device cannot satisfy the requested constraints
    ConstraintsUnsatisfied(String),
    /// I/O error talking to the device
    Io(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::ConstraintsUnsatisfied(msg) => {
                write!(f, "Constraints unsatisfied: {}", msg)
            }
            BackendError::Io(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_opposite_roundtrip() {
        assert_eq!(FacingMode::Front.opposite(), FacingMode::Rear);
        assert_eq!(FacingMode::Rear.opposite().opposite(), FacingMode::Rear);
    }

    #[test]
    fn test_facing_hint_from_name() {
        let dev = CameraDevice {
            name: "Integrated Front Camera".to_string(),
            path: "/dev/video0".to_string(),
            location: None,
        };
        assert_eq!(dev.facing_hint(), Some(FacingMode::Front));

        let dev = CameraDevice {
            name: "USB Camera".to_string(),
            path: "/dev/video2".to_string(),
            location: Some("back".to_string()),
        };
        assert_eq!(dev.facing_hint(), Some(FacingMode::Rear));

        let dev = CameraDevice {
            name: "HD Webcam C920".to_string(),
            path: "/dev/video4".to_string(),
            location: None,
        };
        assert_eq!(dev.facing_hint(), None);
    }
}
