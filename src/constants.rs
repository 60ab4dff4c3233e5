// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Interval between countdown ticks
    pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

    /// Settle delay between releasing a stream and reopening with the
    /// opposite facing mode. Some hardware fails abrupt re-acquisition
    /// without this gap.
    pub const FACING_FLIP_SETTLE: Duration = Duration::from_millis(200);

    /// How long the flash overlay stays visible around the snapshot
    pub const FLASH_OVERLAY: Duration = Duration::from_millis(200);

    /// Auto-dismiss delay for transient notifications
    pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);
}

/// Capture constants
pub mod capture {
    /// Default number of countdown ticks before the snapshot fires
    pub const DEFAULT_COUNTDOWN_TICKS: u8 = 3;

    /// JPEG quality for captured frames (matches the 0.95 canvas quality
    /// the service's web client used)
    pub const JPEG_QUALITY: u8 = 95;

    /// Preferred capture resolution (first constraint tier)
    pub const IDEAL_WIDTH: u32 = 1280;
    pub const IDEAL_HEIGHT: u32 = 720;

    /// Minimum acceptable resolution for the first constraint tier
    pub const MIN_WIDTH: u32 = 640;
    pub const MIN_HEIGHT: u32 = 480;

    /// Filename the upload pipeline sees for captured frames
    pub const CAPTURE_FILENAME: &str = "webcam-capture.jpg";
}

/// Upload pipeline constants
pub mod upload {
    use super::Duration;

    /// Default base URL of the skin-analysis backend
    pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

    /// Per-request timeout for backend calls
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Multipart field name for single-image analysis
    pub const ANALYZE_FIELD: &str = "image";

    /// Multipart field names for before/after comparison
    pub const COMPARE_BEFORE_FIELD: &str = "before";
    pub const COMPARE_AFTER_FIELD: &str = "after";
}

/// Resolution labels for device listings
pub fn get_resolution_label(width: u32) -> Option<&'static str> {
    match width {
        w if w >= 3840 => Some("4K"),
        w if w >= 2560 => Some("2K"),
        w if w >= 1920 => Some("HD"),
        w if w >= 1280 => Some("720p"),
        w if w >= 640 => Some("SD"),
        _ => None,
    }
}
