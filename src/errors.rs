// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture client

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera session errors (acquisition, release, facing flip)
    Camera(CameraError),
    /// Capture sequence errors (countdown, snapshot, encoding)
    Capture(CaptureError),
    /// Upload pipeline errors (backend HTTP API)
    Upload(UploadError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera session errors
///
/// These map to the acquisition failure modes the UI must distinguish:
/// a missing device, a denied permission prompt, and a device that exists
/// but cannot be started with any constraint tier.
#[derive(Debug, Clone)]
pub enum CameraError {
    /// No capture devices found during enumeration
    NoCameraFound,
    /// Device access denied by the OS or the user
    PermissionDenied,
    /// Device present but could not be opened with any constraint tier
    DeviceUnavailable(String),
    /// Session is busy (capture sequence in progress)
    Busy,
}

/// Capture sequence errors
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// A sequence is already in progress
    InProgress,
    /// The video sink has not buffered a displayable frame yet
    NotReady,
    /// Frame processing failed (bad dimensions, short buffer)
    ProcessingFailed(String),
    /// JPEG encoding produced no usable data
    EncodeFailed(String),
    /// The countdown was abandoned because the capture UI closed
    Cancelled,
}

/// Upload pipeline errors
#[derive(Debug, Clone)]
pub enum UploadError {
    /// No image has been selected for upload
    NoImageSelected,
    /// Connection-level failure (DNS, refused, timeout)
    Connection(String),
    /// Backend answered with a non-success HTTP status
    Status(u16),
    /// Backend reported a failure in its response body
    Backend(String),
    /// Response body could not be decoded
    Decode(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Upload(e) => write!(f, "Upload error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::PermissionDenied => {
                write!(f, "Camera access denied - check permissions")
            }
            CameraError::DeviceUnavailable(msg) => {
                write!(f, "Camera unavailable: {}", msg)
            }
            CameraError::Busy => write!(f, "Camera is busy"),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::InProgress => write!(f, "A capture sequence is already in progress"),
            CaptureError::NotReady => write!(f, "No frame available yet - camera still warming up"),
            CaptureError::ProcessingFailed(msg) => write!(f, "Frame processing failed: {}", msg),
            CaptureError::EncodeFailed(msg) => write!(f, "Encoding failed: {}", msg),
            CaptureError::Cancelled => write!(f, "Capture cancelled"),
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::NoImageSelected => write!(f, "No image selected"),
            UploadError::Connection(msg) => write!(f, "Connection failed: {}", msg),
            UploadError::Status(code) => write!(f, "Server returned HTTP {}", code),
            UploadError::Backend(msg) => write!(f, "Server error: {}", msg),
            UploadError::Decode(msg) => write!(f, "Invalid server response: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for UploadError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError::Upload(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            UploadError::Status(status.as_u16())
        } else if err.is_decode() {
            UploadError::Decode(err.to_string())
        } else {
            UploadError::Connection(err.to_string())
        }
    }
}
