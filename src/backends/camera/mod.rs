// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! This module provides a trait-based abstraction over capture devices.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ CameraSessionManager │  ← Lifecycle, facing selection, mirror policy
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │ CaptureBackend trait │  ← Common interface
//! └──────────┬───────────┘
//!            │
//!      ┌─────┴─────┐
//!      ▼           ▼
//!  ┌──────┐  ┌───────────┐
//!  │ V4L2 │  │ Synthetic │
//!  └──────┘  └───────────┘
//! ```
//!
//! The synthetic backend produces deterministic frames for tests and for
//! driving the capture flow on machines without a webcam.

pub mod synthetic;
pub mod types;
#[cfg(target_os = "linux")]
pub mod v4l2;

pub use types::*;

/// Capture device backend trait
///
/// All backends provide device enumeration, stream lifecycle, and access to
/// the most recent frame. Backends never decide *which* device or facing
/// mode to use - that is the session manager's job.
pub trait CaptureBackend: Send + Sync {
    /// Enumerate available capture devices
    ///
    /// An error here means enumeration itself failed (not that no devices
    /// exist); callers may still attempt to open the fallback device.
    fn enumerate_devices(&self) -> BackendResult<Vec<CameraDevice>>;

    /// A device to try when enumeration fails
    fn fallback_device(&self) -> CameraDevice;

    /// Open a capture stream on the given device
    ///
    /// Replaces any previously open stream. The stream keeps feeding the
    /// latest-frame slot until [`close`](Self::close) is called.
    fn open(&mut self, device: &CameraDevice, constraints: &StreamConstraints)
    -> BackendResult<()>;

    /// Stop the stream and release the device
    ///
    /// Idempotent - closing an already-closed backend is a no-op.
    fn close(&mut self);

    /// Whether a stream is currently open
    fn is_open(&self) -> bool;

    /// The most recent frame from the open stream
    ///
    /// `None` until the stream has buffered at least one displayable frame;
    /// this is the readiness predicate the capture sequencer checks.
    fn current_frame(&self) -> Option<CameraFrame>;

    /// Number of streams this backend currently holds open.
    ///
    /// Diagnostics for the single-stream invariant; always 0 or 1 for the
    /// real backend.
    fn open_stream_count(&self) -> usize;
}

/// Get the default backend for this platform
#[cfg(target_os = "linux")]
pub fn default_backend() -> Box<dyn CaptureBackend> {
    Box::new(v4l2::V4l2Backend::new())
}

#[cfg(not(target_os = "linux"))]
pub fn default_backend() -> Box<dyn CaptureBackend> {
    Box::new(synthetic::SyntheticBackend::new())
}
