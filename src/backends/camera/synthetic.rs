// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic frame source
//!
//! A capture backend that generates deterministic gradient frames instead of
//! talking to hardware. Used by the test suite and by the `--synthetic` CLI
//! flag for driving the capture flow on machines without a webcam.
//!
//! The gradient encodes the pixel position (red increases left to right,
//! green top to bottom), which makes mirror correction observable in the
//! encoded output.

use super::types::*;
use super::CaptureBackend;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Shared stream counters for invariant checks in tests.
///
/// `open` is the number of currently open streams, `max_open` the high-water
/// mark over the backend's lifetime, `total_opens` the number of successful
/// open calls.
#[derive(Debug, Default)]
pub struct StreamCounters {
    open: AtomicUsize,
    max_open: AtomicUsize,
    total_opens: AtomicUsize,
}

impl StreamCounters {
    pub fn open_streams(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn max_open_streams(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    pub fn total_opens(&self) -> usize {
        self.total_opens.load(Ordering::SeqCst)
    }

    fn record_open(&self) {
        let now_open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open.fetch_max(now_open, Ordering::SeqCst);
        self.total_opens.fetch_add(1, Ordering::SeqCst);
    }

    fn record_close(&self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

struct OpenStream {
    width: u32,
    height: u32,
    opened_at: Instant,
}

/// Deterministic synthetic capture backend
pub struct SyntheticBackend {
    devices: Vec<CameraDevice>,
    native_width: u32,
    native_height: u32,
    deny_permission: bool,
    fail_enumeration: bool,
    starve_frames: bool,
    corrupt_frames: bool,
    /// Remaining open attempts that should fail (exercises the layered
    /// constraint retry)
    failing_open_attempts: AtomicUsize,
    counters: Arc<StreamCounters>,
    stream: Option<OpenStream>,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self {
            devices: vec![CameraDevice {
                name: "Synthetic Camera".to_string(),
                path: "synthetic:0".to_string(),
                location: None,
            }],
            native_width: 1280,
            native_height: 720,
            deny_permission: false,
            fail_enumeration: false,
            starve_frames: false,
            corrupt_frames: false,
            failing_open_attempts: AtomicUsize::new(0),
            counters: Arc::new(StreamCounters::default()),
            stream: None,
        }
    }

    /// A backend exposing one front and one rear device
    pub fn front_and_rear() -> Self {
        let mut backend = Self::new();
        backend.devices = vec![
            CameraDevice {
                name: "Synthetic Camera".to_string(),
                path: "synthetic:0".to_string(),
                location: Some("front".to_string()),
            },
            CameraDevice {
                name: "Synthetic Camera".to_string(),
                path: "synthetic:1".to_string(),
                location: Some("back".to_string()),
            },
        ];
        backend
    }

    /// Override the simulated sensor resolution
    pub fn with_native_resolution(mut self, width: u32, height: u32) -> Self {
        self.native_width = width;
        self.native_height = height;
        self
    }

    /// Every open call fails with a permission error
    pub fn deny_permission(mut self) -> Self {
        self.deny_permission = true;
        self
    }

    /// Enumeration itself errors (devices may still be opened)
    pub fn fail_enumeration(mut self) -> Self {
        self.fail_enumeration = true;
        self
    }

    /// Remove all devices
    pub fn without_devices(mut self) -> Self {
        self.devices.clear();
        self
    }

    /// The open stream never buffers a frame
    pub fn without_frames(mut self) -> Self {
        self.starve_frames = true;
        self
    }

    /// Frames carry a truncated pixel buffer (exercises processing errors)
    pub fn with_corrupt_frames(mut self) -> Self {
        self.corrupt_frames = true;
        self
    }

    /// Make the next `n` open attempts fail
    pub fn fail_next_opens(self, n: usize) -> Self {
        self.failing_open_attempts.store(n, Ordering::SeqCst);
        self
    }

    /// Handle to the stream counters, valid after the backend is boxed
    pub fn counters(&self) -> Arc<StreamCounters> {
        Arc::clone(&self.counters)
    }

    /// Generate the deterministic gradient frame
    fn render_frame(width: u32, height: u32, captured_at: Instant) -> CameraFrame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let r = if width > 1 {
                    (x * 255 / (width - 1)) as u8
                } else {
                    0
                };
                let g = if height > 1 {
                    (y * 255 / (height - 1)) as u8
                } else {
                    0
                };
                data.extend_from_slice(&[r, g, 128, 255]);
            }
        }
        CameraFrame {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            captured_at,
        }
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for SyntheticBackend {
    fn enumerate_devices(&self) -> BackendResult<Vec<CameraDevice>> {
        if self.fail_enumeration {
            return Err(BackendError::Io("simulated enumeration failure".to_string()));
        }
        Ok(self.devices.clone())
    }

    fn fallback_device(&self) -> CameraDevice {
        self.devices.first().cloned().unwrap_or(CameraDevice {
            name: "Synthetic Camera".to_string(),
            path: "synthetic:0".to_string(),
            location: None,
        })
    }

    fn open(
        &mut self,
        device: &CameraDevice,
        constraints: &StreamConstraints,
    ) -> BackendResult<()> {
        if self.deny_permission {
            return Err(BackendError::PermissionDenied(
                "simulated permission denial".to_string(),
            ));
        }

        let remaining = self.failing_open_attempts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_open_attempts
                .store(remaining - 1, Ordering::SeqCst);
            return Err(BackendError::Io("simulated open failure".to_string()));
        }

        // The simulated sensor offers at most its native resolution
        let width = constraints.ideal_width.min(self.native_width);
        let height = constraints.ideal_height.min(self.native_height);
        if width < constraints.min_width || height < constraints.min_height {
            return Err(BackendError::ConstraintsUnsatisfied(format!(
                "{}x{} below the requested minimum {}x{}",
                width, height, constraints.min_width, constraints.min_height
            )));
        }

        self.close();

        debug!(device = %device.path, width, height, "Opening synthetic stream");
        self.counters.record_open();
        self.stream = Some(OpenStream {
            width,
            height,
            opened_at: Instant::now(),
        });
        Ok(())
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!("Closing synthetic stream");
            self.counters.record_close();
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn current_frame(&self) -> Option<CameraFrame> {
        if self.starve_frames {
            return None;
        }
        self.stream.as_ref().map(|s| {
            let mut frame = Self::render_frame(s.width, s.height, s.opened_at);
            if self.corrupt_frames {
                frame.data = Arc::from(frame.data[..16].to_vec().into_boxed_slice());
            }
            frame
        })
    }

    fn open_stream_count(&self) -> usize {
        self.counters.open_streams()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_close_is_counted() {
        let mut backend = SyntheticBackend::new();
        let counters = backend.counters();
        let device = backend.fallback_device();

        backend
            .open(&device, &StreamConstraints::high_resolution())
            .unwrap();
        assert_eq!(counters.open_streams(), 1);
        assert!(backend.current_frame().is_some());

        backend.close();
        backend.close(); // idempotent
        assert_eq!(counters.open_streams(), 0);
        assert!(backend.current_frame().is_none());
    }

    #[test]
    fn test_reopen_replaces_stream() {
        let mut backend = SyntheticBackend::new();
        let counters = backend.counters();
        let device = backend.fallback_device();

        backend
            .open(&device, &StreamConstraints::high_resolution())
            .unwrap();
        backend
            .open(&device, &StreamConstraints::relaxed())
            .unwrap();

        assert_eq!(counters.open_streams(), 1);
        assert_eq!(counters.max_open_streams(), 1);
        assert_eq!(counters.total_opens(), 2);
    }

    #[test]
    fn test_low_native_resolution_fails_first_tier() {
        let mut backend = SyntheticBackend::new().with_native_resolution(320, 240);
        let device = backend.fallback_device();

        let err = backend
            .open(&device, &StreamConstraints::high_resolution())
            .unwrap_err();
        assert!(matches!(err, BackendError::ConstraintsUnsatisfied(_)));

        backend
            .open(&device, &StreamConstraints::relaxed())
            .unwrap();
        let frame = backend.current_frame().unwrap();
        assert_eq!((frame.width, frame.height), (320, 240));
    }

    #[test]
    fn test_gradient_encodes_position() {
        let frame = SyntheticBackend::render_frame(640, 480, Instant::now());
        // Leftmost pixel has red 0, rightmost red 255
        assert_eq!(frame.data[0], 0);
        let last_px = ((640 * 480 - 1) * 4) as usize;
        assert_eq!(frame.data[last_px], 255);
    }
}
