// SPDX-License-Identifier: GPL-3.0-only

//! Camera session lifecycle manager
//!
//! The session manager owns acquisition and release of the capture device,
//! facing-mode selection, and the mirror-rendering policy. It is the only
//! component allowed to open or close the device; everything else sees
//! frames through [`current_frame`](CameraSessionManager::current_frame).
//!
//! Invariants:
//! - at most one stream is open at a time (a second open replaces the first)
//! - flipping facing mode fully releases the old stream, waits a settle
//!   delay, then reopens with the opposite facing mode
//! - front-facing sessions are mirror-rendered

use crate::backends::camera::{
    BackendError, CameraDevice, CameraFrame, CaptureBackend, FacingMode, StreamConstraints,
};
use crate::constants::timing;
use crate::errors::CameraError;
use crate::sequencer::CaptureGuard;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

struct SessionState {
    backend: Box<dyn CaptureBackend>,
    facing: FacingMode,
    device: Option<CameraDevice>,
}

/// Camera session manager
///
/// Thread-safe and cheap to clone (shared state behind a mutex).
#[derive(Clone)]
pub struct CameraSessionManager {
    state: Arc<Mutex<SessionState>>,
    guard: CaptureGuard,
    mirror_front: bool,
}

impl CameraSessionManager {
    /// Create a manager over the given backend.
    ///
    /// The guard is shared with the capture sequencer so the manager can
    /// reject facing flips while a sequence is in progress.
    pub fn new(backend: Box<dyn CaptureBackend>, guard: CaptureGuard) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                backend,
                facing: FacingMode::default(),
                device: None,
            })),
            guard,
            mirror_front: true,
        }
    }

    /// Disable mirror rendering for front-facing sessions
    pub fn with_mirror_front(mut self, mirror_front: bool) -> Self {
        self.mirror_front = mirror_front;
        self
    }

    /// Open a session with the preferred facing mode.
    ///
    /// Enumerates devices first; if enumeration itself fails, proceeds
    /// optimistically with the backend's fallback device rather than
    /// blocking the user. The facing mode is a preference used to pick
    /// among devices, never a hard requirement.
    ///
    /// Opens with high-resolution constraints first, retries once relaxed,
    /// and surfaces [`CameraError::DeviceUnavailable`] if both fail.
    /// An already-open session is replaced, never duplicated.
    pub fn open(&self, preferred: FacingMode) -> Result<(), CameraError> {
        let mut state = self.state.lock().unwrap();

        let devices = match state.backend.enumerate_devices() {
            Ok(devices) => {
                if devices.is_empty() {
                    return Err(CameraError::NoCameraFound);
                }
                devices
            }
            Err(e) => {
                warn!(error = %e, "Device enumeration failed, proceeding with fallback device");
                vec![state.backend.fallback_device()]
            }
        };

        let device = select_device(&devices, preferred);
        info!(device = %device.path, facing = %preferred, "Opening camera session");

        if state.backend.is_open() {
            info!("Replacing existing stream");
            state.backend.close();
        }

        match state.backend.open(&device, &StreamConstraints::high_resolution()) {
            Ok(()) => {}
            Err(BackendError::PermissionDenied(_)) => {
                state.device = None;
                return Err(CameraError::PermissionDenied);
            }
            Err(first) => {
                warn!(error = %first, "High-resolution constraints failed, retrying relaxed");
                match state.backend.open(&device, &StreamConstraints::relaxed()) {
                    Ok(()) => {}
                    Err(BackendError::PermissionDenied(_)) => {
                        state.device = None;
                        return Err(CameraError::PermissionDenied);
                    }
                    Err(second) => {
                        state.device = None;
                        return Err(CameraError::DeviceUnavailable(second.to_string()));
                    }
                }
            }
        }

        state.facing = preferred;
        state.device = Some(device);
        Ok(())
    }

    /// Release the capture device and clear the frame sink.
    ///
    /// Idempotent - closing an already-closed session is a no-op.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.backend.close();
        state.device = None;
    }

    /// Flip to the opposite facing mode.
    ///
    /// Rejected while a capture sequence is in progress. The current stream
    /// is fully released before the settle delay; some hardware fails
    /// abrupt re-acquisition without the gap.
    pub async fn flip(&self) -> Result<FacingMode, CameraError> {
        if self.guard.is_active() {
            return Err(CameraError::Busy);
        }

        let target = self.facing().opposite();
        info!(target = %target, "Flipping facing mode");

        self.close();
        tokio::time::sleep(timing::FACING_FLIP_SETTLE).await;
        self.open(target)?;
        Ok(target)
    }

    /// Current facing mode
    pub fn facing(&self) -> FacingMode {
        self.state.lock().unwrap().facing
    }

    /// Whether output should be mirror-corrected.
    ///
    /// True when and only when the facing mode is front (and mirroring has
    /// not been disabled in configuration) - this applies both to the
    /// preview hint and to the captured pixel data.
    pub fn mirrored(&self) -> bool {
        self.facing().is_front() && self.mirror_front
    }

    /// The most recent frame from the open stream, if any.
    ///
    /// This is the readiness predicate the capture sequencer checks before
    /// starting a countdown and again before the snapshot.
    pub fn current_frame(&self) -> Option<CameraFrame> {
        self.state.lock().unwrap().backend.current_frame()
    }

    /// Whether a stream is currently open
    pub fn is_open(&self) -> bool {
        self.state.lock().unwrap().backend.is_open()
    }

    /// Number of streams currently held open (0 or 1)
    pub fn open_stream_count(&self) -> usize {
        self.state.lock().unwrap().backend.open_stream_count()
    }

    /// The device backing the open session
    pub fn current_device(&self) -> Option<CameraDevice> {
        self.state.lock().unwrap().device.clone()
    }

    /// Shared capture guard
    pub fn guard(&self) -> CaptureGuard {
        self.guard.clone()
    }
}

impl std::fmt::Debug for CameraSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("CameraSessionManager")
            .field("facing", &state.facing)
            .field("open", &state.backend.is_open())
            .finish()
    }
}

/// Pick the device whose reported facing matches the preference, falling
/// back to the first device.
fn select_device(devices: &[CameraDevice], preferred: FacingMode) -> CameraDevice {
    devices
        .iter()
        .find(|d| d.facing_hint() == Some(preferred))
        .unwrap_or(&devices[0])
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::synthetic::SyntheticBackend;

    fn manager(backend: SyntheticBackend) -> CameraSessionManager {
        CameraSessionManager::new(Box::new(backend), CaptureGuard::new())
    }

    #[test]
    fn test_open_picks_matching_facing_device() {
        let session = manager(SyntheticBackend::front_and_rear());
        session.open(FacingMode::Rear).unwrap();
        let device = session.current_device().unwrap();
        assert_eq!(device.path, "synthetic:1");
        assert_eq!(session.facing(), FacingMode::Rear);
        assert!(!session.mirrored());
    }

    #[test]
    fn test_facing_preference_is_not_a_requirement() {
        // A device with no facing hint still satisfies a front request
        let session = manager(SyntheticBackend::new());
        session.open(FacingMode::Front).unwrap();
        assert_eq!(session.facing(), FacingMode::Front);
        assert!(session.mirrored());
    }

    #[test]
    fn test_no_devices_is_reported() {
        let session = manager(SyntheticBackend::new().without_devices());
        let err = session.open(FacingMode::Front).unwrap_err();
        assert!(matches!(err, CameraError::NoCameraFound));
    }

    #[test]
    fn test_enumeration_failure_proceeds_optimistically() {
        let session = manager(SyntheticBackend::new().fail_enumeration());
        session.open(FacingMode::Front).unwrap();
        assert!(session.is_open());
    }

    #[test]
    fn test_permission_denied_is_classified() {
        let session = manager(SyntheticBackend::new().deny_permission());
        let err = session.open(FacingMode::Front).unwrap_err();
        assert!(matches!(err, CameraError::PermissionDenied));
    }

    #[test]
    fn test_relaxed_retry_after_constraint_failure() {
        // Low-resolution sensor fails the high tier, succeeds relaxed
        let session = manager(SyntheticBackend::new().with_native_resolution(320, 240));
        session.open(FacingMode::Front).unwrap();
        let frame = session.current_frame().unwrap();
        assert_eq!((frame.width, frame.height), (320, 240));
    }

    #[test]
    fn test_both_tiers_failing_is_unavailable() {
        let session = manager(SyntheticBackend::new().fail_next_opens(2));
        let err = session.open(FacingMode::Front).unwrap_err();
        assert!(matches!(err, CameraError::DeviceUnavailable(_)));
        assert!(!session.is_open());
    }

    #[test]
    fn test_close_is_idempotent() {
        let session = manager(SyntheticBackend::new());
        session.open(FacingMode::Front).unwrap();
        session.close();
        session.close();
        assert!(!session.is_open());
        assert_eq!(session.open_stream_count(), 0);
    }

    #[tokio::test]
    async fn test_flip_rejected_while_capturing() {
        let guard = CaptureGuard::new();
        let session =
            CameraSessionManager::new(Box::new(SyntheticBackend::front_and_rear()), guard.clone());
        session.open(FacingMode::Front).unwrap();

        guard.set_active(true);
        let err = session.flip().await.unwrap_err();
        assert!(matches!(err, CameraError::Busy));
        // Stream untouched by the rejected flip
        assert!(session.is_open());
    }
}
