// SPDX-License-Identifier: GPL-3.0-only

//! Capture sequencer
//!
//! Drives the countdown-then-snapshot sequence that produces one captured
//! frame: guard against concurrent sequences, tick the countdown, fire the
//! flash cue, grab the current frame, run it through the photo pipeline,
//! and release the camera session.
//!
//! The state machine ([`CaptureSequencer`]) is pure and synchronous so it
//! can be tested without timers or devices. The async driver
//! ([`CaptureDriver`]) adds timing (tokio time, virtualizable in tests),
//! cancellation, and the session/pipeline wiring.
//!
//! Cancellation: dropping or firing the cancel handle between ticks
//! abandons the countdown, releases the device, and emits no frame. This
//! covers the capture UI closing mid-countdown - without it a stale timer
//! could fire a capture after the UI is gone.

use crate::constants::timing;
use crate::errors::CaptureError;
use crate::pipelines::photo::PhotoPipeline;
use crate::session::CameraSessionManager;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

/// Shared mutual-exclusion flag between the sequencer and the session
/// manager.
///
/// Set before the countdown begins and cleared on every exit path; the
/// session manager checks it to reject facing flips mid-sequence.
#[derive(Debug, Clone, Default)]
pub struct CaptureGuard(Arc<AtomicBool>);

impl CaptureGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a capture sequence is in progress
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.0.store(active, Ordering::SeqCst);
    }
}

/// Capture sequence state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    /// No sequence in progress
    Idle,
    /// Countdown running; `remaining` ticks until the snapshot
    Counting { remaining: u8 },
    /// Snapshot in progress
    Capturing,
}

/// Result of a countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// More ticks remain
    Continue,
    /// Countdown reached zero - fire the snapshot
    Fire,
}

/// The countdown-then-snapshot state machine
pub struct CaptureSequencer {
    state: SequenceState,
    guard: CaptureGuard,
}

impl CaptureSequencer {
    pub fn new(guard: CaptureGuard) -> Self {
        Self {
            state: SequenceState::Idle,
            guard,
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SequenceState::Idle
    }

    /// Start a new sequence with `ticks` countdown ticks.
    ///
    /// Rejected while a sequence is in progress. Zero ticks goes straight
    /// to the snapshot.
    pub fn begin(&mut self, ticks: u8) -> Result<(), CaptureError> {
        if self.state != SequenceState::Idle {
            return Err(CaptureError::InProgress);
        }
        self.state = if ticks == 0 {
            SequenceState::Capturing
        } else {
            SequenceState::Counting { remaining: ticks }
        };
        self.guard.set_active(true);
        Ok(())
    }

    /// Advance the countdown by one tick
    pub fn tick(&mut self) -> CountdownStep {
        match self.state {
            SequenceState::Counting { remaining: 1 } => {
                self.state = SequenceState::Capturing;
                CountdownStep::Fire
            }
            SequenceState::Counting { remaining } => {
                self.state = SequenceState::Counting {
                    remaining: remaining - 1,
                };
                CountdownStep::Continue
            }
            state => {
                warn!(?state, "Tick outside of countdown");
                CountdownStep::Continue
            }
        }
    }

    /// Return to idle and clear the guard.
    ///
    /// Called on every exit path - success, abort, or error.
    pub fn finish(&mut self) {
        self.state = SequenceState::Idle;
        self.guard.set_active(false);
    }
}

/// One frame produced by a successful capture sequence.
///
/// The JPEG bytes are reference-counted so the frame can be handed to the
/// upload slot and the presenter without copying.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub jpeg: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    /// Whether mirror correction was applied (front-facing capture)
    pub mirrored: bool,
}

/// Events emitted while a capture sequence runs.
///
/// The UI renders these: the countdown counter, the flash overlay (shown
/// for [`timing::FLASH_OVERLAY`]), the captured thumbnail, and errors.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Countdown tick; payload is the remaining tick count being shown
    CountdownTick(u8),
    /// Snapshot firing - show the flash overlay
    Flash,
    /// Sequence completed with exactly one frame
    Captured(CapturedFrame),
    /// Sequence aborted
    Failed(CaptureError),
    /// Camera released and capture UI should close
    SessionClosed,
}

/// Async driver for the capture sequence
pub struct CaptureDriver {
    pipeline: PhotoPipeline,
    countdown_ticks: u8,
}

impl CaptureDriver {
    pub fn new() -> Self {
        Self {
            pipeline: PhotoPipeline::default(),
            countdown_ticks: crate::constants::capture::DEFAULT_COUNTDOWN_TICKS,
        }
    }

    /// Override the number of countdown ticks
    pub fn with_countdown(mut self, ticks: u8) -> Self {
        self.countdown_ticks = ticks;
        self
    }

    /// Override the JPEG quality
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.pipeline = PhotoPipeline::new(quality);
        self
    }

    /// Run one capture sequence to completion.
    ///
    /// Steps are strictly sequential: readiness check → countdown →
    /// flash + snapshot → encode → publish → release. Exactly one
    /// [`CaptureEvent::Captured`] is emitted per successful sequence.
    ///
    /// The `cancel` receiver aborts the countdown when fired *or dropped*:
    /// the caller's handle going away means the capture UI is gone, and a
    /// capture must not fire afterwards.
    ///
    /// Error behavior follows the recovery rules: `NotReady` and
    /// `EncodeFailed` re-arm the sequencer but keep the device open for a
    /// retry; `Cancelled` releases the device.
    pub async fn run(
        &self,
        session: &CameraSessionManager,
        sequencer: &mut CaptureSequencer,
        events: &mpsc::UnboundedSender<CaptureEvent>,
        mut cancel: oneshot::Receiver<()>,
    ) -> Result<CapturedFrame, CaptureError> {
        // Readiness predicate: at least one displayable frame buffered
        if session.current_frame().is_none() {
            let _ = events.send(CaptureEvent::Failed(CaptureError::NotReady));
            return Err(CaptureError::NotReady);
        }

        sequencer.begin(self.countdown_ticks).inspect_err(|e| {
            let _ = events.send(CaptureEvent::Failed(e.clone()));
        })?;

        info!(ticks = self.countdown_ticks, "Capture sequence started");

        while let SequenceState::Counting { remaining } = sequencer.state() {
            let _ = events.send(CaptureEvent::CountdownTick(remaining));
            tokio::select! {
                _ = &mut cancel => {
                    info!("Countdown abandoned - releasing camera");
                    sequencer.finish();
                    session.close();
                    let _ = events.send(CaptureEvent::Failed(CaptureError::Cancelled));
                    return Err(CaptureError::Cancelled);
                }
                _ = tokio::time::sleep(timing::COUNTDOWN_TICK) => {}
            }
            sequencer.tick();
        }

        // Snapshot: flash cue concurrent with pixel capture
        let _ = events.send(CaptureEvent::Flash);

        let frame = match session.current_frame() {
            Some(frame) if frame.width > 0 && frame.height > 0 => frame,
            _ => {
                warn!("No frame buffered at snapshot time");
                sequencer.finish();
                let _ = events.send(CaptureEvent::Failed(CaptureError::NotReady));
                return Err(CaptureError::NotReady);
            }
        };

        let mirror = session.mirrored();
        let encoded = match self.pipeline.process_and_encode(&frame, mirror).await {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "Snapshot failed");
                sequencer.finish();
                let _ = events.send(CaptureEvent::Failed(e.clone()));
                return Err(e);
            }
        };

        let captured = CapturedFrame {
            jpeg: Arc::from(encoded.data.into_boxed_slice()),
            width: encoded.width,
            height: encoded.height,
            mirrored: encoded.mirrored,
        };

        // Publish, then release the session and close the capture UI
        session.close();
        sequencer.finish();
        let _ = events.send(CaptureEvent::Captured(captured.clone()));
        let _ = events.send(CaptureEvent::SessionClosed);

        info!(
            bytes = captured.jpeg.len(),
            width = captured.width,
            height = captured.height,
            mirrored = captured.mirrored,
            "Capture complete"
        );
        Ok(captured)
    }
}

impl Default for CaptureDriver {
    fn default() -> Self {
        Self::new()
    }
}
