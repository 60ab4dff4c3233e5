// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for camera session lifecycle

use skincam::backends::camera::synthetic::SyntheticBackend;
use skincam::sequencer::CaptureGuard;
use skincam::session::CameraSessionManager;
use skincam::FacingMode;

#[test]
fn double_open_never_holds_two_streams() {
    let backend = SyntheticBackend::front_and_rear();
    let counters = backend.counters();
    let session = CameraSessionManager::new(Box::new(backend), CaptureGuard::new());

    session.open(FacingMode::Front).unwrap();
    session.open(FacingMode::Rear).unwrap();

    assert_eq!(counters.open_streams(), 1);
    assert_eq!(
        counters.max_open_streams(),
        1,
        "a second open must replace the first stream, not coexist with it"
    );
    assert_eq!(counters.total_opens(), 2);
    assert_eq!(session.facing(), FacingMode::Rear);
}

#[tokio::test(start_paused = true)]
async fn flip_releases_stream_before_reopening() {
    let backend = SyntheticBackend::front_and_rear();
    let counters = backend.counters();
    let session = CameraSessionManager::new(Box::new(backend), CaptureGuard::new());

    session.open(FacingMode::Front).unwrap();
    assert!(session.mirrored());

    let flip_session = session.clone();
    let flip = tokio::spawn(async move { flip_session.flip().await });

    // Run the flip task up to its settle sleep without advancing the clock
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(
        counters.open_streams(),
        0,
        "the old stream must be fully released during the settle delay"
    );

    let facing = flip.await.unwrap().unwrap();
    assert_eq!(facing, FacingMode::Rear);
    assert_eq!(counters.open_streams(), 1);
    assert_eq!(counters.max_open_streams(), 1);
    assert!(!session.mirrored());
}

#[tokio::test(start_paused = true)]
async fn flip_roundtrip_restores_facing() {
    let session = CameraSessionManager::new(
        Box::new(SyntheticBackend::front_and_rear()),
        CaptureGuard::new(),
    );
    session.open(FacingMode::Front).unwrap();

    session.flip().await.unwrap();
    session.flip().await.unwrap();

    assert_eq!(session.facing(), FacingMode::Front);
    assert!(session.mirrored());
    assert!(session.is_open());
}

#[test]
fn mirror_policy_follows_facing_mode() {
    let session = CameraSessionManager::new(
        Box::new(SyntheticBackend::front_and_rear()),
        CaptureGuard::new(),
    );

    session.open(FacingMode::Front).unwrap();
    assert!(session.mirrored());

    session.open(FacingMode::Rear).unwrap();
    assert!(!session.mirrored());
}

#[test]
fn mirror_can_be_disabled_in_configuration() {
    let session = CameraSessionManager::new(
        Box::new(SyntheticBackend::front_and_rear()),
        CaptureGuard::new(),
    )
    .with_mirror_front(false);

    session.open(FacingMode::Front).unwrap();
    assert!(!session.mirrored());
}
