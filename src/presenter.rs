// SPDX-License-Identifier: GPL-3.0-only

//! Thumbnail and notification presentation state
//!
//! Transient UI feedback after a capture: a persistent thumbnail of the
//! most recent frame and short-lived toast notifications. The presenter
//! holds pure state; expiry is driven by an explicit [`Presenter::expire`]
//! sweep so it can be tested without a clock, and rendering is left to
//! whatever front end consumes it (the CLI prints, a GUI would draw).

use crate::constants::timing;
use crate::sequencer::CapturedFrame;
use std::time::{Duration, Instant};
use tracing::debug;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A transient notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub level: NotificationLevel,
    posted_at: Instant,
}

impl Notification {
    /// Whether this notification has outlived its display window
    pub fn is_expired_at(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.posted_at) >= ttl
    }
}

/// The thumbnail of the most recent capture
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub frame: CapturedFrame,
    pub shown_at: Instant,
}

/// Presentation state for capture feedback
pub struct Presenter {
    thumbnail: Option<Thumbnail>,
    notifications: Vec<Notification>,
    next_id: u64,
    ttl: Duration,
}

impl Presenter {
    pub fn new() -> Self {
        Self {
            thumbnail: None,
            notifications: Vec::new(),
            next_id: 0,
            ttl: timing::NOTIFICATION_TTL,
        }
    }

    /// Override the notification display window
    pub fn with_notification_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Show a captured frame as the thumbnail, replacing any previous one.
    ///
    /// The thumbnail persists until dismissed or replaced by a newer
    /// capture.
    pub fn show_thumbnail(&mut self, frame: CapturedFrame) {
        debug!(bytes = frame.jpeg.len(), "Showing capture thumbnail");
        self.thumbnail = Some(Thumbnail {
            frame,
            shown_at: Instant::now(),
        });
    }

    /// Dismiss the thumbnail
    pub fn dismiss_thumbnail(&mut self) {
        self.thumbnail = None;
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    /// Post a transient notification; returns its id.
    ///
    /// Notifications are independent: posting a new one never dismisses
    /// an existing one.
    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.notifications.push(Notification {
            id,
            message: message.into(),
            level,
            posted_at: Instant::now(),
        });
        id
    }

    /// Currently visible notifications
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Remove notifications whose display window has passed, returning the
    /// removed entries (so a renderer can animate them out).
    pub fn expire(&mut self, now: Instant) -> Vec<Notification> {
        let ttl = self.ttl;
        let (expired, live): (Vec<_>, Vec<_>) = self
            .notifications
            .drain(..)
            .partition(|n| n.is_expired_at(now, ttl));
        self.notifications = live;
        expired
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn frame() -> CapturedFrame {
        CapturedFrame {
            jpeg: Arc::from(vec![0xFF, 0xD8, 0xFF, 0xD9].into_boxed_slice()),
            width: 640,
            height: 480,
            mirrored: true,
        }
    }

    #[test]
    fn test_thumbnail_replaced_by_newer_capture() {
        let mut presenter = Presenter::new();
        presenter.show_thumbnail(frame());

        let newer = CapturedFrame {
            width: 1280,
            ..frame()
        };
        presenter.show_thumbnail(newer);
        assert_eq!(presenter.thumbnail().unwrap().frame.width, 1280);

        presenter.dismiss_thumbnail();
        assert!(presenter.thumbnail().is_none());
    }

    #[test]
    fn test_notifications_are_independent() {
        let mut presenter = Presenter::new();
        let first = presenter.notify("Photo captured!", NotificationLevel::Success);
        let second = presenter.notify("Upload failed", NotificationLevel::Error);

        assert_ne!(first, second);
        assert_eq!(presenter.notifications().len(), 2);
    }

    #[test]
    fn test_notifications_expire_after_ttl() {
        let mut presenter = Presenter::new();
        presenter.notify("hello", NotificationLevel::Info);

        // Just posted - nothing expires
        assert!(presenter.expire(Instant::now()).is_empty());
        assert_eq!(presenter.notifications().len(), 1);

        let later = Instant::now() + timing::NOTIFICATION_TTL + Duration::from_millis(1);
        let expired = presenter.expire(later);
        assert_eq!(expired.len(), 1);
        assert!(presenter.notifications().is_empty());
    }
}
