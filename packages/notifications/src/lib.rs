#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-page toast and badge notification state.
//!
//! [`NotificationCenter`] is a pure state machine over injected time:
//! the owning view drives [`NotificationCenter::expire`] from its own
//! timer and cancels that timer on unmount, so no dismissal can touch
//! an unmounted view. Unread counts are session-scoped and not
//! persisted across reloads. Delivery guarantees of the underlying push
//! mechanism belong to the platform's push service, not to this crate.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// How long a toast stays on screen before auto-dismissal.
#[must_use]
pub fn toast_ttl() -> Duration {
    Duration::seconds(5)
}

/// A single on-screen toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Identity for targeted dismissal.
    pub id: Uuid,
    /// Message text.
    pub message: String,
    /// When the toast was raised.
    pub created_at: DateTime<Utc>,
    /// When the toast auto-dismisses.
    pub dismiss_at: DateTime<Utc>,
}

/// Badge counter plus the queue of live toasts.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    unread: u64,
    toasts: Vec<Toast>,
}

impl NotificationCenter {
    /// Creates an empty center.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            unread: 0,
            toasts: Vec::new(),
        }
    }

    /// Number of push/event messages received since the badge was last
    /// seen.
    #[must_use]
    pub const fn unread(&self) -> u64 {
        self.unread
    }

    /// Live toasts, oldest first.
    #[must_use]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Records a received push/event message: increments the badge and
    /// raises a toast. Returns the toast id.
    pub fn record(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> Uuid {
        let message = message.into();
        let id = Uuid::new_v4();
        log::debug!("Notification received: {message}");
        self.unread += 1;
        self.toasts.push(Toast {
            id,
            message,
            created_at: now,
            dismiss_at: now + toast_ttl(),
        });
        id
    }

    /// Marks the badge as seen, zeroing the unread count. The cleared
    /// state is session-only.
    pub const fn mark_seen(&mut self) {
        self.unread = 0;
    }

    /// Dismisses one toast by id. Returns whether it was present.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        self.toasts.len() != before
    }

    /// Drops every toast whose deadline has passed. Returns how many
    /// were dismissed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.dismiss_at > now);
        before - self.toasts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn record_increments_badge_and_raises_toast() {
        let mut center = NotificationCenter::new();
        center.record("incident reported nearby", now());
        center.record("line Autonorte alert", now());
        assert_eq!(center.unread(), 2);
        assert_eq!(center.toasts().len(), 2);
    }

    #[test]
    fn mark_seen_zeroes_badge_but_keeps_toasts() {
        let mut center = NotificationCenter::new();
        center.record("hello", now());
        center.mark_seen();
        assert_eq!(center.unread(), 0);
        assert_eq!(center.toasts().len(), 1);
    }

    #[test]
    fn expire_drops_only_past_deadline_toasts() {
        let mut center = NotificationCenter::new();
        center.record("old", now());
        center.record("new", now() + Duration::seconds(3));

        // At +5s the first toast is exactly at its deadline and goes;
        // the second has 3s left.
        let dropped = center.expire(now() + Duration::seconds(5));
        assert_eq!(dropped, 1);
        assert_eq!(center.toasts().len(), 1);
        assert_eq!(center.toasts()[0].message, "new");
    }

    #[test]
    fn dismiss_targets_one_toast() {
        let mut center = NotificationCenter::new();
        let first = center.record("first", now());
        center.record("second", now());
        assert!(center.dismiss(first));
        assert!(!center.dismiss(first));
        assert_eq!(center.toasts().len(), 1);
        assert_eq!(center.toasts()[0].message, "second");
    }
}
