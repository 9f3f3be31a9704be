//! Transient messages shown in the status bar

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a notice stays up unless told otherwise
pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_secs(5);

/// Older notices beyond this are dropped
const MAX_PENDING: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub expires_at: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: NotificationLevel, duration: Duration) -> Self {
        Self {
            message: message.into(),
            level,
            expires_at: Instant::now() + duration,
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Newest-first stack of notices; the status bar shows the newest.
///
/// An unattended display tends to repeat the same failure on every retry,
/// so a notice identical to the newest one only pushes its expiry back.
#[derive(Debug)]
pub struct NotificationManager {
    notifications: VecDeque<Notification>,
    default_duration: Duration,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::with_default_duration(DEFAULT_NOTICE_DURATION)
    }

    pub fn with_default_duration(default_duration: Duration) -> Self {
        Self {
            notifications: VecDeque::new(),
            default_duration,
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) {
        let notification = Notification::new(message, level, self.default_duration);
        if let Some(newest) = self.notifications.front_mut() {
            if newest.level == level && newest.message == notification.message {
                newest.expires_at = notification.expires_at;
                return;
            }
        }
        self.notifications.push_front(notification);
        self.notifications.truncate(MAX_PENDING);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Info);
    }

    /// Drop notices expired at `now`; true if anything was removed
    pub fn update(&mut self, now: Instant) -> bool {
        let initial_len = self.notifications.len();
        self.notifications.retain(|n| !n.is_expired_at(now));
        self.notifications.len() != initial_len
    }

    pub fn current(&self) -> Option<&Notification> {
        self.notifications.front()
    }

    pub fn count(&self) -> usize {
        self.notifications.len()
    }
}
