//! Short-lived user notifications (toasts).

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};

/// How long a notification stays visible
const NOTIFICATION_TTL_SECS: i64 = 5;

/// Oldest entries are dropped past this many
const MAX_NOTIFICATIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Notifications {
    items: VecDeque<Notification>,
    ttl: Duration,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifications {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
            ttl: Duration::seconds(NOTIFICATION_TTL_SECS),
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Level::Success, message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(message = %message, "User-facing error");
        self.push(Level::Error, message);
    }

    fn push(&mut self, level: Level, message: String) {
        if level != Level::Error {
            info!(?level, message = %message, "Notification");
        }
        self.items.push_back(Notification {
            level,
            message,
            created_at: Utc::now(),
        });
        while self.items.len() > MAX_NOTIFICATIONS {
            self.items.pop_front();
        }
    }

    /// Drop entries whose TTL has passed
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.items.retain(|n| now - n.created_at < ttl);
    }

    /// Newest notification still inside its TTL
    pub fn latest(&self, now: DateTime<Utc>) -> Option<&Notification> {
        self.items
            .iter()
            .rev()
            .find(|n| now - n.created_at < self.ttl)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_returns_newest() {
        let mut notes = Notifications::new();
        notes.success("first");
        notes.error("second");

        let latest = notes.latest(Utc::now()).unwrap();
        assert_eq!(latest.message, "second");
        assert_eq!(latest.level, Level::Error);
    }

    #[test]
    fn test_prune_drops_expired() {
        let mut notes = Notifications::new();
        notes.info("hello");
        assert_eq!(notes.len(), 1);

        let later = Utc::now() + Duration::seconds(NOTIFICATION_TTL_SECS + 1);
        assert!(notes.latest(later).is_none());
        notes.prune(later);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_queue_is_bounded() {
        let mut notes = Notifications::new();
        for i in 0..(MAX_NOTIFICATIONS + 5) {
            notes.info(format!("n{}", i));
        }
        assert_eq!(notes.len(), MAX_NOTIFICATIONS);
        assert_eq!(notes.iter().next().unwrap().message, "n5");
    }
}
