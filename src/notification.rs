//! Bounded, newest-first notification feed with unread accounting.

use std::fmt;

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Default number of notifications retained.
pub const FEED_CAP: usize = 200;

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Load,
    Alert,
    Delivery,
    Fuel,
    Scan,
    Success,
    Pod,
    Gps,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Alert => "alert",
            Self::Delivery => "delivery",
            Self::Fuel => "fuel",
            Self::Scan => "scan",
            Self::Success => "success",
            Self::Pod => "pod",
            Self::Gps => "gps",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content of a notification before the feed stamps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

impl NotificationDraft {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
        }
    }
}

/// A notification as held by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Local wall-clock time of creation, `HH:MM:SS`.
    pub time: String,
    pub read: bool,
}

/// Newest-first queue of notifications.
///
/// Holds at most `capacity` entries; pushing past that evicts the oldest.
/// [`unread_count`](NotificationFeed::unread_count) always equals the number
/// of retained entries with `read == false`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    entries: Vec<Notification>,
    unread_count: usize,
    #[serde(skip)]
    capacity: usize,
    #[serde(skip)]
    next_id: u64,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::with_capacity(FEED_CAP)
    }
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            unread_count: 0,
            capacity,
            next_id: 1,
        }
    }

    /// Stamp `draft` with an id and the current time and prepend it unread.
    pub fn push(&mut self, draft: NotificationDraft) -> Notification {
        let notification = Notification {
            id: self.next_id,
            title: draft.title,
            message: draft.message,
            kind: draft.kind,
            time: Local::now().format("%H:%M:%S").to_string(),
            read: false,
        };
        self.next_id += 1;

        self.entries.insert(0, notification.clone());
        self.unread_count += 1;

        if self.entries.len() > self.capacity {
            let evicted_unread = self
                .entries
                .drain(self.capacity..)
                .filter(|n| !n.read)
                .count();
            self.unread_count -= evicted_unread;
        }
        tracing::debug!(
            id = notification.id,
            kind = %notification.kind,
            title = %notification.title,
            "notification pushed"
        );
        notification
    }

    /// Mark every entry read. Idempotent.
    pub fn mark_all_read(&mut self) {
        for entry in &mut self.entries {
            entry.read = true;
        }
        self.unread_count = 0;
    }

    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    /// The `n` newest entries.
    pub fn recent(&self, n: usize) -> &[Notification] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }
}
