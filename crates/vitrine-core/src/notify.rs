// ── Toast notifications ──
//
// A bounded queue of user-facing notices, passed around as an explicit
// handle. Clones share the same queue; subscribers are woken on change.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use strum::Display;
use tokio::sync::watch;
use uuid::Uuid;

/// Default number of notifications kept before the oldest is dropped.
pub const DEFAULT_CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    /// How long a notice of this kind stays up by default.
    pub fn default_duration(self) -> Duration {
        match self {
            Self::Success | Self::Info => Duration::seconds(5),
            Self::Warning => Duration::seconds(7),
            Self::Error => Duration::seconds(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    /// `None` stays until dismissed.
    #[serde(skip)]
    pub duration: Option<Duration>,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            message: None,
            created_at: Utc::now(),
            duration: Some(kind.default_duration()),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn sticky(mut self) -> Self {
        self.duration = None;
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.duration
            .is_some_and(|d| self.created_at + d <= now)
    }
}

type Queue = Arc<VecDeque<Notification>>;

/// Cloneable handle to a shared notification queue.
#[derive(Clone)]
pub struct Notifier {
    queue: Arc<watch::Sender<Queue>>,
    capacity: usize,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("pending", &self.queue.borrow().len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A capacity of 0 is raised to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let (queue, _) = watch::channel(Queue::default());
        Self {
            queue: Arc::new(queue),
            capacity: capacity.max(1),
        }
    }

    /// Enqueue `notification`, dropping the oldest beyond capacity.
    pub fn push(&self, notification: Notification) -> Uuid {
        let id = notification.id;
        let capacity = self.capacity;
        self.queue.send_modify(|queue| {
            let queue = Arc::make_mut(queue);
            queue.push_back(notification);
            while queue.len() > capacity {
                queue.pop_front();
            }
        });
        id
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) -> Uuid {
        self.push(Notification::new(NotificationKind::Success, title).message(message))
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) -> Uuid {
        self.push(Notification::new(NotificationKind::Error, title).message(message))
    }

    pub fn warning(&self, title: impl Into<String>, message: impl Into<String>) -> Uuid {
        self.push(Notification::new(NotificationKind::Warning, title).message(message))
    }

    pub fn info(&self, title: impl Into<String>, message: impl Into<String>) -> Uuid {
        self.push(Notification::new(NotificationKind::Info, title).message(message))
    }

    /// Remove one notification; returns whether it was present.
    pub fn dismiss(&self, id: Uuid) -> bool {
        self.queue.send_if_modified(|queue| {
            let before = queue.len();
            Arc::make_mut(queue).retain(|n| n.id != id);
            queue.len() != before
        })
    }

    pub fn clear(&self) {
        self.queue.send_if_modified(|queue| {
            let had_any = !queue.is_empty();
            *queue = Queue::default();
            had_any
        });
    }

    /// Drop every notification whose duration has elapsed at `now`.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let mut pruned = 0;
        self.queue.send_if_modified(|queue| {
            let before = queue.len();
            Arc::make_mut(queue).retain(|n| !n.is_expired(now));
            pruned = before - queue.len();
            pruned > 0
        });
        pruned
    }

    /// Oldest first.
    pub fn pending(&self) -> Vec<Notification> {
        self.queue.borrow().iter().cloned().collect()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<VecDeque<Notification>>> {
        self.queue.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_queue_drops_oldest() {
        let notifier = Notifier::with_capacity(2);
        notifier.info("one", "");
        notifier.info("two", "");
        notifier.info("three", "");
        let titles: Vec<String> = notifier.pending().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["two", "three"]);
    }

    #[test]
    fn clones_share_the_queue() {
        let notifier = Notifier::new();
        let other = notifier.clone();
        let id = other.error("Failed", "boom");
        assert_eq!(notifier.pending().len(), 1);
        assert!(notifier.dismiss(id));
        assert!(!notifier.dismiss(id));
        assert!(other.pending().is_empty());
    }

    #[test]
    fn prune_respects_durations() {
        let notifier = Notifier::new();
        notifier.success("Saved", "");
        notifier.push(Notification::new(NotificationKind::Warning, "Pinned").sticky());

        let later = Utc::now() + Duration::seconds(60);
        assert_eq!(notifier.prune_expired(later), 1);
        let pending = notifier.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "Pinned");

        notifier.clear();
        assert!(notifier.pending().is_empty());
    }

    #[test]
    fn subscribers_observe_pushes() {
        let notifier = Notifier::new();
        let rx = notifier.subscribe();
        notifier.warning("Careful", "half done");
        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(rx.borrow().len(), 1);
    }
}
