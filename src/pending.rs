use std::collections::HashMap;
use std::time::{Duration, Instant};

use serenity::model::id::{ChannelId, MessageId};
use tracing::debug;

/// Where an anonymous reply should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTarget {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

struct Entry {
    target: ReplyTarget,
    registered_at: Instant,
}

/// In-memory table of confirmation-message id → reply target.
///
/// An entry lives until it is consumed, until it outlives `ttl`, or until
/// the table is full and it is the oldest. Nothing survives a restart.
pub struct PendingReplies {
    entries: HashMap<MessageId, Entry>,
    capacity: usize,
    ttl: Duration,
}

impl PendingReplies {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Track a confirmation message. Re-registering the same id overwrites.
    pub fn register(&mut self, confirmation_id: MessageId, target: ReplyTarget) {
        self.register_at(confirmation_id, target, Instant::now());
    }

    /// Consume the target for a confirmation id. Each id resolves at most once.
    pub fn take(&mut self, confirmation_id: MessageId) -> Option<ReplyTarget> {
        self.take_at(confirmation_id, Instant::now())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn register_at(&mut self, confirmation_id: MessageId, target: ReplyTarget, now: Instant) {
        self.purge_expired(now);
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&confirmation_id) {
            self.evict_oldest();
        }
        self.entries.insert(
            confirmation_id,
            Entry {
                target,
                registered_at: now,
            },
        );
    }

    fn take_at(&mut self, confirmation_id: MessageId, now: Instant) -> Option<ReplyTarget> {
        self.purge_expired(now);
        self.entries.remove(&confirmation_id).map(|e| e.target)
    }

    fn purge_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now.duration_since(e.registered_at) < ttl);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            debug!("Dropped {} expired pending replies", dropped);
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.registered_at)
            .map(|(id, _)| *id);
        if let Some(id) = oldest {
            self.entries.remove(&id);
            debug!("Pending reply table full, evicted confirmation {}", id);
        }
    }
}
