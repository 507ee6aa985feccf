//! Per-command cooldown tracking.
//!
//! A capacity-bounded map from actor id to cooldown window. Entries carry a
//! purge deadline (twice the cooldown by default) so stale actors age out even
//! if their expiry callback never fires.

use crate::platform::UserId;
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CooldownEntry {
    expires_at: Instant,
    purge_at: Instant,
}

/// Capacity-bounded cooldown map. All operations are lock-free reads/writes on
/// a concurrent map; the read-then-commit window between [`CooldownMap::active`]
/// and [`CooldownMap::commit`] is a documented best-effort race (two
/// near-simultaneous invocations can both pass the gate).
#[derive(Debug)]
pub struct CooldownMap {
    entries: DashMap<UserId, CooldownEntry>,
    capacity: usize,
    /// Entry retention beyond its expiry.
    ttl: Duration,
}

impl CooldownMap {
    pub fn new(capacity: usize, cooldown: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            // Entries outlive their window by one extra cooldown span.
            ttl: cooldown * 2,
        }
    }

    /// The actor's current window expiry, if one is active.
    pub fn active(&self, actor: &UserId) -> Option<Instant> {
        let now = Instant::now();
        self.entries
            .get(actor)
            .map(|e| e.expires_at)
            .filter(|expires| *expires > now)
    }

    /// Commit a new window for the actor, evicting if at capacity.
    pub fn commit(&self, actor: &UserId, cooldown: Duration) -> Instant {
        let now = Instant::now();
        let expires_at = now + cooldown;
        if !self.entries.contains_key(actor) && self.entries.len() >= self.capacity {
            self.purge(now);
            if self.entries.len() >= self.capacity {
                self.evict_soonest();
            }
        }
        self.entries.insert(
            actor.clone(),
            CooldownEntry {
                expires_at,
                purge_at: now + self.ttl.max(cooldown),
            },
        );
        expires_at
    }

    /// Drop the actor's entry unconditionally (e.g. `SuccessNoCooldown`).
    pub fn clear(&self, actor: &UserId) {
        self.entries.remove(actor);
    }

    /// Drop the entry only if it still holds the expiry the caller scheduled.
    /// A newer committed window is left untouched.
    pub fn clear_if_scheduled(&self, actor: &UserId, scheduled: Instant) {
        self.entries
            .remove_if(actor, |_, entry| entry.expires_at <= scheduled);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge(&self, now: Instant) {
        self.entries.retain(|_, entry| entry.purge_at > now);
    }

    fn evict_soonest(&self) {
        let soonest = self
            .entries
            .iter()
            .min_by_key(|e| e.value().expires_at)
            .map(|e| e.key().clone());
        if let Some(actor) = soonest {
            self.entries.remove(&actor);
        }
    }
}
