//! Interlock monitor: current enclosure flags plus change subscriptions.
//!
//! Subscribers get a bounded mailbox each. A change is queued only when a
//! flag actually flips; a full mailbox drops its oldest entry. Mailboxes are
//! drained synchronously by the owner at the start of its tick.

use cutter_common::consts::{INTERLOCK_MAILBOX_DEPTH, MAX_INTERLOCK_SUBSCRIBERS};
use cutter_common::safety::{Interlock, InterlockFlags};
use heapless::{Deque, Vec as FixedVec};
use thiserror::Error;
use tracing::{debug, info};

/// Handle returned by [`InterlockMonitor::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

/// One flag flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterlockChange {
    pub interlock: Interlock,
    /// New state: `true` when the safe condition holds.
    pub engaged: bool,
}

/// Drained mailbox contents.
pub type InterlockChanges = FixedVec<InterlockChange, INTERLOCK_MAILBOX_DEPTH>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InterlockError {
    #[error("interlock subscriber table full ({max} slots)", max = MAX_INTERLOCK_SUBSCRIBERS)]
    SubscribersFull,
}

#[derive(Debug)]
struct Subscriber {
    id: SubscriptionId,
    mailbox: Deque<InterlockChange, INTERLOCK_MAILBOX_DEPTH>,
}

#[derive(Debug)]
pub struct InterlockMonitor {
    flags: InterlockFlags,
    subscribers: FixedVec<Subscriber, MAX_INTERLOCK_SUBSCRIBERS>,
    next_id: u32,
}

impl InterlockMonitor {
    pub fn new(flags: InterlockFlags) -> Self {
        Self {
            flags,
            subscribers: FixedVec::new(),
            next_id: 0,
        }
    }

    #[inline]
    pub fn flags(&self) -> InterlockFlags {
        self.flags
    }

    #[inline]
    pub fn is_set(&self, interlock: Interlock) -> bool {
        self.flags.contains(interlock.flag())
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.flags.is_ready()
    }

    /// Update one sensor. Returns whether the flag flipped.
    pub fn set(&mut self, interlock: Interlock, engaged: bool) -> bool {
        if self.is_set(interlock) == engaged {
            return false;
        }
        self.flags.set(interlock.flag(), engaged);
        info!(?interlock, engaged, flags = ?self.flags, "interlock changed");

        let change = InterlockChange { interlock, engaged };
        for sub in self.subscribers.iter_mut() {
            if sub.mailbox.is_full() {
                sub.mailbox.pop_front();
            }
            // Cannot fail: a slot was just freed.
            let _ = sub.mailbox.push_back(change);
        }
        true
    }

    pub fn subscribe(&mut self) -> Result<SubscriptionId, InterlockError> {
        let id = SubscriptionId(self.next_id);
        self.subscribers
            .push(Subscriber {
                id,
                mailbox: Deque::new(),
            })
            .map_err(|_| InterlockError::SubscribersFull)?;
        self.next_id = self.next_id.wrapping_add(1);
        debug!(id = id.0, "interlock subscription added");
        Ok(id)
    }

    /// Returns whether `id` was subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        let removed = self.subscribers.len() != before;
        if removed {
            debug!(id = id.0, "interlock subscription removed");
        }
        removed
    }

    #[inline]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Take every queued change for `id`, oldest first.
    pub fn drain(&mut self, id: SubscriptionId) -> InterlockChanges {
        let mut out = InterlockChanges::new();
        if let Some(sub) = self.subscribers.iter_mut().find(|s| s.id == id) {
            while let Some(change) = sub.mailbox.pop_front() {
                let _ = out.push(change);
            }
        }
        out
    }
}

impl Default for InterlockMonitor {
    fn default() -> Self {
        Self::new(InterlockFlags::default())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
