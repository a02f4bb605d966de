//! Bounded interaction log: a fixed-capacity ring of structured events.
//!
//! Holds the most recent `capacity` entries for inspection (dashboards,
//! heartbeats, debugging). Writes are O(1) and memory stays bounded no
//! matter how many events pass through; the oldest entry is overwritten
//! once the ring is full.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::constants::DEFAULT_LOG_CAPACITY;

/// Keys owned by the log itself; caller attributes with these names are dropped.
const RESERVED_KEYS: [&str; 2] = ["timestamp", "type"];

/// An event as submitted by a caller, before the log stamps it.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    kind: String,
    attributes: Map<String, Value>,
}

impl Interaction {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Map::new(),
        }
    }

    /// Attach an attribute. A later value for the same key replaces the earlier one.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes(kind: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            kind: kind.into(),
            attributes,
        }
    }
}

/// A stored event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Aggregate view over the retained window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
}

struct Ring {
    slots: Box<[Option<LogEntry>]>,
    /// Next slot to write.
    head: usize,
    /// Populated slots, saturating at `slots.len()`.
    len: usize,
}

impl Ring {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: vec![None; capacity.get()].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, entry: LogEntry) {
        let capacity = self.slots.len();
        self.slots[self.head] = Some(entry);
        self.head = (self.head + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
    }

    /// The last `count` entries, oldest first. `count` must not exceed `len`.
    fn window(&self, count: usize) -> impl Iterator<Item = &LogEntry> + '_ {
        let capacity = self.slots.len();
        let start = (self.head + capacity - count) % capacity;
        (0..count).filter_map(move |i| self.slots[(start + i) % capacity].as_ref())
    }
}

/// Thread-safe bounded log shared by all request handlers.
pub struct InteractionLog {
    ring: Mutex<Ring>,
    capacity: NonZeroUsize,
}

impl InteractionLog {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            ring: Mutex::new(Ring::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Stamp `interaction` with the current time and append it, evicting the
    /// oldest entry when full.
    pub fn add(&self, interaction: Interaction) {
        let Interaction {
            kind,
            mut attributes,
        } = interaction;
        for key in RESERVED_KEYS {
            attributes.remove(key);
        }

        // Stamp under the lock so ring order and timestamp order agree.
        let mut ring = self.lock();
        ring.push(LogEntry {
            timestamp: Utc::now(),
            kind,
            attributes,
        });
    }

    /// The last `min(n, len)` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<LogEntry> {
        let ring = self.lock();
        let count = n.min(ring.len);
        ring.window(count).cloned().collect()
    }

    /// Count of retained entries, total and per type.
    pub fn stats(&self) -> LogStats {
        let ring = self.lock();
        let mut by_type = BTreeMap::new();
        for entry in ring.window(ring.len) {
            *by_type.entry(entry.kind.clone()).or_insert(0) += 1;
        }
        LogStats {
            total: ring.len,
            by_type,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget all entries. Slots are left in place and become unreachable.
    pub fn clear(&self) {
        let mut ring = self.lock();
        ring.head = 0;
        ring.len = 0;
    }

    // Every mutation leaves the ring consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Ring> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InteractionLog {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_LOG_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl std::fmt::Debug for InteractionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionLog")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}
