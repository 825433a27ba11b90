//! Keyed store with optional per-entry expiry.
//!
//! Expiry is checked lazily: an entry older than the store's time-to-live is
//! treated as absent and removed the next time it is looked up. Nothing runs
//! in the background, so stale entries stay in memory until touched.

use std::cell::Cell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Time source used for expiry decisions.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    updated: Instant,
}

#[derive(Debug)]
pub struct ExpiringMap<K, V> {
    entries: HashMap<K, Slot<V>>,
    ttl: Option<Duration>,
}

impl<K: Eq + Hash, V> ExpiringMap<K, V> {
    /// `ttl` of `None` keeps entries until they are removed.
    pub fn new(ttl: Option<Duration>) -> Self {
        ExpiringMap {
            entries: HashMap::new(),
            ttl,
        }
    }

    fn is_live(&self, updated: Instant, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(updated) < ttl,
            None => true,
        }
    }

    /// Inserts or replaces, restarting the entry's lifetime.
    pub fn insert(&mut self, key: K, value: V, now: Instant) -> Option<V> {
        self.entries
            .insert(
                key,
                Slot {
                    value,
                    updated: now,
                },
            )
            .map(|slot| slot.value)
    }

    pub fn get(&mut self, key: &K, now: Instant) -> Option<&V> {
        let live = match self.entries.get(key) {
            Some(slot) => self.is_live(slot.updated, now),
            None => return None,
        };
        if !live {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|slot| &slot.value)
    }

    pub fn contains(&mut self, key: &K, now: Instant) -> bool {
        self.get(key, now).is_some()
    }

    /// Removes and returns the value if it has not expired.
    pub fn remove(&mut self, key: &K, now: Instant) -> Option<V> {
        let slot = self.entries.remove(key)?;
        if self.is_live(slot.updated, now) {
            Some(slot.value)
        } else {
            None
        }
    }

    /// Live entries with the time they were last updated.
    pub fn iter(&self, now: Instant) -> impl Iterator<Item = (&K, &V, Instant)> + '_ {
        self.entries
            .iter()
            .filter(move |(_, slot)| self.is_live(slot.updated, now))
            .map(|(key, slot)| (key, &slot.value, slot.updated))
    }
}
