//! Bounded keep-alive cache for deactivated branches.
//!
//! One cache exists per retaining lineage. Entries are keyed by the parked
//! branch's [`Discriminator`] and evicted oldest-deactivated first once the
//! cache grows past its capacity.

use crate::model::{InstanceId, Key, Node, NodeKind};
use std::collections::BTreeMap;

/// Cache key of a parked branch: its explicit key, else its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Discriminator {
    Key(Key),
    Kind(NodeKind),
}

impl Discriminator {
    pub fn of(node: &Node) -> Self {
        match &node.key {
            Some(key) => Discriminator::Key(key.clone()),
            None => Discriminator::Kind(node.kind.clone()),
        }
    }
}

impl std::fmt::Display for Discriminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Discriminator::Key(key) => write!(f, "key:{}", key),
            Discriminator::Kind(kind) => write!(f, "kind:{}", kind),
        }
    }
}

/// A deactivated subtree waiting to be reactivated.
///
/// `node` is the declaration the subtree was last reconciled against; it
/// becomes the previous node when the branch comes back.
#[derive(Debug, Clone)]
pub struct ParkedEntry {
    pub instance: InstanceId,
    pub node: Node,
    /// Deactivation order; lower is older
    pub seq: u64,
}

/// Entries pushed out by [`KeepAliveCache::park`].
#[derive(Debug, Default)]
pub struct Displaced {
    /// Older entry parked under the same discriminator
    pub replaced: Option<ParkedEntry>,
    /// Oldest entries dropped to stay within capacity
    pub evicted: Vec<ParkedEntry>,
}

impl Displaced {
    pub fn is_empty(&self) -> bool {
        self.replaced.is_none() && self.evicted.is_empty()
    }
}

/// Bounded store of parked branches for one lineage.
#[derive(Debug, Clone, Default)]
pub struct KeepAliveCache {
    entries: BTreeMap<Discriminator, ParkedEntry>,
    capacity: Option<usize>,
}

impl KeepAliveCache {
    /// `None` capacity means unbounded.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, discriminator: &Discriminator) -> bool {
        self.entries.contains_key(discriminator)
    }

    pub fn get(&self, discriminator: &Discriminator) -> Option<&ParkedEntry> {
        self.entries.get(discriminator)
    }

    /// Parked entries, oldest first
    pub fn entries(&self) -> Vec<&ParkedEntry> {
        let mut entries: Vec<&ParkedEntry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }

    /// Change the capacity, evicting the oldest entries that no longer fit.
    pub fn set_capacity(&mut self, capacity: Option<usize>) -> Vec<ParkedEntry> {
        self.capacity = capacity;
        self.evict_overflow()
    }

    /// Park a branch. Returns whatever had to leave the cache to make room.
    pub fn park(&mut self, discriminator: Discriminator, entry: ParkedEntry) -> Displaced {
        let replaced = self.entries.insert(discriminator, entry);
        let evicted = self.evict_overflow();
        Displaced { replaced, evicted }
    }

    /// Remove and return the branch parked under `discriminator`.
    pub fn take(&mut self, discriminator: &Discriminator) -> Option<ParkedEntry> {
        self.entries.remove(discriminator)
    }

    /// Empty the cache, oldest first. Used when the owning lineage is torn down.
    pub fn drain(&mut self) -> Vec<ParkedEntry> {
        let mut entries: Vec<ParkedEntry> =
            std::mem::take(&mut self.entries).into_values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }

    fn evict_overflow(&mut self) -> Vec<ParkedEntry> {
        let Some(capacity) = self.capacity else {
            return Vec::new();
        };
        let mut evicted = Vec::new();
        while self.entries.len() > capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(discriminator, _)| discriminator.clone());
            match oldest.and_then(|discriminator| self.entries.remove(&discriminator)) {
                Some(entry) => evicted.push(entry),
                None => break,
            }
        }
        evicted
    }
}
