use std::collections::VecDeque;

use crate::domain::Snapshot;

/// Ordered tick history. Appended by the tick only.
///
/// With `capacity == None` the buffer grows for the lifetime of the process;
/// otherwise the oldest snapshots are dropped once the capacity is reached.
#[derive(Debug, Clone, Default)]
pub struct History {
    snapshots: VecDeque<Snapshot>,
    capacity: Option<usize>,
    dropped: u64,
}

impl History {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity.unwrap_or(0).min(4096)),
            capacity: capacity.filter(|c| *c > 0),
            dropped: 0,
        }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push_back(snapshot);
        if let Some(cap) = self.capacity {
            while self.snapshots.len() > cap {
                self.snapshots.pop_front();
                self.dropped += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Snapshots evicted so far because of the capacity bound.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    /// The `count` most recent snapshots, oldest first.
    pub fn tail(&self, count: usize) -> Vec<Snapshot> {
        let start = self.snapshots.len().saturating_sub(count);
        self.snapshots.iter().skip(start).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }
}
