use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use super::entry::Entry;

struct Scored {
    score: i64,
    seq: usize,
    entry: Entry,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    // Higher score first; on ties the earlier push wins.
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Max-heap of lookup results, deduplicated by value.
pub struct EntryPriorityQueue {
    heap: BinaryHeap<Scored>,
    seen: HashSet<u32>,
    bigram_boost_secs: u64,
    pushed: usize,
}

impl EntryPriorityQueue {
    pub fn new(bigram_boost_secs: u64) -> Self {
        Self {
            heap: BinaryHeap::new(),
            seen: HashSet::new(),
            bigram_boost_secs,
            pushed: 0,
        }
    }

    /// Returns `false` if an entry with the same value was already pushed.
    pub fn push(&mut self, entry: Entry) -> bool {
        if !self.seen.insert(crc32fast::hash(entry.value.as_bytes())) {
            tracing::debug!(value = %entry.value, "duplicate result");
            return false;
        }
        let score = entry.score(self.bigram_boost_secs);
        self.heap.push(Scored {
            score,
            seq: self.pushed,
            entry,
        });
        self.pushed += 1;
        true
    }

    pub fn pop(&mut self) -> Option<Entry> {
        self.heap.pop().map(|s| s.entry)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
