//! Fixed-capacity LRU keyed by fingerprint.
//!
//! Nodes live in a slab and are threaded into a doubly linked recency list by
//! index, so chain links between entries never hold references.

use std::collections::HashMap;

use super::entry::Entry;

#[derive(Debug, Clone)]
struct Node {
    fp: u32,
    entry: Entry,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct HistoryCache {
    capacity: usize,
    index: HashMap<u32, usize>,
    nodes: Vec<Node>,
    free: Vec<usize>,
    /// Most recently used.
    head: Option<usize>,
    /// Least recently used.
    tail: Option<usize>,
}

impl HistoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            index: HashMap::new(),
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, fp: u32) -> bool {
        self.index.contains_key(&fp)
    }

    /// Look up without touching recency.
    pub fn lookup(&self, fp: u32) -> Option<&Entry> {
        self.index.get(&fp).map(|&i| &self.nodes[i].entry)
    }

    pub fn lookup_mut(&mut self, fp: u32) -> Option<&mut Entry> {
        let i = *self.index.get(&fp)?;
        Some(&mut self.nodes[i].entry)
    }

    /// Most recently used entry.
    pub fn head(&self) -> Option<&Entry> {
        self.head.map(|i| &self.nodes[i].entry)
    }

    /// Mark `fp` as most recently used and return its entry. A missing key
    /// gets a fresh default entry, evicting the least recently used one when
    /// the cache is full.
    pub fn insert(&mut self, fp: u32) -> &mut Entry {
        if let Some(&i) = self.index.get(&fp) {
            self.unlink(i);
            self.push_front(i);
            return &mut self.nodes[i].entry;
        }

        if self.index.len() >= self.capacity {
            if let Some(lru) = self.tail {
                let evicted = self.nodes[lru].fp;
                self.erase(evicted);
            }
        }

        let node = Node {
            fp,
            entry: Entry::default(),
            prev: None,
            next: None,
        };
        let i = match self.free.pop() {
            Some(i) => {
                self.nodes[i] = node;
                i
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.index.insert(fp, i);
        self.push_front(i);
        &mut self.nodes[i].entry
    }

    /// Insert `entry` under `fp` as the most recently used record.
    pub fn insert_entry(&mut self, fp: u32, entry: Entry) {
        *self.insert(fp) = entry;
    }

    pub fn erase(&mut self, fp: u32) -> bool {
        let Some(i) = self.index.remove(&fp) else {
            return false;
        };
        self.unlink(i);
        self.nodes[i].entry = Entry::default();
        self.free.push(i);
        true
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    /// Entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            cache: self,
            cursor: self.head,
        }
    }

    /// Entries from least to most recently used, the order they are saved in.
    pub fn iter_lru(&self) -> impl Iterator<Item = (u32, &Entry)> + '_ {
        let mut cursor = self.tail;
        std::iter::from_fn(move || {
            let i = cursor?;
            let node = &self.nodes[i];
            cursor = node.prev;
            Some((node.fp, &node.entry))
        })
    }

    /// Fingerprints from most to least recently used.
    pub fn fingerprints(&self) -> Vec<u32> {
        self.iter().map(|(fp, _)| fp).collect()
    }

    fn unlink(&mut self, i: usize) {
        let (prev, next) = (self.nodes[i].prev, self.nodes[i].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[i].prev = None;
        self.nodes[i].next = None;
    }

    fn push_front(&mut self, i: usize) {
        self.nodes[i].prev = None;
        self.nodes[i].next = self.head;
        if let Some(h) = self.head {
            self.nodes[h].prev = Some(i);
        }
        self.head = Some(i);
        if self.tail.is_none() {
            self.tail = Some(i);
        }
    }
}

pub struct Iter<'a> {
    cache: &'a HistoryCache,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (u32, &'a Entry);

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.cursor?;
        let node = &self.cache.nodes[i];
        self.cursor = node.next;
        Some((node.fp, &node.entry))
    }
}
