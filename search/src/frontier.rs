//! Open list: the priority queue of locally inconsistent nodes.
//!
//! [`PriorityQueue`] is the capability the engine depends on. Two
//! implementations are provided:
//!
//! - [`BinaryHeapFrontier`]: `BinaryHeap` with lazy deletion. Superseded
//!   entries stay in the heap until they surface and are discarded; the top is
//!   always live, so peeks are O(1) and mutations are amortized O(log n).
//! - [`OrderedFrontier`]: `BTreeSet` of `(key, node)` pairs. Every operation
//!   is O(log n) and iteration order is fully deterministic.
//!
//! Ties between equal keys break toward the lower [`NodeId`] in both, so pop
//! order is consistent across implementations.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use crate::key::PriorityKey;
use crate::node::NodeId;

/// Violation of the open-list contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// `insert` of a node that is already queued.
    AlreadyQueued { node: NodeId },
    /// `update`/`remove` of a node that is not queued.
    NotQueued { node: NodeId },
    /// Peek or pop on an empty queue.
    Empty,
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyQueued { node } => write!(f, "{node} is already queued"),
            Self::NotQueued { node } => write!(f, "{node} is not queued"),
            Self::Empty => write!(f, "open list is empty"),
        }
    }
}

impl std::error::Error for QueueError {}

/// Ordered container of `(node, key)` pairs, one entry per node.
pub trait PriorityQueue {
    /// Add `node` under `key`.
    ///
    /// # Errors
    ///
    /// [`QueueError::AlreadyQueued`] if `node` is present.
    fn insert(&mut self, node: NodeId, key: PriorityKey) -> Result<(), QueueError>;

    /// Remove and return the node with the smallest key.
    ///
    /// # Errors
    ///
    /// [`QueueError::Empty`] if there is nothing to pop.
    fn remove_min(&mut self) -> Result<NodeId, QueueError>;

    /// The node with the smallest key.
    ///
    /// # Errors
    ///
    /// [`QueueError::Empty`] if the queue is empty.
    fn top_element(&self) -> Result<NodeId, QueueError>;

    /// The smallest key.
    ///
    /// # Errors
    ///
    /// [`QueueError::Empty`] if the queue is empty.
    fn top_key(&self) -> Result<PriorityKey, QueueError>;

    /// Reposition `node` under `key`.
    ///
    /// # Errors
    ///
    /// [`QueueError::NotQueued`] if `node` is absent.
    fn update(&mut self, node: NodeId, key: PriorityKey) -> Result<(), QueueError>;

    /// Delete `node`.
    ///
    /// # Errors
    ///
    /// [`QueueError::NotQueued`] if `node` is absent.
    fn remove(&mut self, node: NodeId) -> Result<(), QueueError>;

    fn contains(&self, node: NodeId) -> bool;

    /// Current key of `node`, if queued.
    fn key_of(&self, node: NodeId) -> Option<PriorityKey>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    fn clear(&mut self);

    /// Largest number of live entries held at once since construction.
    fn high_water(&self) -> usize;
}

// ---------------------------------------------------------------------------
// BinaryHeapFrontier
// ---------------------------------------------------------------------------

/// A heap entry. Live iff `stamp` matches the stamp recorded for `node`.
///
/// Field order gives the derived ordering: key, then node, then stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FrontierEntry {
    key: PriorityKey,
    node: NodeId,
    stamp: u64,
}

/// Minimum heap size before compaction is considered.
const COMPACTION_FLOOR: usize = 64;

/// Binary-heap open list with lazy deletion.
///
/// `BinaryHeap` is a max-heap, so entries are wrapped in `Reverse` to pop the
/// smallest key first. `update` and `remove` only touch the `live` index;
/// superseded heap entries are skipped when they reach the top.
#[derive(Debug, Default)]
pub struct BinaryHeapFrontier {
    heap: BinaryHeap<Reverse<FrontierEntry>>,
    live: HashMap<NodeId, (PriorityKey, u64)>,
    next_stamp: u64,
    high_water: usize,
}

impl BinaryHeapFrontier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of heap entries including superseded ones.
    #[must_use]
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    fn push(&mut self, node: NodeId, key: PriorityKey) {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        self.live.insert(node, (key, stamp));
        self.heap.push(Reverse(FrontierEntry { key, node, stamp }));
        self.high_water = self.high_water.max(self.live.len());
    }

    fn is_live(&self, entry: &FrontierEntry) -> bool {
        self.live
            .get(&entry.node)
            .is_some_and(|&(_, stamp)| stamp == entry.stamp)
    }

    /// Restore "the heap top is live" and bound the number of dead entries.
    fn settle(&mut self) {
        while let Some(Reverse(top)) = self.heap.peek() {
            if self.is_live(top) {
                break;
            }
            self.heap.pop();
        }
        if self.heap.len() > COMPACTION_FLOOR && self.heap.len() > 2 * self.live.len() {
            self.compact();
        }
    }

    /// Rebuild the heap from live entries only.
    fn compact(&mut self) {
        self.heap = self
            .live
            .iter()
            .map(|(&node, &(key, stamp))| Reverse(FrontierEntry { key, node, stamp }))
            .collect();
    }
}

impl PriorityQueue for BinaryHeapFrontier {
    fn insert(&mut self, node: NodeId, key: PriorityKey) -> Result<(), QueueError> {
        if self.live.contains_key(&node) {
            return Err(QueueError::AlreadyQueued { node });
        }
        self.push(node, key);
        Ok(())
    }

    fn remove_min(&mut self) -> Result<NodeId, QueueError> {
        let Reverse(top) = self.heap.pop().ok_or(QueueError::Empty)?;
        self.live.remove(&top.node);
        self.settle();
        Ok(top.node)
    }

    fn top_element(&self) -> Result<NodeId, QueueError> {
        self.heap
            .peek()
            .map(|Reverse(entry)| entry.node)
            .ok_or(QueueError::Empty)
    }

    fn top_key(&self) -> Result<PriorityKey, QueueError> {
        self.heap
            .peek()
            .map(|Reverse(entry)| entry.key)
            .ok_or(QueueError::Empty)
    }

    fn update(&mut self, node: NodeId, key: PriorityKey) -> Result<(), QueueError> {
        match self.live.get(&node) {
            None => Err(QueueError::NotQueued { node }),
            Some(&(current, _)) if current == key => Ok(()),
            Some(_) => {
                self.push(node, key);
                self.settle();
                Ok(())
            }
        }
    }

    fn remove(&mut self, node: NodeId) -> Result<(), QueueError> {
        if self.live.remove(&node).is_none() {
            return Err(QueueError::NotQueued { node });
        }
        self.settle();
        Ok(())
    }

    fn contains(&self, node: NodeId) -> bool {
        self.live.contains_key(&node)
    }

    fn key_of(&self, node: NodeId) -> Option<PriorityKey> {
        self.live.get(&node).map(|&(key, _)| key)
    }

    fn len(&self) -> usize {
        self.live.len()
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }

    fn high_water(&self) -> usize {
        self.high_water
    }
}

// ---------------------------------------------------------------------------
// OrderedFrontier
// ---------------------------------------------------------------------------

/// Ordered-set open list.
#[derive(Debug, Default)]
pub struct OrderedFrontier {
    order: BTreeSet<(PriorityKey, NodeId)>,
    keys: HashMap<NodeId, PriorityKey>,
    high_water: usize,
}

impl OrderedFrontier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PriorityQueue for OrderedFrontier {
    fn insert(&mut self, node: NodeId, key: PriorityKey) -> Result<(), QueueError> {
        if self.keys.contains_key(&node) {
            return Err(QueueError::AlreadyQueued { node });
        }
        self.keys.insert(node, key);
        self.order.insert((key, node));
        self.high_water = self.high_water.max(self.keys.len());
        Ok(())
    }

    fn remove_min(&mut self) -> Result<NodeId, QueueError> {
        let (_, node) = self.order.pop_first().ok_or(QueueError::Empty)?;
        self.keys.remove(&node);
        Ok(node)
    }

    fn top_element(&self) -> Result<NodeId, QueueError> {
        self.order.first().map(|&(_, node)| node).ok_or(QueueError::Empty)
    }

    fn top_key(&self) -> Result<PriorityKey, QueueError> {
        self.order.first().map(|&(key, _)| key).ok_or(QueueError::Empty)
    }

    fn update(&mut self, node: NodeId, key: PriorityKey) -> Result<(), QueueError> {
        let slot = self.keys.get_mut(&node).ok_or(QueueError::NotQueued { node })?;
        let old = std::mem::replace(slot, key);
        self.order.remove(&(old, node));
        self.order.insert((key, node));
        Ok(())
    }

    fn remove(&mut self, node: NodeId) -> Result<(), QueueError> {
        let key = self.keys.remove(&node).ok_or(QueueError::NotQueued { node })?;
        self.order.remove(&(key, node));
        Ok(())
    }

    fn contains(&self, node: NodeId) -> bool {
        self.keys.contains_key(&node)
    }

    fn key_of(&self, node: NodeId) -> Option<PriorityKey> {
        self.keys.get(&node).copied()
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn clear(&mut self) {
        self.order.clear();
        self.keys.clear();
    }

    fn high_water(&self) -> usize {
        self.high_water
    }
}
