// Queue Domain Model

use crate::domain::agent::{AgentType, Category, Priority};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};

/// Work item identifier (caller-supplied, assumed unique)
pub type RequestId = String;

/// Pending work item
///
/// `assigned_agent` and `estimated_start_at` are fixed at creation and never
/// change while the item is queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub request_id: RequestId,
    pub client_id: String,
    pub category: Category,
    pub priority: Priority,
    pub assigned_agent: AgentType,
    pub enqueued_at: i64,        // epoch ms
    pub estimated_start_at: i64, // epoch ms

    /// Insertion counter, assigned by the queue. Breaks ties between items
    /// enqueued in the same millisecond.
    #[serde(default)]
    pub sequence: u64,
}

impl QueueItem {
    pub fn new(
        request_id: impl Into<String>,
        client_id: impl Into<String>,
        category: Category,
        priority: Priority,
        assigned_agent: AgentType,
        enqueued_at: i64,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            client_id: client_id.into(),
            category,
            priority,
            assigned_agent,
            enqueued_at,
            estimated_start_at: enqueued_at,
            sequence: 0,
        }
    }

    pub fn with_estimated_start(mut self, estimated_start_at: i64) -> Self {
        self.estimated_start_at = estimated_start_at;
        self
    }

    /// Sort key: priority DESC, enqueued_at ASC, sequence ASC
    fn order_key(&self) -> (Reverse<Priority>, i64, u64) {
        (Reverse(self.priority), self.enqueued_at, self.sequence)
    }

    fn queue_cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

/// Pending work items in strict total order
///
/// Backed by a vector kept sorted on every insertion (binary search for the
/// slot), so the head is always at index 0 and snapshots are already ordered.
#[derive(Debug, Default)]
pub struct PriorityQueue {
    items: Vec<QueueItem>,
    next_sequence: u64,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item at its ordered position
    pub fn enqueue(&mut self, mut item: QueueItem) {
        item.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.insert_sorted(item);
    }

    /// Put back an item previously taken from this queue, keeping its
    /// sequence so it regains its exact slot
    pub fn reinsert(&mut self, item: QueueItem) {
        self.insert_sorted(item);
    }

    fn insert_sorted(&mut self, item: QueueItem) {
        // Equal keys are impossible (sequence is unique), so Err is the slot
        let slot = self
            .items
            .binary_search_by(|probe| probe.queue_cmp(&item))
            .unwrap_or_else(|slot| slot);
        self.items.insert(slot, item);
    }

    /// Remove and return the head (highest priority, then oldest)
    pub fn dequeue_next(&mut self) -> Option<QueueItem> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    /// Remove and return the first item (in queue order) that satisfies `pred`
    pub fn dequeue_next_matching<F>(&mut self, pred: F) -> Option<QueueItem>
    where
        F: FnMut(&QueueItem) -> bool,
    {
        let idx = self.items.iter().position(pred)?;
        Some(self.items.remove(idx))
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Snapshot of items assigned to `agent`, in queue order
    pub fn by_agent(&self, agent: AgentType) -> Vec<QueueItem> {
        self.items
            .iter()
            .filter(|item| item.assigned_agent == agent)
            .cloned()
            .collect()
    }

    /// Number of items assigned to `agent` (no snapshot allocation)
    pub fn count_for_agent(&self, agent: AgentType) -> usize {
        self.items
            .iter()
            .filter(|item| item.assigned_agent == agent)
            .count()
    }

    /// Snapshot of items at `priority`, in queue order
    pub fn by_priority(&self, priority: Priority) -> Vec<QueueItem> {
        self.items
            .iter()
            .filter(|item| item.priority == priority)
            .cloned()
            .collect()
    }

    /// Snapshot of every pending item, in queue order
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.items.clone()
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.items.iter().any(|item| item.request_id == request_id)
    }

    /// 1-based rank of `request_id` among items assigned to the same agent
    pub fn position_of(&self, request_id: &str) -> Option<usize> {
        let target = self
            .items
            .iter()
            .find(|item| item.request_id == request_id)?;
        let rank = self
            .items
            .iter()
            .filter(|item| item.assigned_agent == target.assigned_agent)
            .position(|item| item.request_id == request_id)?;
        Some(rank + 1)
    }

    /// Remove the item with `request_id`. Returns false if no such item.
    pub fn remove_by_id(&mut self, request_id: &str) -> bool {
        match self
            .items
            .iter()
            .position(|item| item.request_id == request_id)
        {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
