// Request Processor - admission entry point

use crate::application::load_balancer::LoadBalancer;
use crate::domain::{AgentType, Category, Priority, PriorityQueue, QueueItem};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Result of admitting one work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub request_id: String,
    pub assigned_agent: AgentType,
    /// Epoch ms
    pub estimated_start_at: i64,
    /// 1-based rank among pending items of the same agent, counted after insertion
    pub queue_position: usize,
}

/// Submission with an optional caller-supplied id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub request_id: Option<String>,
    pub client_id: String,
    pub category: Category,
    pub priority: Priority,
}

/// Resolves an agent, enqueues the item and computes its start estimate
///
/// Owns the pending queue. All queue mutation goes through one mutex and the
/// lock is never held across an await point.
pub struct RequestProcessor {
    balancer: Arc<LoadBalancer>,
    queue: Mutex<PriorityQueue>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
}

impl RequestProcessor {
    pub fn new(
        balancer: Arc<LoadBalancer>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            balancer,
            queue: Mutex::new(PriorityQueue::new()),
            time_provider,
            id_provider,
        }
    }

    pub fn balancer(&self) -> &Arc<LoadBalancer> {
        &self.balancer
    }

    /// Admit a work item
    ///
    /// 1. Pick the least loaded eligible agent
    /// 2. Insert into the queue stamped with `now`
    /// 3. Position = pending items for that agent, including this one
    /// 4. ETA = now + avg_response_hours * position
    ///
    /// # Errors
    /// `AppError::LoadUnavailable` if no eligible agent's load could be read,
    /// `AppError::Conflict` if `request_id` is already pending.
    pub async fn process_request(
        &self,
        request_id: impl Into<String>,
        client_id: impl Into<String>,
        category: Category,
        priority: Priority,
    ) -> Result<Assignment> {
        let request_id = request_id.into();
        let agent = self.balancer.least_loaded_eligible(category).await?;
        let profile = self
            .balancer
            .registry()
            .get_profile(agent)
            .ok_or_else(|| AppError::Internal(format!("no profile for selected agent {}", agent)))?;

        let now = self.time_provider.now_millis();
        let item = QueueItem::new(request_id.clone(), client_id, category, priority, agent, now);

        let (queue_position, estimated_start_at) = {
            let mut queue = self.lock_queue();
            if queue.contains(&request_id) {
                return Err(AppError::Conflict(format!(
                    "request {} is already pending",
                    request_id
                )));
            }
            // Position counts the queue as it will be once this item is in
            let position = queue.count_for_agent(agent) + 1;
            let eta = now + profile.wait_millis(position);
            queue.enqueue(item.with_estimated_start(eta));
            (position, eta)
        };

        info!(
            request_id = %request_id,
            category = %category,
            priority = %priority,
            agent = %agent,
            queue_position = queue_position,
            estimated_start_at = estimated_start_at,
            "Work item admitted"
        );

        Ok(Assignment {
            request_id,
            assigned_agent: agent,
            estimated_start_at,
            queue_position,
        })
    }

    /// Admit a submission, generating a request id if the caller gave none
    pub async fn submit(&self, req: SubmitRequest) -> Result<Assignment> {
        let request_id = match req.request_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => self.id_provider.generate_id(),
        };
        self.process_request(request_id, req.client_id, req.category, req.priority)
            .await
    }

    /// Drop a pending item. False if it is not queued.
    pub fn cancel(&self, request_id: &str) -> bool {
        let removed = self.lock_queue().remove_by_id(request_id);
        if removed {
            info!(request_id = %request_id, "Pending work item cancelled");
        }
        removed
    }

    pub fn dequeue_next(&self) -> Option<QueueItem> {
        self.lock_queue().dequeue_next()
    }

    /// Remove the highest ordered item that passes `pred`
    pub fn dequeue_next_where<F>(&self, pred: F) -> Option<QueueItem>
    where
        F: FnMut(&QueueItem) -> bool,
    {
        self.lock_queue().dequeue_next_matching(pred)
    }

    /// Put back an item that could not be handed off. Keeps its original
    /// timestamp, sequence, agent and estimate.
    pub fn requeue(&self, item: QueueItem) {
        self.lock_queue().reinsert(item);
    }

    pub fn is_pending(&self, request_id: &str) -> bool {
        self.lock_queue().contains(request_id)
    }

    pub fn pending_count(&self) -> usize {
        self.lock_queue().size()
    }

    pub fn pending_for_agent(&self, agent: AgentType) -> Vec<QueueItem> {
        self.lock_queue().by_agent(agent)
    }

    pub fn pending_with_priority(&self, priority: Priority) -> Vec<QueueItem> {
        self.lock_queue().by_priority(priority)
    }

    pub fn queue_snapshot(&self) -> Vec<QueueItem> {
        self.lock_queue().snapshot()
    }

    pub fn clear(&self) {
        self.lock_queue().clear();
    }

    fn lock_queue(&self) -> MutexGuard<'_, PriorityQueue> {
        // PriorityQueue methods leave the vector sorted even if a caller
        // panicked while holding the guard
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::CapabilityRegistry;
    use crate::domain::MILLIS_PER_HOUR;
    use crate::port::id_provider::SequentialIdProvider;
    use crate::port::time_provider::mocks::ManualClock;
    use crate::port::InMemoryLoadSource;
    use tokio_test::{assert_err, assert_ok};

    const NOW: i64 = 1_700_000_000_000;
    const HOUR: i64 = MILLIS_PER_HOUR as i64;

    fn processor_with(source: Arc<InMemoryLoadSource>) -> (RequestProcessor, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(NOW));
        let balancer = Arc::new(LoadBalancer::new(
            Arc::new(CapabilityRegistry::standard()),
            source,
        ));
        let processor = RequestProcessor::new(
            balancer,
            clock.clone(),
            Arc::new(SequentialIdProvider::new("req")),
        );
        (processor, clock)
    }

    fn processor() -> RequestProcessor {
        processor_with(Arc::new(InMemoryLoadSource::new())).0
    }

    #[tokio::test]
    async fn test_first_support_request() {
        let processor = processor();

        let assignment = processor
            .process_request("r1", "c1", Category::Support, Priority::Medium)
            .await
            .unwrap();

        assert_eq!(assignment.assigned_agent, AgentType::Support);
        assert_eq!(assignment.queue_position, 1);
        assert_eq!(assignment.estimated_start_at, NOW + 2 * HOUR);
    }

    #[tokio::test]
    async fn test_content_positions_and_etas() {
        let processor = processor();

        let mut positions = vec![];
        let mut offsets = vec![];
        for i in 0..5 {
            let a = processor
                .process_request(format!("r{i}"), "c1", Category::Content, Priority::High)
                .await
                .unwrap();
            positions.push(a.queue_position);
            offsets.push(a.estimated_start_at - NOW);
        }

        assert_eq!(positions, vec![1, 2, 3, 4, 5]);
        assert_eq!(offsets, vec![3 * HOUR, 6 * HOUR, 9 * HOUR, 12 * HOUR, 15 * HOUR]);
    }

    #[tokio::test]
    async fn test_stored_item_carries_eta() {
        let processor = processor();
        let a = processor
            .process_request("r1", "c1", Category::Design, Priority::Low)
            .await
            .unwrap();

        let pending = processor.pending_for_agent(AgentType::Creative);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].estimated_start_at, a.estimated_start_at);
        assert_eq!(pending[0].enqueued_at, NOW);
    }

    #[tokio::test]
    async fn test_position_counts_only_same_agent() {
        let processor = processor();
        processor
            .process_request("s1", "c1", Category::Support, Priority::Low)
            .await
            .unwrap();
        processor
            .process_request("t1", "c1", Category::Development, Priority::Low)
            .await
            .unwrap();

        let a = processor
            .process_request("s2", "c1", Category::Support, Priority::Low)
            .await
            .unwrap();
        assert_eq!(a.queue_position, 2);
        assert_eq!(processor.pending_for_agent(AgentType::Support).len(), 2);
    }

    #[tokio::test]
    async fn test_position_includes_higher_priority_items_queued_later() {
        let (processor, clock) = processor_with(Arc::new(InMemoryLoadSource::new()));
        processor
            .process_request("a", "c1", Category::Other, Priority::Low)
            .await
            .unwrap();
        clock.advance(1000);

        let urgent = processor
            .process_request("b", "c1", Category::Other, Priority::Urgent)
            .await
            .unwrap();

        // Counted at enqueue time: two items for General now
        assert_eq!(urgent.queue_position, 2);
        assert_eq!(urgent.estimated_start_at, NOW + 1000 + 6 * HOUR);
    }

    #[tokio::test]
    async fn test_load_unavailable_propagates() {
        let source = Arc::new(InMemoryLoadSource::new());
        source.fail_for(AgentType::Analytics);
        let (processor, _) = processor_with(source);

        let result = processor
            .process_request("r1", "c1", Category::DataAnalysis, Priority::High)
            .await;

        assert!(matches!(result, Err(AppError::LoadUnavailable(_))));
        assert_eq!(processor.pending_count(), 0, "Nothing enqueued on failure");
    }

    #[tokio::test]
    async fn test_submit_generates_missing_id() {
        let processor = processor();

        let a = processor
            .submit(SubmitRequest {
                request_id: None,
                client_id: "c1".to_string(),
                category: Category::Marketing,
                priority: Priority::Medium,
            })
            .await
            .unwrap();
        assert_eq!(a.request_id, "req-1");

        let b = processor
            .submit(SubmitRequest {
                request_id: Some("mine".to_string()),
                client_id: "c1".to_string(),
                category: Category::Marketing,
                priority: Priority::Medium,
            })
            .await
            .unwrap();
        assert_eq!(b.request_id, "mine");
    }

    #[tokio::test]
    async fn test_cancel() {
        let processor = processor();
        processor
            .process_request("r1", "c1", Category::Consulting, Priority::Medium)
            .await
            .unwrap();

        assert!(processor.is_pending("r1"));
        assert!(processor.cancel("r1"));
        assert!(!processor.cancel("r1"));
        assert!(!processor.is_pending("r1"));
        assert_eq!(processor.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_dequeue_order_by_priority() {
        let processor = processor();
        for (id, priority) in [
            ("low", Priority::Low),
            ("urgent", Priority::Urgent),
            ("medium", Priority::Medium),
        ] {
            processor
                .process_request(id, "c1", Category::DataAnalysis, priority)
                .await
                .unwrap();
        }

        let order: Vec<_> = std::iter::from_fn(|| processor.dequeue_next())
            .map(|item| item.priority)
            .collect();
        assert_eq!(order, vec![Priority::Urgent, Priority::Medium, Priority::Low]);
    }

    #[tokio::test]
    async fn test_duplicate_pending_id_is_conflict() {
        let processor = processor();
        assert_ok!(
            processor
                .process_request("dup", "c1", Category::Support, Priority::High)
                .await
        );

        let err = assert_err!(
            processor
                .process_request("dup", "c2", Category::Content, Priority::Low)
                .await
        );
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(processor.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_requeue_keeps_place_among_same_millisecond_items() {
        let processor = processor();
        for id in ["a", "b"] {
            processor
                .process_request(id, "c1", Category::Support, Priority::High)
                .await
                .unwrap();
        }

        let a = processor.dequeue_next().unwrap();
        processor.requeue(a);

        let order: Vec<_> = processor
            .queue_snapshot()
            .into_iter()
            .map(|item| item.request_id)
            .collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admissions_get_distinct_positions() {
        const N: usize = 32;
        let processor = Arc::new(processor());

        let handles: Vec<_> = (0..N)
            .map(|i| {
                let processor = processor.clone();
                tokio::spawn(async move {
                    processor
                        .process_request(format!("r{i}"), "c1", Category::Support, Priority::Medium)
                        .await
                })
            })
            .collect();

        let mut positions = Vec::with_capacity(N);
        for handle in handles {
            positions.push(assert_ok!(handle.await.unwrap()).queue_position);
        }
        positions.sort_unstable();

        assert_eq!(positions, (1..=N).collect::<Vec<_>>());
        assert_eq!(processor.pending_count(), N);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_ids_admit_once() {
        let processor = Arc::new(processor());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let processor = processor.clone();
                tokio::spawn(async move {
                    processor
                        .process_request("same", "c1", Category::Design, Priority::High)
                        .await
                })
            })
            .collect();

        let mut admitted = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(AppError::Conflict(_)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(conflicts, 7);
        assert_eq!(processor.pending_count(), 1);
    }
}
