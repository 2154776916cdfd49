// Dispatcher - moves pending items to agents with free capacity

pub mod constants;
mod shutdown;

use constants::*;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::request_processor::RequestProcessor;
use crate::domain::AgentType;
use crate::error::{AppError, Result};
use crate::port::{AssignmentLedger, LedgerEntry, TimeProvider};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Outcome of one hand-off attempt
enum Handoff {
    Dispatched,
    /// Ledger already holds the id; the item was discarded
    Dropped,
    /// Ledger write failed; the item is back in its slot
    Failed(AppError),
    Idle,
}

/// Background hand-off loop
///
/// Each round takes the highest ordered pending item whose agent is below
/// capacity and records it in the ledger as in progress. Items for saturated
/// agents stay queued in place, so they do not block other agents. An item
/// whose ledger write fails is skipped for the rest of the round.
pub struct Dispatcher {
    processor: Arc<RequestProcessor>,
    ledger: Arc<dyn AssignmentLedger>,
    time_provider: Arc<dyn TimeProvider>,
}

impl Dispatcher {
    pub fn new(
        processor: Arc<RequestProcessor>,
        ledger: Arc<dyn AssignmentLedger>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            processor,
            ledger,
            time_provider,
        }
    }

    /// Run until shutdown is signalled
    pub async fn run(&self, mut shutdown: ShutdownToken) -> Result<()> {
        info!("Dispatcher started");
        loop {
            if shutdown.is_shutdown() {
                break;
            }
            let pause = match self.dispatch_round().await {
                Ok(0) => IDLE_SLEEP_DURATION,
                Ok(count) => {
                    debug!(dispatched = count, "Dispatch round finished");
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "Dispatch round failed");
                    ERROR_RECOVERY_SLEEP_DURATION
                }
            };
            tokio::select! {
                _ = sleep(pause) => {},
                _ = shutdown.wait() => break,
            }
        }
        info!(pending = self.processor.pending_count(), "Dispatcher stopped");
        Ok(())
    }

    /// Dispatch up to `MAX_DISPATCH_BATCH` items. Returns how many moved.
    ///
    /// Fails only when nothing moved and at least one ledger write failed.
    pub async fn dispatch_round(&self) -> Result<usize> {
        let mut dispatched = 0;
        let mut skipped = HashSet::new();
        let mut last_error = None;

        while dispatched < MAX_DISPATCH_BATCH {
            match self.hand_off(&mut skipped).await {
                Handoff::Dispatched => dispatched += 1,
                Handoff::Dropped => {}
                Handoff::Failed(e) => last_error = Some(e),
                Handoff::Idle => break,
            }
        }

        match last_error {
            Some(e) if dispatched == 0 => Err(e),
            Some(e) => {
                warn!(error = %e, skipped = skipped.len(), "Some items could not be dispatched");
                Ok(dispatched)
            }
            None => Ok(dispatched),
        }
    }

    /// Hand off one item. Returns false if nothing could be dispatched.
    pub async fn dispatch_once(&self) -> Result<bool> {
        let mut skipped = HashSet::new();
        loop {
            match self.hand_off(&mut skipped).await {
                Handoff::Dispatched => return Ok(true),
                Handoff::Dropped => continue,
                Handoff::Failed(e) => return Err(e),
                Handoff::Idle => return Ok(false),
            }
        }
    }

    async fn hand_off(&self, skipped: &mut HashSet<String>) -> Handoff {
        let available = self.available_agents().await;
        if available.is_empty() {
            return Handoff::Idle;
        }

        let Some(item) = self.processor.dequeue_next_where(|item| {
            available.contains(&item.assigned_agent) && !skipped.contains(&item.request_id)
        }) else {
            return Handoff::Idle;
        };

        let entry = LedgerEntry::started(&item, self.time_provider.now_millis());
        match self.ledger.record_started(&entry).await {
            Ok(()) => {
                info!(
                    request_id = %entry.request_id,
                    agent = %entry.agent,
                    priority = %entry.priority,
                    "Work item dispatched"
                );
                Handoff::Dispatched
            }
            Err(AppError::Conflict(msg)) => {
                warn!(
                    request_id = %entry.request_id,
                    agent = %entry.agent,
                    reason = %msg,
                    "Request id already in ledger, dropping pending item"
                );
                Handoff::Dropped
            }
            Err(e) => {
                // Not handed off; restore so ordering and ETA survive
                skipped.insert(item.request_id.clone());
                self.processor.requeue(item);
                Handoff::Failed(e)
            }
        }
    }

    /// Agents with pending items and spare capacity
    async fn available_agents(&self) -> HashSet<AgentType> {
        let waiting: HashSet<AgentType> = self
            .processor
            .queue_snapshot()
            .into_iter()
            .map(|item| item.assigned_agent)
            .collect();

        let mut available = HashSet::new();
        for agent in waiting {
            if self.processor.balancer().is_available(agent).await {
                available.insert(agent);
            }
        }
        available
    }
}
