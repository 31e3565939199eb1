//! Background sweep that withdraws stale bids and flags urgent tasks.

use super::lifecycle::{TaskLifecycleResult, TaskLifecycleService};
use crate::marketplace::{
    domain::TaskId,
    ports::{BidRepository, TaskRepository, UserStatsRepository},
};
use mockable::Clock;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Counters describing one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Bids moved to withdrawn.
    pub withdrawn: usize,
    /// Bids whose expiry could not be applied.
    pub failed: usize,
    /// Open tasks that entered the urgency window since the last sweep.
    pub newly_urgent: usize,
}

/// Periodic auto-withdraw and urgency sweep.
///
/// Deadlines that pass while a task is open impose no status change; such
/// tasks simply stop accepting bids.
pub struct BidExpiryScheduler<T, B, U, C>
where
    T: TaskRepository,
    B: BidRepository,
    U: UserStatsRepository,
    C: Clock + Send + Sync,
{
    service: Arc<TaskLifecycleService<T, B, U, C>>,
    period: Duration,
    notified_urgent: Mutex<HashSet<TaskId>>,
}

impl<T, B, U, C> BidExpiryScheduler<T, B, U, C>
where
    T: TaskRepository + 'static,
    B: BidRepository + 'static,
    U: UserStatsRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a scheduler sweeping every `period`.
    #[must_use]
    pub fn new(service: Arc<TaskLifecycleService<T, B, U, C>>, period: Duration) -> Self {
        Self {
            service,
            period,
            notified_urgent: Mutex::new(HashSet::new()),
        }
    }

    /// Runs one sweep.
    ///
    /// A failure to expire one bid is logged and counted; the sweep carries
    /// on with the remaining bids.
    ///
    /// # Errors
    ///
    /// Returns an error only when the candidate bids or open tasks cannot be
    /// listed.
    pub async fn sweep_once(&self) -> TaskLifecycleResult<SweepReport> {
        let mut report = SweepReport::default();
        for bid in self.service.expired_bids().await? {
            match self.service.expire_bid(bid.id()).await {
                Ok(Some(_)) => report.withdrawn = report.withdrawn.saturating_add(1),
                Ok(None) => debug!(bid_id = %bid.id(), "bid decided before expiry"),
                Err(err) => {
                    warn!(bid_id = %bid.id(), error = %err, "failed to expire bid");
                    report.failed = report.failed.saturating_add(1);
                }
            }
        }

        let open = self.service.list_open_tasks(None).await?;
        let urgent: Vec<_> = {
            let mut notified = self
                .notified_urgent
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let open_ids: HashSet<TaskId> = open.iter().map(|view| view.task.id()).collect();
            notified.retain(|task_id| open_ids.contains(task_id));
            open.into_iter()
                .filter(|view| view.is_urgent && notified.insert(view.task.id()))
                .collect()
        };
        for view in &urgent {
            self.service.notify_deadline_approaching(&view.task);
        }
        report.newly_urgent = urgent.len();

        info!(
            withdrawn = report.withdrawn,
            failed = report.failed,
            newly_urgent = report.newly_urgent,
            "expiry sweep finished"
        );
        Ok(report)
    }

    /// Runs sweeps on a fixed interval until `shutdown` is cancelled.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => {
                        info!("expiry scheduler stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(err) = self.sweep_once().await {
                            error!(error = %err, "expiry sweep failed");
                        }
                    }
                }
            }
        })
    }
}
