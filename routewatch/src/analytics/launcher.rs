//! Analytics run trigger surface.

use chrono::{Days, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::pipeline::{AnalyticsPipeline, RunOutcome, RunParams};
use super::RunId;

/// Whether a trigger was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStatus {
    Started,
    Failed,
}

/// Synchronous reply to a run trigger.
///
/// Every trigger gets a receipt; failures carry a message instead of being
/// swallowed inside the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReceipt {
    pub run_id: RunId,
    pub status: LaunchStatus,
    pub message: Option<String>,
}

impl RunReceipt {
    pub fn is_started(&self) -> bool {
        self.status == LaunchStatus::Started
    }
}

/// Bookkeeping for one triggered run.
struct RunSlot {
    cancel: CancellationToken,
    /// Taken by the first `wait`; `None` once the run has been awaited
    task: Mutex<Option<JoinHandle<()>>>,
    outcome: Arc<Mutex<Option<RunOutcome>>>,
}

/// Starts, aborts and tracks pipeline runs.
///
/// Each trigger mints a wall-clock [`RunId`] and spawns the pipeline on its
/// own task with its own cancellation token, so any number of runs (for
/// different dates, or retries of the same date) can be in flight at once.
pub struct AnalyticsLauncher {
    pipeline: Arc<AnalyticsPipeline>,
    runs: DashMap<RunId, RunSlot>,
}

impl AnalyticsLauncher {
    pub fn new(pipeline: Arc<AnalyticsPipeline>) -> Self {
        Self {
            pipeline,
            runs: DashMap::new(),
        }
    }

    /// Triggers a run for `target_date` (default: yesterday, UTC).
    ///
    /// Returns a `Started` receipt once the run is spawned; the trigger never
    /// waits for the run itself. See [`wait`](Self::wait) for the outcome.
    pub fn start_run(&self, target_date: Option<NaiveDate>) -> RunReceipt {
        self.start_run_with_token(RunId::next(), target_date)
    }

    /// Triggers a run under a caller-supplied token.
    ///
    /// A token already in use is rejected with a `Failed` receipt; two
    /// wall-clock triggers inside the same millisecond hit this path.
    pub fn start_run_with_token(
        &self,
        run_id: RunId,
        target_date: Option<NaiveDate>,
    ) -> RunReceipt {
        let target_date = target_date.unwrap_or_else(default_target_date);

        match self.runs.entry(run_id) {
            Entry::Occupied(_) => {
                warn!(run = %run_id, "Run token already in use; trigger rejected");
                RunReceipt {
                    run_id,
                    status: LaunchStatus::Failed,
                    message: Some(format!("Run token {} is already in use", run_id)),
                }
            }
            Entry::Vacant(slot) => {
                let cancel = CancellationToken::new();
                let outcome = Arc::new(Mutex::new(None));

                let pipeline = Arc::clone(&self.pipeline);
                let params = RunParams::new(run_id, target_date);
                let run_cancel = cancel.clone();
                let run_outcome = Arc::clone(&outcome);
                let task = tokio::spawn(async move {
                    let result = pipeline.run(params, run_cancel).await;
                    *run_outcome.lock() = Some(result);
                });

                slot.insert(RunSlot {
                    cancel,
                    task: Mutex::new(Some(task)),
                    outcome,
                });
                info!(run = %run_id, date = %target_date, "Analytics run triggered");
                RunReceipt {
                    run_id,
                    status: LaunchStatus::Started,
                    message: None,
                }
            }
        }
    }

    /// Requests an abort; takes effect at the run's next chunk boundary.
    ///
    /// Returns whether the run id was known.
    pub fn abort(&self, run_id: RunId) -> bool {
        match self.runs.get(&run_id) {
            Some(slot) => {
                slot.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Awaits a run and returns its outcome.
    ///
    /// Returns `None` for an unknown run id, or when the run's task panicked.
    pub async fn wait(&self, run_id: RunId) -> Option<RunOutcome> {
        let task = {
            let slot = self.runs.get(&run_id)?;
            let handle = slot.task.lock().take();
            handle
        };
        if let Some(task) = task {
            if let Err(error) = task.await {
                warn!(run = %run_id, %error, "Analytics run task failed");
            }
        }
        self.outcome(run_id)
    }

    /// Returns an already-finished run's outcome without blocking.
    pub fn outcome(&self, run_id: RunId) -> Option<RunOutcome> {
        let slot = self.runs.get(&run_id)?;
        let outcome = slot.outcome.lock().clone();
        outcome
    }

    /// Number of runs the launcher has tracked since startup.
    pub fn tracked_runs(&self) -> usize {
        self.runs.len()
    }
}

/// The day before today, UTC.
fn default_target_date() -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .unwrap_or_else(|| Utc::now().date_naive())
}
