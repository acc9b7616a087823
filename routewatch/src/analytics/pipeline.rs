//! Chunked extract-transform-load pipeline.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::transform::summarize_route;
use super::{AnalyticsConfig, RunId};
use crate::store::{AnalyticsStore, TelemetryStore};

/// Inputs for one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    pub run_id: RunId,
    /// Day whose telemetry is aggregated
    pub target_date: NaiveDate,
    /// Extract offset to start from; non-zero resumes a stopped run
    pub resume_offset: usize,
}

impl RunParams {
    pub fn new(run_id: RunId, target_date: NaiveDate) -> Self {
        Self {
            run_id,
            target_date,
            resume_offset: 0,
        }
    }

    /// Continues a previous run from its reported cursor.
    pub fn with_resume_offset(mut self, offset: usize) -> Self {
        self.resume_offset = offset;
        self
    }
}

/// Terminal state of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every route log for the date was processed
    Completed,
    /// Cancelled at a chunk boundary; committed chunks remain valid
    Aborted,
    /// A read or commit failed; committed chunks remain valid
    Failed(String),
}

/// Completion report for one run.
///
/// `cursor` is the extract offset of the first unprocessed route log. For a
/// `Completed` run it equals the total number of logs processed; for an
/// aborted or failed run it is a valid `resume_offset` for a follow-up run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub target_date: NaiveDate,
    pub status: RunStatus,
    pub chunks_committed: usize,
    pub records_written: usize,
    pub cursor: usize,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// Aggregates one day of telemetry into per-route analytics records.
///
/// The pipeline holds at most one chunk of route logs in memory. Each chunk
/// is extracted, transformed and committed before the next one is read, and
/// the chunk is the unit of commit: whatever interrupts a run, previously
/// committed chunks stay written.
pub struct AnalyticsPipeline {
    config: AnalyticsConfig,
    telemetry: Arc<dyn TelemetryStore>,
    analytics: Arc<dyn AnalyticsStore>,
}

impl AnalyticsPipeline {
    pub fn new(
        config: AnalyticsConfig,
        telemetry: Arc<dyn TelemetryStore>,
        analytics: Arc<dyn AnalyticsStore>,
    ) -> Self {
        Self {
            config,
            telemetry,
            analytics,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Runs the pipeline to completion, abort or failure.
    ///
    /// Cancellation is checked before each extract, so an abort during a
    /// chunk lets that chunk's commit finish first; a partially transformed
    /// chunk is never written.
    pub async fn run(&self, params: RunParams, cancel: CancellationToken) -> RunOutcome {
        let chunk_size = self.config.chunk_size.max(1);
        let mut offset = params.resume_offset;
        let mut chunks_committed = 0;
        let mut records_written = 0;

        info!(
            run = %params.run_id,
            date = %params.target_date,
            offset,
            chunk_size,
            "Analytics run started"
        );

        let status = loop {
            if cancel.is_cancelled() {
                break RunStatus::Aborted;
            }

            let page = match self
                .telemetry
                .read_page(params.target_date, offset, chunk_size)
                .await
            {
                Ok(page) => page,
                Err(error) => {
                    warn!(run = %params.run_id, offset, %error, "Telemetry extract failed");
                    break RunStatus::Failed(error.to_string());
                }
            };
            if page.is_empty() {
                break RunStatus::Completed;
            }

            let page_len = page.len();
            let processed_at = Utc::now();
            let records = page
                .iter()
                .map(|log| summarize_route(log, processed_at))
                .collect();

            if let Err(error) = self.analytics.write_batch(records).await {
                warn!(run = %params.run_id, offset, %error, "Chunk commit failed");
                break RunStatus::Failed(error.to_string());
            }

            chunks_committed += 1;
            records_written += page_len;
            offset += page_len;

            // A short page means the extract is exhausted
            if page_len < chunk_size {
                break RunStatus::Completed;
            }
        };

        let outcome = RunOutcome {
            run_id: params.run_id,
            target_date: params.target_date,
            status,
            chunks_committed,
            records_written,
            cursor: offset,
        };
        match &outcome.status {
            RunStatus::Completed => info!(
                run = %outcome.run_id,
                chunks = outcome.chunks_committed,
                records = outcome.records_written,
                "Analytics run completed"
            ),
            RunStatus::Aborted => info!(
                run = %outcome.run_id,
                cursor = outcome.cursor,
                "Analytics run aborted at chunk boundary"
            ),
            RunStatus::Failed(reason) => warn!(
                run = %outcome.run_id,
                cursor = outcome.cursor,
                reason,
                "Analytics run failed"
            ),
        }
        outcome
    }
}
