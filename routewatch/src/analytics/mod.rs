//! Route analytics pipeline
//!
//! Chunk-oriented batch ETL over recorded telemetry. One run processes one
//! day: route logs are extracted in stable pages, transformed into
//! per-route analytics records and committed chunk by chunk, so memory
//! stays bounded by the chunk size no matter how large the day was.
//!
//! # Architecture
//!
//! ```text
//! AnalyticsLauncher ──spawn──► AnalyticsPipeline
//!                                 │  read_page(date, cursor, chunk)   TelemetryStore
//!                                 │  summarize_route() per log        (transform)
//!                                 │  write_batch(chunk)               AnalyticsStore
//!                                 └─ repeat until short page / abort / failure
//! ```
//!
//! The chunk is the unit of commit: failures and aborts never lose
//! committed chunks, and the reported cursor restarts a run where the
//! previous one stopped. Writes are upserts keyed on (route, date), which
//! makes overlap after a resume harmless and full re-runs idempotent.

mod launcher;
mod pipeline;
mod record;
mod transform;

pub use launcher::{AnalyticsLauncher, LaunchStatus, RunReceipt};
pub use pipeline::{AnalyticsPipeline, RunOutcome, RunParams, RunStatus};
pub use record::RouteAnalytics;
pub use transform::{summarize_route, FUEL_EFFICIENCY_FACTOR};

use chrono::Utc;
use std::fmt;

/// Default number of route logs per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Analytics pipeline settings.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Route logs extracted, transformed and committed per chunk
    pub chunk_size: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl AnalyticsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

/// Unique token for one pipeline run.
///
/// Minted from wall-clock milliseconds, like the trigger surfaces that
/// inspired it; two triggers inside the same millisecond collide and the
/// second is rejected rather than silently deduplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(i64);

impl RunId {
    /// Mints a token from the current wall clock.
    pub fn next() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
