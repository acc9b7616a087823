//! Application-level errors.

use thiserror::Error;

use super::config::ConfigFileError;
use crate::store::StoreError;

/// Errors surfaced while starting or running the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Fleet seeding against the shipment store failed
    #[error("Failed to seed fleet: {0}")]
    Seed(StoreError),

    /// Loading in-transit shipments into the simulation registry failed
    #[error("Failed to initialize simulation: {0}")]
    Initialize(StoreError),

    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigFileError),
}
