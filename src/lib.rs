//! # phystatus - Physical Status Store
//!
//! Per-channel physical-layer status for a GSM base station.
//!
//! phystatus provides:
//! - Channel descriptors that key one row per logical channel
//! - Decoded handset measurement reports (serving cell and up to six neighbors)
//! - A SQLite-backed store with lock-protected upsert of full snapshots
//! - A diagnostic dump of every stored channel state

pub mod channel;
pub mod measurement;
pub mod status;
pub mod storage;
pub mod output;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use channel::{ChannelDescriptor, ChannelSnapshot, ChannelStatus, TypeAndOffset};
pub use measurement::{MeasurementReport, MeasurementResults, NeighborCell, NO_NCELL_REPORT};
pub use status::{NeighborSlot, PhysicalStatus};
pub use storage::PhysicalStatusStore;

/// Result type alias for phystatus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for phystatus operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open status database at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Cannot create status table: {0}")]
    Schema(#[source] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Update of {key} affected {rows} rows")]
    RowNotUpdated { key: String, rows: usize },

    #[error("Invalid measurement report: {0}")]
    InvalidReport(String),

    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
