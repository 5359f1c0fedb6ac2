//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite table:
//! - PHYSTATUS(CN_TN_TYPE_AND_OFFSET, ARFCN, ACCESSED, serving cell, radio metrics, NO_NCELL, 6 neighbor slots)

pub mod schema;
pub mod sqlite;

pub use sqlite::{PhysicalStatusStore, StoreStats, DUMP_SEPARATOR};
