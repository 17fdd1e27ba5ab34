//! # Ecosteer IO
//!
//! Persistence boundary for the steering engine.
//!
//! This crate provides:
//! - Structured error handling with custom error types
//! - Serialization helpers (JSON, rkyv)
//! - Versioned herd-component records and a file-backed component store

/// Error types and result aliases for I/O operations
pub mod error;
/// Versioned records, snapshots and the file-backed component store
pub mod persistence;
/// Validated serialization helpers for JSON and rkyv
pub mod serialization;

pub use error::{IoError, Result};
pub use persistence::{
    ComponentSnapshot, FileComponentStore, HerdComponentRecord, StoredComponent,
    COMPONENT_FORMAT_VERSION,
};
pub use serialization::{
    from_json, from_rkyv_bytes, read_json_file, read_rkyv_file, to_json, to_json_pretty,
    to_rkyv_bytes, write_json_file, write_rkyv_file,
};
