//! # wfmap-store
//!
//! File-backed persistence for wfmap.
//!
//! This crate provides:
//! - Atomic whole-file writes into a data directory
//! - chromestatus and web-features snapshot catalogs, and the candidate set
//!   derived from the latter
//! - The resumable mapping store (subject id → outcome)
//! - The human review queue
//! - CSV export of accepted mappings
//!
//! Every persisted file is rewritten in full on each save; nothing is
//! appended or journaled.
//!
//! ## Example
//!
//! ```rust,ignore
//! use wfmap_store::{FilesystemBackend, MappingStore};
//!
//! let backend = FilesystemBackend::new("./data");
//! let mut store = MappingStore::load(backend, "mapping.json").await?;
//! store.merge(outcomes).await?;
//! ```

pub mod catalog;
mod csv;
pub mod export;
pub mod mapping;
pub mod review;
pub mod storage;

// Re-export core types
pub use wfmap_core::*;

pub use catalog::{load_candidates, ChromestatusCatalog, WebFeaturesCatalog};
pub use export::{accepted_rows, export_accepted, ExportOutcome, EXPORT_HEADER};
pub use mapping::MappingStore;
pub use review::{ReviewQueue, ReviewStore};
pub use storage::FilesystemBackend;
