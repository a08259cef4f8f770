//! # wfmap-jobs
//!
//! The classification run.
//!
//! This crate provides:
//! - A size-bounded batcher that flushes full batches and the final
//!   partial one
//! - The resumable pipeline: stream subjects, skip the ones already in the
//!   mapping store, classify in batches, merge after every batch
//!
//! ## Example
//!
//! ```ignore
//! use wfmap_jobs::{ClassificationPipeline, PipelineConfig};
//!
//! let pipeline = ClassificationPipeline::new(PipelineConfig::from_env());
//! let report = pipeline.run(&source, &oracle, &mut store).await?;
//! println!("{} outcomes merged", report.merged);
//! ```

pub mod batcher;
pub mod pipeline;

// Re-export core types
pub use wfmap_core::*;

pub use batcher::Batcher;
pub use pipeline::{ClassificationPipeline, PipelineConfig, RunReport};
