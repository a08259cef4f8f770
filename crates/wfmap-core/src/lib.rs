//! # wfmap-core
//!
//! Core types, traits, and defaults for the chromestatus → web-features
//! mapping toolchain.
//!
//! This crate provides the foundational data structures (subjects,
//! candidates, classification outcomes, review items) and the trait seams
//! that the source, inference, storage, and pipeline crates plug into.

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
