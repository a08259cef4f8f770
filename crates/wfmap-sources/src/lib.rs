//! # wfmap-sources
//!
//! Upstream data for wfmap.
//!
//! This crate provides:
//! - A paginated chromestatus listing client that streams subjects
//! - A subject source backed by a local `chromestatus.json` snapshot
//! - A web-features release fetcher
//! - The refresh step that writes both snapshots concurrently

pub mod chromestatus;
pub mod refresh;
pub mod snapshot;
pub mod web_features;

pub use chromestatus::{ChromestatusClient, ChromestatusConfig};
pub use refresh::{refresh, RefreshConfig, RefreshReport};
pub use snapshot::SnapshotSource;
pub use web_features::{Release, ReleaseAsset, WebFeaturesClient, WebFeaturesConfig};
