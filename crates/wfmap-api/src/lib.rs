//! # wfmap-api
//!
//! The `wfmap` binary and the review server behind it.
//!
//! This crate provides:
//! - The `refresh`, `classify`, `review` and `export` subcommands
//! - The review HTTP API over the persisted review queue
//! - Tracing setup shared by every subcommand

pub mod cli;
pub mod commands;
pub mod config;
pub mod review;
pub mod telemetry;

pub use cli::{Cli, Commands};
pub use config::AppConfig;
pub use review::{router, ApiError, AppState};
