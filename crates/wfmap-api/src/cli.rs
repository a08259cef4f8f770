//! Command-line interface of the `wfmap` binary.
//!
//! Flags override the corresponding environment variables.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use wfmap_inference::OracleProvider;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "wfmap")]
#[command(author, version, about = "Map chromestatus entries to web-features ids")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (overrides WFMAP_DATA_DIR)
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download fresh chromestatus and web-features snapshots
    Refresh,

    /// Classify every chromestatus entry not yet in the mapping store
    Classify {
        /// Read entries from the chromestatus snapshot instead of the live listing
        #[arg(long)]
        from_snapshot: bool,

        /// Entries per oracle request (overrides CLASSIFY_BATCH_SIZE)
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Generation backend: gemini or openai (overrides ORACLE_BACKEND)
        #[arg(long)]
        backend: Option<OracleProvider>,
    },

    /// Serve the review API
    Review {
        /// Bind address (overrides HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory with the review UI (overrides WFMAP_STATIC_DIR)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Write accepted mappings to the CSV export
    Export,
}

impl Cli {
    /// Environment configuration with this invocation's flags applied.
    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::from_env();
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Commands::Review {
            host,
            port,
            static_dir,
        } = &self.command
        {
            if let Some(host) = host {
                config.host = host.clone();
            }
            if let Some(port) = port {
                config.port = *port;
            }
            if let Some(dir) = static_dir {
                config.static_dir = Some(dir.clone());
            }
        }
        config
    }
}
