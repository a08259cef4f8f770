//! Tracing setup for the `wfmap` binary.
//!
//! Environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LOG_FORMAT` | `text` | `json` or `text` |
//! | `LOG_FILE` | unset | Path of a daily-rotated log file; stdout when unset |
//! | `LOG_ANSI` | auto | `true`/`false` to force ANSI colors |
//! | `RUST_LOG` | `wfmap=info,wfmap_api=info,tower_http=info` | Standard env filter |
//!
//! ## Field vocabulary
//!
//! Library crates log with a shared set of structured fields so that JSON
//! output can be filtered without parsing messages:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `subsystem` | Crate area: `sources`, `store`, `inference`, `jobs`, `api` |
//! | `component` | Module within the subsystem, e.g. `chromestatus`, `review` |
//! | `op` | Operation name, e.g. `fetch_page`, `merge`, `save` |
//! | `subject_id` | chromestatus entry id |
//! | `target_id` | web-features id |
//! | `batch_size`, `result_count`, `item_count` | Counts |
//! | `path` | File inside the data directory |
//! | `duration_ms` | Elapsed wall time of the operation |

use std::path::Path;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "wfmap=info,wfmap_api=info,tower_http=info";
const DEFAULT_LOG_FILE_NAME: &str = "wfmap.log";

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
pub fn init_tracing() -> Option<WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok().filter(|p| !p.is_empty());
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");
    let json = log_format == "json";

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let path = Path::new(path);
        let file_dir = path.parent().unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(DEFAULT_LOG_FILE_NAME);
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if json {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            // No ANSI in files unless asked for.
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if json {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}
