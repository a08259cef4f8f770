//! Centralized default constants for wfmap.
//!
//! Every crate and the binary reference these constants instead of
//! defining their own magic numbers. Environment variables documented on
//! each component's `from_env()` override them at runtime.

// =============================================================================
// SOURCES
// =============================================================================

/// chromestatus.com feature listing endpoint.
pub const CHROMESTATUS_URL: &str = "https://chromestatus.com/api/v0/features";

/// Entries requested per listing page.
pub const CHROMESTATUS_PAGE_SIZE: usize = 500;

/// Anti-XSSI prefix every chromestatus API response starts with.
pub const CHROMESTATUS_XSSI_PREFIX: &str = ")]}'\n";

/// Fields of a chromestatus entry forwarded to the oracle.
pub const SUBJECT_FIELDS: &[&str] = &["name", "summary"];

/// GitHub releases API for the web-features package.
pub const WEB_FEATURES_RELEASES_URL: &str =
    "https://api.github.com/repos/web-platform-dx/web-features/releases";

/// Release asset that carries `compat_features` for every feature.
pub const WEB_FEATURES_ASSET: &str = "data.extended.json";

/// Per-request timeout for source fetches in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// User agent sent to GitHub and chromestatus.
pub const USER_AGENT: &str = concat!("wfmap/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// ORACLE
// =============================================================================

/// Default Gemini API base URL.
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini generation model.
pub const GEMINI_MODEL: &str = "gemini-2.5-pro";

/// Default base URL of the OpenAI-compatible backend.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default model of the OpenAI-compatible backend.
pub const OPENAI_GEN_MODEL: &str = "gpt-4o-mini";

/// Timeout for a single classification request in seconds.
///
/// A batch of 250 subjects against the full catalog takes minutes.
pub const ORACLE_TIMEOUT_SECS: u64 = 600;

/// Special target id the oracle uses when nothing matches.
pub const NOT_FOUND_TARGET: &str = "NOT_FOUND";

// =============================================================================
// PIPELINE
// =============================================================================

/// Subjects per oracle request.
pub const CLASSIFY_BATCH_SIZE: usize = 250;

/// Confidence granularity requested from the oracle.
pub const CONFIDENCE_STEP: u8 = 10;

/// Upper bound of the confidence scale.
pub const CONFIDENCE_MAX: u8 = 100;

// =============================================================================
// FILES
// =============================================================================

/// Default data directory.
pub const DATA_DIR: &str = ".";

/// chromestatus snapshot written by refresh.
pub const CHROMESTATUS_FILE: &str = "chromestatus.json";

/// web-features snapshot written by refresh.
pub const WEB_FEATURES_FILE: &str = "web-features.json";

/// Mapping store (subject id → outcome).
pub const MAPPING_FILE: &str = "mapping.json";

/// Review queue.
pub const MAPPING_REVIEW_FILE: &str = "mapping-review.json";

/// Exported accepted mappings.
pub const MAPPING_EXPORT_FILE: &str = "mapping-export.csv";

// =============================================================================
// SERVER
// =============================================================================

/// Default review server host.
pub const SERVER_HOST: &str = "127.0.0.1";

/// Default review server port.
pub const SERVER_PORT: u16 = 5001;

/// Maximum request body size for the review API in bytes.
pub const MAX_BODY_SIZE_BYTES: usize = 64 * 1024;
