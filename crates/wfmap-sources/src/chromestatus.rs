//! Paginated chromestatus listing client.
//!
//! The listing is fetched with `GET <url>?start=<offset>&num=<page_size>`.
//! Every body is prefixed with the anti-XSSI guard `)]}'\n`, followed by a
//! JSON object whose `features` array holds the page. Iteration stops at the
//! first empty page, which costs one extra request but needs no total count.
//!
//! Entries are newest-first and new entries can appear while paging, so the
//! same entry may show up on two consecutive pages. [`ChromestatusClient::subjects`]
//! passes those duplicates through; [`ChromestatusClient::fetch_all`]
//! removes them.

use std::collections::HashSet;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use wfmap_core::defaults::{
    CHROMESTATUS_PAGE_SIZE, CHROMESTATUS_URL, CHROMESTATUS_XSSI_PREFIX, HTTP_TIMEOUT_SECS,
    SUBJECT_FIELDS, USER_AGENT,
};
use wfmap_core::{json_id, Error, Result, Subject, SubjectSource};

/// Configuration for the chromestatus listing.
#[derive(Debug, Clone)]
pub struct ChromestatusConfig {
    /// Listing endpoint, without query string.
    pub url: String,
    /// Entries requested per page.
    pub page_size: usize,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ChromestatusConfig {
    fn default() -> Self {
        Self {
            url: CHROMESTATUS_URL.to_string(),
            page_size: CHROMESTATUS_PAGE_SIZE,
            timeout_seconds: HTTP_TIMEOUT_SECS,
        }
    }
}

impl ChromestatusConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("CHROMESTATUS_URL").unwrap_or_else(|_| CHROMESTATUS_URL.to_string()),
            page_size: std::env::var("CHROMESTATUS_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(CHROMESTATUS_PAGE_SIZE),
            timeout_seconds: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(HTTP_TIMEOUT_SECS),
        }
    }
}

#[derive(Deserialize)]
struct ListingPage {
    #[serde(default)]
    features: Option<Vec<JsonValue>>,
}

/// Strip the anti-XSSI guard and return the page's entries.
///
/// A missing or `null` `features` key is an empty page.
pub fn decode_listing(body: &str) -> Result<Vec<JsonValue>> {
    let json = body.strip_prefix(CHROMESTATUS_XSSI_PREFIX).ok_or_else(|| {
        Error::Protocol("chromestatus response did not begin with the expected prefix".to_string())
    })?;
    let page: ListingPage = serde_json::from_str(json)
        .map_err(|e| Error::Protocol(format!("Malformed chromestatus page: {}", e)))?;
    Ok(page.features.unwrap_or_default())
}

/// Client for the chromestatus feature listing.
pub struct ChromestatusClient {
    client: Client,
    config: ChromestatusConfig,
}

impl ChromestatusClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ChromestatusConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Request(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ChromestatusConfig::from_env())
    }

    pub fn config(&self) -> &ChromestatusConfig {
        &self.config
    }

    /// Fetch one page of raw entries starting at `start`.
    pub async fn fetch_page(&self, start: usize) -> Result<Vec<JsonValue>> {
        debug!(
            subsystem = "sources",
            component = "chromestatus",
            op = "fetch_page",
            start,
            num = self.config.page_size,
            "Fetching chromestatus entries {}-{}",
            start + 1,
            start + self.config.page_size
        );

        let response = self
            .client
            .get(&self.config.url)
            .query(&[("start", start), ("num", self.config.page_size)])
            .send()
            .await
            .map_err(|e| Error::Request(format!("chromestatus request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Request(format!(
                "chromestatus returned {} for start={}",
                response.status(),
                start
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Request(format!("Failed to read chromestatus response: {}", e)))?;
        decode_listing(&body)
    }

    /// Stream every page until the listing returns an empty one.
    pub fn pages(&self) -> BoxStream<'_, Result<Vec<JsonValue>>> {
        stream::try_unfold(Some(0usize), move |next| async move {
            let Some(start) = next else {
                return Ok::<_, Error>(None);
            };
            let page = self.fetch_page(start).await?;
            if page.is_empty() {
                return Ok(None);
            }
            Ok(Some((page, Some(start + self.config.page_size))))
        })
        .boxed()
    }

    /// Stream raw entries, duplicates included.
    pub fn entries(&self) -> BoxStream<'_, Result<JsonValue>> {
        self.pages()
            .map_ok(|page| stream::iter(page.into_iter().map(Ok::<_, Error>)))
            .try_flatten()
            .boxed()
    }

    /// Collect the full listing: first occurrence of each id wins, sorted
    /// by id (numeric ids in numeric order).
    pub async fn fetch_all(&self) -> Result<Vec<JsonValue>> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        let mut duplicates = 0usize;

        let mut stream = self.entries();
        while let Some(entry) = stream.try_next().await? {
            let Some(id) = entry.get("id").and_then(json_id) else {
                warn!(subsystem = "sources", component = "chromestatus", "Skipping entry without id");
                continue;
            };
            if seen.insert(id) {
                entries.push(entry);
            } else {
                duplicates += 1;
            }
        }

        entries.sort_by_cached_key(id_sort_key);
        info!(
            subsystem = "sources",
            component = "chromestatus",
            op = "fetch_all",
            entry_count = entries.len(),
            duplicates,
            "Fetched chromestatus listing"
        );
        Ok(entries)
    }
}

fn id_sort_key(entry: &JsonValue) -> (u64, String) {
    let id = entry.get("id").and_then(json_id).unwrap_or_default();
    (id.parse().unwrap_or(u64::MAX), id)
}

impl SubjectSource for ChromestatusClient {
    fn subjects(&self) -> BoxStream<'_, Result<Subject>> {
        self.entries()
            .try_filter_map(|entry| async move {
                let subject = Subject::from_entry(&entry, SUBJECT_FIELDS);
                if subject.is_none() {
                    warn!(subsystem = "sources", component = "chromestatus", "Skipping entry without id");
                }
                Ok::<_, Error>(subject)
            })
            .boxed()
    }
}
