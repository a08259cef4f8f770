//! Shared state of the review server.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use wfmap_core::defaults::{MAPPING_FILE, MAPPING_REVIEW_FILE};
use wfmap_core::{CandidateSet, Result};
use wfmap_store::{ChromestatusCatalog, MappingStore, ReviewQueue, ReviewStore, WebFeaturesCatalog};

use crate::config::AppConfig;

/// Everything the handlers need. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub chromestatus: Arc<ChromestatusCatalog>,
    pub web_features: Arc<WebFeaturesCatalog>,
    pub candidates: Arc<CandidateSet>,
    /// Held across a decision and the file rewrite that follows it.
    pub queue: Arc<Mutex<ReviewQueue>>,
    pub store: ReviewStore,
}

impl AppState {
    /// Load both snapshots and the review queue from the data directory,
    /// building and persisting the queue from the mapping store on first
    /// use.
    pub async fn load(config: &AppConfig) -> Result<Self> {
        let chromestatus = ChromestatusCatalog::load(&config.chromestatus_path())?;
        let web_features = WebFeaturesCatalog::load(&config.web_features_path())?;
        let candidates = web_features.candidates();

        let backend = config.backend();
        let store = ReviewStore::new(backend.clone(), MAPPING_REVIEW_FILE);
        let mapping = MappingStore::load(backend, MAPPING_FILE).await?;
        let queue = store
            .load_or_build(mapping.entries(), &chromestatus, &candidates)
            .await?;

        let counts = queue.counts();
        info!(
            subsystem = "api",
            component = "review",
            op = "load",
            item_count = queue.len(),
            pending = counts.pending,
            accept = counts.accept,
            reject = counts.reject,
            "Review queue ready"
        );

        Ok(Self {
            chromestatus: Arc::new(chromestatus),
            web_features: Arc::new(web_features),
            candidates: Arc::new(candidates),
            queue: Arc::new(Mutex::new(queue)),
            store,
        })
    }

    /// Rewrite the queue file with the current in-memory queue.
    pub async fn flush(&self) -> Result<()> {
        let queue = self.queue.lock().await;
        self.store.save(&queue).await
    }
}
