//! Subject source backed by a local `chromestatus.json` snapshot.

use std::path::Path;

use futures::stream::{self, BoxStream, StreamExt};

use wfmap_core::defaults::SUBJECT_FIELDS;
use wfmap_core::{Result, Subject, SubjectSource};
use wfmap_store::ChromestatusCatalog;

/// Replays subjects from a snapshot written by the refresh step, so a
/// classification run can work offline against a fixed listing.
pub struct SnapshotSource {
    catalog: ChromestatusCatalog,
}

impl SnapshotSource {
    pub fn new(catalog: ChromestatusCatalog) -> Self {
        Self { catalog }
    }

    /// Load the snapshot at `path`. A missing file is `Error::NotFound`.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(ChromestatusCatalog::load(path)?))
    }

    pub fn catalog(&self) -> &ChromestatusCatalog {
        &self.catalog
    }
}

impl SubjectSource for SnapshotSource {
    fn subjects(&self) -> BoxStream<'_, Result<Subject>> {
        stream::iter(self.catalog.subjects(SUBJECT_FIELDS).map(Ok::<_, wfmap_core::Error>)).boxed()
    }
}
