//! Export of accepted mappings to CSV.

use tracing::{info, warn};

use wfmap_core::{CandidateSet, Result};

use crate::csv::write_row;
use crate::review::ReviewQueue;
use crate::storage::FilesystemBackend;

/// Column headers of the export file, in the format the chromestatus
/// import tool expects.
pub const EXPORT_HEADER: [&str; 2] = ["Chrome Status Entry", "Feature ID"];

/// What an export run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The file was written with this many data rows.
    Written { rows: usize },
    /// No item was accepted; no file was written.
    NothingToExport,
}

/// Accepted `(subject_id, target_id)` pairs, sorted by target then subject.
///
/// Accepted items whose target is no longer a valid candidate are dropped.
pub fn accepted_rows(queue: &ReviewQueue, candidates: &CandidateSet) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = queue
        .accepted()
        .filter(|item| {
            let valid = candidates.contains(&item.target_id);
            if !valid {
                warn!(
                    subject_id = %item.subject_id,
                    target_id = %item.target_id,
                    "Accepted item targets an unknown web-features id, not exporting"
                );
            }
            valid
        })
        .map(|item| (item.subject_id.clone(), item.target_id.clone()))
        .collect();
    // Grouped by feature for a final skim in the import tool.
    rows.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

/// Write accepted mappings to `name` in the data directory.
///
/// Zero accepted rows writes nothing and returns
/// [`ExportOutcome::NothingToExport`].
pub async fn export_accepted(
    queue: &ReviewQueue,
    candidates: &CandidateSet,
    backend: &FilesystemBackend,
    name: &str,
) -> Result<ExportOutcome> {
    let rows = accepted_rows(queue, candidates);
    if rows.is_empty() {
        info!(
            subsystem = "store",
            component = "export",
            op = "export",
            "No accepted mappings, nothing to export"
        );
        return Ok(ExportOutcome::NothingToExport);
    }

    let mut buf = Vec::new();
    write_row(&mut buf, &EXPORT_HEADER)?;
    for (subject_id, target_id) in &rows {
        write_row(&mut buf, &[subject_id, target_id])?;
    }
    backend.write(name, &buf).await?;

    info!(
        subsystem = "store",
        component = "export",
        op = "export",
        path = %backend.full_path(name).display(),
        rows = rows.len(),
        "Exported accepted mappings"
    );
    Ok(ExportOutcome::Written { rows: rows.len() })
}
