//! Snapshot catalogs written by the refresh step.
//!
//! `chromestatus.json` is a JSON array of raw chromestatus entries.
//! `web-features.json` is the web-features release payload, an object with a
//! `features` map keyed by feature id. Both are loaded once per process,
//! synchronously, and a missing or malformed file is fatal.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use wfmap_core::{json_id, Candidate, CandidateSet, Error, Result, Subject};

fn read_snapshot(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(format!(
            "Snapshot {} does not exist, run the refresh step first",
            path.display()
        )),
        _ => Error::Io(e),
    })
}

// =============================================================================
// WEB-FEATURES
// =============================================================================

#[derive(Deserialize)]
struct WebFeaturesSnapshot {
    features: BTreeMap<String, JsonValue>,
}

/// The full web-features catalog, keyed by feature id.
#[derive(Debug, Clone, Default)]
pub struct WebFeaturesCatalog {
    features: BTreeMap<String, JsonValue>,
}

impl WebFeaturesCatalog {
    /// Load the web-features snapshot from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let data = read_snapshot(path)?;
        let snapshot: WebFeaturesSnapshot = serde_json::from_slice(&data).map_err(|e| {
            Error::Serialization(format!("Malformed web-features snapshot {}: {}", path.display(), e))
        })?;
        info!(
            subsystem = "store",
            component = "catalog",
            op = "load",
            path = %path.display(),
            feature_count = snapshot.features.len(),
            "Loaded web-features snapshot"
        );
        Ok(Self {
            features: snapshot.features,
        })
    }

    /// Build a catalog from an already-decoded release payload.
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let snapshot: WebFeaturesSnapshot = serde_json::from_value(value)?;
        Ok(Self {
            features: snapshot.features,
        })
    }

    /// Raw record for a feature id, including redirect entries.
    pub fn get(&self, id: &str) -> Option<&JsonValue> {
        self.features.get(id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Filter the catalog down to the classification targets.
    ///
    /// Entries whose `kind` is anything other than `"feature"` (moved or
    /// split ids) are not valid targets and are left out. Only `name`,
    /// `description` and `compat_features` are kept.
    pub fn candidates(&self) -> CandidateSet {
        self.features
            .iter()
            .filter(|(_, record)| {
                record
                    .get("kind")
                    .and_then(JsonValue::as_str)
                    .map_or(true, |kind| kind == "feature")
            })
            .filter_map(|(id, record)| {
                match serde_json::from_value::<Candidate>(record.clone()) {
                    Ok(candidate) => Some((id.clone(), candidate)),
                    Err(e) => {
                        warn!(target_id = %id, error = %e, "Skipping malformed web-features entry");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Load the candidate set from the web-features snapshot at `path`.
pub fn load_candidates(path: &Path) -> Result<CandidateSet> {
    let candidates = WebFeaturesCatalog::load(path)?.candidates();
    debug!(candidate_count = candidates.len(), "Candidate set ready");
    Ok(candidates)
}

// =============================================================================
// CHROMESTATUS
// =============================================================================

/// Raw chromestatus entries, in snapshot order, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct ChromestatusCatalog {
    entries: Vec<JsonValue>,
    by_id: HashMap<String, usize>,
}

impl ChromestatusCatalog {
    /// Load the chromestatus snapshot from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let data = read_snapshot(path)?;
        let entries: Vec<JsonValue> = serde_json::from_slice(&data).map_err(|e| {
            Error::Serialization(format!("Malformed chromestatus snapshot {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_entries(entries);
        info!(
            subsystem = "store",
            component = "catalog",
            op = "load",
            path = %path.display(),
            entry_count = catalog.len(),
            "Loaded chromestatus snapshot"
        );
        Ok(catalog)
    }

    /// Index raw entries. Entries without an id are dropped; for repeated
    /// ids the first entry wins.
    pub fn from_entries(entries: Vec<JsonValue>) -> Self {
        let mut catalog = Self::default();
        for entry in entries {
            let Some(id) = entry.get("id").and_then(json_id) else {
                continue;
            };
            if catalog.by_id.contains_key(&id) {
                continue;
            }
            catalog.by_id.insert(id, catalog.entries.len());
            catalog.entries.push(entry);
        }
        catalog
    }

    pub fn get(&self, id: &str) -> Option<&JsonValue> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The web-features id an entry is already mapped to, if any.
    pub fn web_feature(&self, id: &str) -> Option<&str> {
        self.get(id)?
            .get("web_feature")
            .and_then(JsonValue::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Last-modification timestamp of an entry (`updated.when`).
    pub fn updated_at(&self, id: &str) -> Option<NaiveDateTime> {
        let when = self.get(id)?.get("updated")?.get("when")?.as_str()?;
        parse_timestamp(when)
    }

    /// Subjects for every entry, in snapshot order.
    pub fn subjects<'a>(&'a self, keep: &'a [&'a str]) -> impl Iterator<Item = Subject> + 'a {
        self.entries
            .iter()
            .filter_map(move |entry| Subject::from_entry(entry, keep))
    }
}

/// Parse chromestatus timestamps (`2024-05-01 12:34:56.123456`), falling
/// back to RFC 3339.
fn parse_timestamp(when: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(when, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(when).ok().map(|dt| dt.naive_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn web_features_value() -> JsonValue {
        json!({
            "browsers": {},
            "features": {
                "abbr": {
                    "kind": "feature",
                    "name": "<abbr>",
                    "description": "The abbr element.",
                    "spec": "https://html.spec.whatwg.org/#the-abbr-element",
                    "compat_features": ["html.elements.abbr"]
                },
                "aborting": {
                    "name": "AbortController and AbortSignal",
                    "description": "Cancel ongoing operations.",
                    "compat_features": ["api.AbortController.AbortController", "api.AbortController.signal"]
                },
                "old-name": {
                    "kind": "moved",
                    "redirect_target": "abbr"
                }
            }
        })
    }

    #[test]
    fn test_candidates_are_filtered() {
        let catalog = WebFeaturesCatalog::from_value(web_features_value()).unwrap();
        assert_eq!(catalog.len(), 3);

        let candidates = catalog.candidates();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.contains("abbr"));
        assert!(candidates.contains("aborting"));
        assert!(!candidates.contains("old-name"));

        let abbr = candidates.get("abbr").unwrap();
        assert_eq!(abbr.name, "<abbr>");
        assert_eq!(abbr.compat_features, vec!["html.elements.abbr"]);
        assert_eq!(
            candidates.get("aborting").unwrap().compat_features,
            vec!["api.AbortController.AbortController", "api.AbortController.signal"]
        );
    }

    #[test]
    fn test_candidates_serialize_without_extra_fields() {
        let catalog = WebFeaturesCatalog::from_value(web_features_value()).unwrap();
        let value = serde_json::to_value(catalog.candidates()).unwrap();
        assert!(value["abbr"].get("spec").is_none());
        assert!(value["abbr"].get("kind").is_none());
    }

    #[test]
    fn test_load_candidates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_candidates(&dir.path().join("web-features.json"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_load_candidates_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("web-features.json");
        std::fs::write(&path, b"{\"no_features\": true}").unwrap();
        assert!(matches!(load_candidates(&path), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_load_candidates_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("web-features.json");
        std::fs::write(&path, serde_json::to_vec(&web_features_value()).unwrap()).unwrap();
        let candidates = load_candidates(&path).unwrap();
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_chromestatus_lookup() {
        let catalog = ChromestatusCatalog::from_entries(vec![
            json!({"id": 1, "name": "One", "web_feature": "abbr", "updated": {"when": "2024-05-01 10:00:00.000000"}}),
            json!({"id": 2, "name": "Two", "web_feature": "", "updated": {"when": "2024-06-01 10:00:00"}}),
            json!({"id": 1, "name": "Duplicate"}),
            json!({"name": "No id"}),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("1").unwrap()["name"], "One");
        assert_eq!(catalog.web_feature("1"), Some("abbr"));
        assert_eq!(catalog.web_feature("2"), None);
        assert!(catalog.updated_at("2").unwrap() > catalog.updated_at("1").unwrap());
        assert!(!catalog.contains("3"));
    }

    #[test]
    fn test_chromestatus_subjects_keep_fields() {
        let catalog = ChromestatusCatalog::from_entries(vec![
            json!({"id": 7, "name": "Seven", "summary": "s", "owner": ["x"]}),
        ]);
        let subjects: Vec<Subject> = catalog.subjects(&["name", "summary"]).collect();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].id, "7");
        assert!(!subjects[0].fields.contains_key("owner"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-05-01 12:34:56.123456").is_some());
        assert!(parse_timestamp("2024-05-01 12:34:56").is_some());
        assert!(parse_timestamp("2024-05-01T12:34:56Z").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
