//! Data models for the mapping pipeline.
//!
//! Subjects come from chromestatus, candidates from web-features. The
//! oracle turns a batch of subjects into [`Outcome`]s, which are staged as
//! [`ReviewItem`]s for a human decision.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};

/// JSON object with string keys.
pub type JsonMap = Map<String, JsonValue>;

/// Outcomes keyed by subject id.
pub type OutcomeMap = BTreeMap<String, Outcome>;

/// Normalize a JSON identifier (number or non-empty string) into a key.
pub fn json_id(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// SUBJECTS
// =============================================================================

/// An item needing classification, e.g. a chromestatus entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Opaque identifier, unique within the source.
    pub id: String,
    /// Descriptive fields forwarded to the oracle (name, summary, ...).
    #[serde(flatten)]
    pub fields: JsonMap,
}

impl Subject {
    /// Create a subject without descriptive fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: JsonMap::new(),
        }
    }

    /// Add a descriptive field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Build a subject from a raw source entry, keeping only `keep` fields.
    ///
    /// Returns `None` when the entry is not an object or has no usable `id`.
    pub fn from_entry(entry: &JsonValue, keep: &[&str]) -> Option<Self> {
        let obj = entry.as_object()?;
        let id = json_id(obj.get("id")?)?;
        let fields = keep
            .iter()
            .filter_map(|key| obj.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect();
        Some(Self { id, fields })
    }
}

/// A bounded group of subjects submitted to the oracle in one request.
///
/// Serializes as `{ "<id>": { <fields> }, ... }`, the shape the oracle
/// echoes back.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubjectBatch {
    subjects: BTreeMap<String, JsonMap>,
}

impl SubjectBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a subject. Returns `false` if the id was already present, in
    /// which case the newer fields replace the older ones.
    pub fn insert(&mut self, subject: Subject) -> bool {
        self.subjects.insert(subject.id, subject.fields).is_none()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.subjects.contains_key(id)
    }

    /// Subject ids in this batch, in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.subjects.keys().map(String::as_str)
    }

    /// Move the contents out, leaving this batch empty.
    pub fn take(&mut self) -> SubjectBatch {
        std::mem::take(self)
    }
}

impl FromIterator<Subject> for SubjectBatch {
    fn from_iter<I: IntoIterator<Item = Subject>>(iter: I) -> Self {
        let mut batch = SubjectBatch::new();
        for subject in iter {
            batch.insert(subject);
        }
        batch
    }
}

// =============================================================================
// CANDIDATES
// =============================================================================

/// A classification target from the web-features catalog.
///
/// The identifier is the key under which the candidate is stored in a
/// [`CandidateSet`]; only the fields the oracle needs are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Compatibility-surface tags, e.g. `html.elements.abbr`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compat_features: Vec<String>,
}

/// The reference catalog of candidates, keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateSet {
    candidates: BTreeMap<String, Candidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, candidate: Candidate) {
        self.candidates.insert(id.into(), candidate);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.candidates.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Candidate> {
        self.candidates.get(id)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Candidate)> {
        self.candidates.iter().map(|(id, c)| (id.as_str(), c))
    }
}

impl FromIterator<(String, Candidate)> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = (String, Candidate)>>(iter: I) -> Self {
        Self {
            candidates: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Result of classifying one subject.
///
/// Persisted as `{"result": "<target>", "confidence": 70, "notes": "..."}`
/// or `{"failure": "<notes>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Success {
        #[serde(rename = "result")]
        target_id: String,
        /// 0..=100 in steps of 10.
        confidence: u8,
        #[serde(default)]
        notes: String,
    },
    Failure {
        #[serde(rename = "failure")]
        notes: String,
    },
}

impl Outcome {
    pub fn success(target_id: impl Into<String>, confidence: u8, notes: impl Into<String>) -> Self {
        Outcome::Success {
            target_id: target_id.into(),
            confidence,
            notes: notes.into(),
        }
    }

    pub fn failure(notes: impl Into<String>) -> Self {
        Outcome::Failure {
            notes: notes.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// The proposed candidate id, for successful outcomes.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Outcome::Success { target_id, .. } => Some(target_id),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn notes(&self) -> &str {
        match self {
            Outcome::Success { notes, .. } | Outcome::Failure { notes } => notes,
        }
    }
}

// =============================================================================
// REVIEW
// =============================================================================

/// Human decision on a proposed mapping.
///
/// Transitions are unrestricted: a reviewer may move an item between any
/// of the three states at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Accept,
    Reject,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Accept => "accept",
            ReviewStatus::Reject => "reject",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "accept" => Ok(ReviewStatus::Accept),
            "reject" => Ok(ReviewStatus::Reject),
            other => Err(Error::InvalidInput(format!(
                "Unknown review status '{}', expected pending, accept or reject",
                other
            ))),
        }
    }
}

/// A successful outcome staged for human review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    #[serde(alias = "chromestatus_id")]
    pub subject_id: String,
    #[serde(alias = "web_features_id")]
    pub target_id: String,
    pub confidence: u8,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub review_status: ReviewStatus,
}

impl ReviewItem {
    /// Create a pending review item.
    pub fn pending(
        subject_id: impl Into<String>,
        target_id: impl Into<String>,
        confidence: u8,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            target_id: target_id.into(),
            confidence,
            notes: notes.into(),
            review_status: ReviewStatus::Pending,
        }
    }

    /// Whether this item is the proposal `subject_id → target_id`.
    pub fn matches(&self, subject_id: &str, target_id: &str) -> bool {
        self.subject_id == subject_id && self.target_id == target_id
    }
}

/// Number of review items per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCounts {
    pub pending: usize,
    pub accept: usize,
    pub reject: usize,
}

impl ReviewCounts {
    pub fn total(&self) -> usize {
        self.pending + self.accept + self.reject
    }
}
