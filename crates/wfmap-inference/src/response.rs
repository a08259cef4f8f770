//! Parsing free-form model output into outcomes.
//!
//! Models wrap the JSON answer in prose or markdown fences, so the
//! outermost `{...}` span is extracted first. Each entry is then validated
//! on its own: one bad entry never discards the rest of the batch.

use serde_json::Value as JsonValue;
use tracing::warn;

use wfmap_core::defaults::{CONFIDENCE_MAX, CONFIDENCE_STEP, NOT_FOUND_TARGET};
use wfmap_core::{CandidateSet, JsonMap, Outcome, OutcomeMap, SubjectBatch};

/// Extract the JSON object spanning the first `{` to the last `}` of
/// `text`. Returns `None` when there is no such span or it does not decode
/// to an object.
pub fn extract_json_object(text: &str) -> Option<JsonMap> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&text[start..=end]) {
        Ok(JsonValue::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "Model response span is not valid JSON");
            None
        }
    }
}

/// Round a reported confidence to the nearest step. Values outside
/// `0..=100` are rejected.
fn normalize_confidence(value: &JsonValue) -> Option<u8> {
    let raw = value.as_f64()?;
    if !(0.0..=f64::from(CONFIDENCE_MAX)).contains(&raw) {
        return None;
    }
    let step = f64::from(CONFIDENCE_STEP);
    Some(((raw / step).round() * step) as u8)
}

/// Validate one entry. `None` means the entry does not conform.
fn parse_entry(value: &JsonValue, candidates: &CandidateSet) -> Option<Outcome> {
    let obj = value.as_object()?;
    let notes = obj
        .get("notes")
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string();

    if let Some(failure) = obj.get("failure") {
        return Some(Outcome::failure(failure.as_str()?));
    }

    let target = obj
        .get("result")
        .or_else(|| obj.get("id"))
        .and_then(JsonValue::as_str)?;

    if target == NOT_FOUND_TARGET {
        return Some(Outcome::failure(notes));
    }

    let confidence = normalize_confidence(obj.get("confidence")?)?;

    if !candidates.contains(target) {
        let mut failure = format!(
            "Proposed unknown web-features id \"{}\" ({}% confidence)",
            target, confidence
        );
        if !notes.is_empty() {
            failure.push_str(": ");
            failure.push_str(&notes);
        }
        return Some(Outcome::failure(failure));
    }

    Some(Outcome::success(target, confidence, notes))
}

/// Turn a decoded model response into outcomes for `batch`.
///
/// Keys that were not submitted in the batch and entries that do not
/// conform are dropped with a warning.
pub fn parse_outcomes(
    response: JsonMap,
    batch: &SubjectBatch,
    candidates: &CandidateSet,
) -> OutcomeMap {
    let mut outcomes = OutcomeMap::new();
    for (subject_id, value) in response {
        if !batch.contains(&subject_id) {
            warn!(subject_id = %subject_id, "Model answered for a subject that was not in the batch");
            continue;
        }
        match parse_entry(&value, candidates) {
            Some(outcome) => {
                outcomes.insert(subject_id, outcome);
            }
            None => {
                warn!(subject_id = %subject_id, entry = %value, "Dropping non-conforming model entry");
            }
        }
    }
    outcomes
}
