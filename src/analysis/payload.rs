//! Tolerant decoding of the analysis service's text payload
//!
//! The model is asked for bare JSON but regularly wraps it in prose or code
//! fences. We cut out the outermost balanced `{...}` region, parse it, and
//! default each field on its own. Malformed array elements are skipped.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::{AnalysisRecord, KeywordEntry, PersonEntry, SectionEntry};
use crate::config::AnnotatorConfig;
use crate::error::AnalysisError;

/// Locate the first balanced JSON object in `raw`.
///
/// Braces inside JSON string literals are ignored. Returns `None` when no
/// `{` exists or the object never closes (truncated payload).
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decode a raw service reply into a record, field by field.
pub fn decode_record(raw: &str, config: &AnnotatorConfig) -> Result<AnalysisRecord, AnalysisError> {
    let json = extract_json_object(raw).ok_or(AnalysisError::NoJsonObject)?;
    let value: Value = serde_json::from_str(json).map_err(|e| AnalysisError::Parse(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| AnalysisError::Parse("top-level value is not an object".to_string()))?;

    let summary = match object.get("paper_summary").and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => config.missing_summary.clone(),
    };

    Ok(AnalysisRecord {
        summary,
        sections: lenient_list::<SectionEntry>(object.get("section_analysis")),
        keywords: lenient_list::<KeywordEntry>(object.get("keywords")),
        people: lenient_list::<PersonEntry>(object.get("people")),
        emails: object
            .get("emails")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    })
}

/// Decode, or fall back to the "analysis unavailable" record.
pub fn decode_or_unavailable(
    reply: Result<String, AnalysisError>,
    config: &AnnotatorConfig,
) -> AnalysisRecord {
    match reply.and_then(|raw| decode_record(&raw, config)) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, "analysis unavailable, using fallback record");
            AnalysisRecord::unavailable(config.unavailable_summary.clone())
        }
    }
}

fn lenient_list<T: DeserializeOwned>(value: Option<&Value>) -> Vec<T> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}
