//! Reference Resolver: number → citation text from the bibliography block
//!
//! Reads the text of the trailing pages, skips everything before the first
//! bibliography header, then slices the block at each `[n]` marker. A number
//! without an entry is a normal state, rendered as a placeholder.

use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Citation number → whitespace-collapsed citation text
///
/// Serialized as an object keyed by the decimal number (`{"12": "..."}`),
/// since JS object keys must be strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMap {
    entries: BTreeMap<u32, String>,
}

impl Serialize for ReferenceMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(number, text)| (number.to_string(), text)))
    }
}

impl<'de> Deserialize<'de> for ReferenceMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        let entries = raw
            .into_iter()
            .map(|(key, text)| match key.trim().parse::<u32>() {
                Ok(number) => Ok((number, text)),
                Err(_) => Err(D::Error::custom(format!("invalid citation number {:?}", key))),
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self { entries })
    }
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins
    pub fn insert(&mut self, number: u32, text: impl Into<String>) -> Option<String> {
        self.entries.insert(number, text.into())
    }

    pub fn get(&self, number: u32) -> Option<&str> {
        self.entries.get(&number).map(String::as_str)
    }

    /// Citation text, or the "not found" placeholder
    pub fn resolve(&self, number: u32) -> String {
        self.get(number)
            .map(str::to_string)
            .unwrap_or_else(|| not_found_text(number))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.entries.iter().map(|(n, t)| (*n, t.as_str()))
    }
}

impl FromIterator<(u32, String)> for ReferenceMap {
    fn from_iter<I: IntoIterator<Item = (u32, String)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

pub fn not_found_text(number: u32) -> String {
    format!("Reference {} not found", number)
}

// =============================================================================
// ReferenceResolver
// =============================================================================

pub struct ReferenceResolver {
    header_re: Regex,
    marker_re: Regex,
}

impl Default for ReferenceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceResolver {
    pub fn new() -> Self {
        let header_re = Regex::new(r"(?i)references|bibliography|reference list|works cited")
            .expect("bibliography header pattern compiles");
        // Group 1: the number
        let marker_re = Regex::new(r"\[([0-9]{1,3})\]").expect("reference marker pattern compiles");
        Self { header_re, marker_re }
    }

    /// Text from the first bibliography header on, or all of it
    pub fn bibliography_block<'t>(&self, text: &'t str) -> &'t str {
        match self.header_re.find(text) {
            Some(m) => &text[m.start()..],
            None => text,
        }
    }

    pub fn resolve(&self, trailing_text: &str) -> ReferenceMap {
        let block = self.bibliography_block(trailing_text);

        let markers: Vec<(usize, u32)> = self
            .marker_re
            .captures_iter(block)
            .filter_map(|cap| {
                let start = cap.get(0)?.start();
                let number = cap.get(1)?.as_str().parse::<u32>().ok()?;
                Some((start, number))
            })
            .collect();

        let mut map = ReferenceMap::new();
        for (i, &(start, number)) in markers.iter().enumerate() {
            let end = markers.get(i + 1).map(|&(next, _)| next).unwrap_or(block.len());
            if number == 0 {
                continue;
            }
            map.insert(number, collapse_whitespace(&block[start..end]));
        }

        tracing::debug!(entries = map.len(), markers = markers.len(), "resolved reference map");
        map
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Search link for a citation, with its leading `[n]` marker removed
pub fn reference_search_url(citation: &str) -> String {
    let query = strip_marker(citation.trim_start());
    format!(
        "https://www.google.com/search?q={}&btnI=1",
        urlencoding::encode(query)
    )
}

fn strip_marker(text: &str) -> &str {
    let Some(rest) = text.strip_prefix('[') else {
        return text;
    };
    match rest.find(']') {
        Some(close) if close > 0 && rest[..close].bytes().all(|b| b.is_ascii_digit()) => {
            rest[close + 1..].trim_start()
        }
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Requirement 1: Header trims in-body markers
    // -------------------------------------------------------------------------
    #[test]
    fn test_resolves_after_header() {
        let text = "Deep nets work [1] and scale [12]. References [1] Smith et al., 2020. [12] Doe, 2019.";
        let map = ReferenceResolver::new().resolve(text);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(1), Some("[1] Smith et al., 2020."));
        assert_eq!(map.get(12), Some("[12] Doe, 2019."));
    }

    #[test]
    fn test_header_case_insensitive() {
        let text = "body [2] BIBLIOGRAPHY [2] Knuth, 1968.";
        let map = ReferenceResolver::new().resolve(text);
        assert_eq!(map.get(2), Some("[2] Knuth, 1968."));
    }

    // -------------------------------------------------------------------------
    // Requirement 2: No header → whole text
    // -------------------------------------------------------------------------
    #[test]
    fn test_no_header_uses_full_text() {
        let map = ReferenceResolver::new().resolve("[1] A.   One.\n\n[2] B. Two.");
        assert_eq!(map.get(1), Some("[1] A. One."));
        assert_eq!(map.get(2), Some("[2] B. Two."));
    }

    // -------------------------------------------------------------------------
    // Requirement 3: Duplicates, zero markers, idempotence
    // -------------------------------------------------------------------------
    #[test]
    fn test_duplicate_number_last_wins() {
        let map = ReferenceResolver::new().resolve("References [3] First. [3] Second.");
        assert_eq!(map.get(3), Some("[3] Second."));
    }

    #[test]
    fn test_no_markers_empty_map() {
        let map = ReferenceResolver::new().resolve("References none here at all");
        assert!(map.is_empty());
        assert_eq!(map.resolve(4), "Reference 4 not found");
    }

    #[test]
    fn test_idempotent() {
        let resolver = ReferenceResolver::new();
        let text = "Works Cited [1] X. [2] Y. [10] Z.";
        assert_eq!(resolver.resolve(text), resolver.resolve(text));
    }

    #[test]
    fn test_zero_is_not_a_citation_number() {
        let map = ReferenceResolver::new().resolve("References [0] Zero. [1] One.");
        assert!(map.get(0).is_none());
        assert_eq!(map.get(1), Some("[1] One."));
    }

    // -------------------------------------------------------------------------
    // Requirement 4: Search link
    // -------------------------------------------------------------------------
    #[test]
    fn test_search_url_strips_marker() {
        assert_eq!(
            reference_search_url("[1] Smith et al., 2020."),
            "https://www.google.com/search?q=Smith%20et%20al.%2C%202020.&btnI=1"
        );
    }

    #[test]
    fn test_search_url_without_marker() {
        assert_eq!(
            reference_search_url("Doe 2019"),
            "https://www.google.com/search?q=Doe%202019&btnI=1"
        );
    }

    #[test]
    fn test_serializes_as_object() {
        let map: ReferenceMap = vec![(1, "[1] A.".to_string())].into_iter().collect();
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"1":"[1] A."}"#);
    }

    // -------------------------------------------------------------------------
    // Requirement 5: Keys cross the JS boundary as strings
    // -------------------------------------------------------------------------
    #[test]
    fn test_keys_serialize_as_strings() {
        let map: ReferenceMap = vec![(12, "[12] Doe.".to_string()), (3, "[3] Roe.".to_string())]
            .into_iter()
            .collect();
        let value = serde_json::to_value(&map).unwrap();
        let object = value.as_object().unwrap();

        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["12", "3"]);
        assert_eq!(object["12"], "[12] Doe.");
    }

    #[test]
    fn test_deserializes_string_keys() {
        let map: ReferenceMap = serde_json::from_str(r#"{"1": "[1] A.", "12": "[12] B."}"#).unwrap();
        assert_eq!(map.get(12), Some("[12] B."));
        assert_eq!(map.len(), 2);

        let roundtrip: ReferenceMap = serde_json::from_str(&serde_json::to_string(&map).unwrap()).unwrap();
        assert_eq!(roundtrip, map);
    }

    #[test]
    fn test_rejects_non_numeric_key() {
        assert!(serde_json::from_str::<ReferenceMap>(r#"{"one": "x"}"#).is_err());
    }
}
