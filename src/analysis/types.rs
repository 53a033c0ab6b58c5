//! AnalysisRecord data model
//!
//! Field names on the wire follow the analysis service contract
//! (`paper_summary`, `section_analysis`, ...). Every field defaults
//! independently, so a partial payload still deserializes.

use serde::{Deserialize, Serialize};

/// Everything the analysis service knows about one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(rename = "paper_summary", default)]
    pub summary: String,
    #[serde(rename = "section_analysis", default)]
    pub sections: Vec<SectionEntry>,
    #[serde(default)]
    pub keywords: Vec<KeywordEntry>,
    #[serde(default)]
    pub people: Vec<PersonEntry>,
    #[serde(default)]
    pub emails: Vec<String>,
}

/// A document section as reported by the service. The title is fuzzy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionEntry {
    #[serde(rename = "section_title", default)]
    pub title: String,
    #[serde(rename = "section_summary", default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub definition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl AnalysisRecord {
    /// The record substituted when the service cannot be reached or its
    /// payload cannot be parsed: everything empty except the summary.
    pub fn unavailable(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// True when nothing can be highlighted or landmarked
    pub fn has_no_annotations(&self) -> bool {
        self.sections.is_empty()
            && self.keywords.is_empty()
            && self.people.is_empty()
            && self.emails.is_empty()
    }
}

impl SectionEntry {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self { title: title.into(), summary: summary.into() }
    }
}

impl KeywordEntry {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self { term: term.into(), definition: definition.into() }
    }
}

impl PersonEntry {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let json = r#"{
            "paper_summary": "A paper.",
            "section_analysis": [{"section_title": "1. Introduction", "section_summary": "Intro."}],
            "keywords": [{"term": "CNN", "definition": "A network."}],
            "people": [{"name": "Jane Roe", "description": "Author."}],
            "emails": ["jane@example.org"]
        }"#;
        let record: AnalysisRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.summary, "A paper.");
        assert_eq!(record.sections[0].title, "1. Introduction");
        assert_eq!(record.keywords[0].term, "CNN");
        assert_eq!(record.people[0].name, "Jane Roe");
        assert_eq!(record.emails, vec!["jane@example.org"]);
    }

    #[test]
    fn test_missing_fields_default() {
        let record: AnalysisRecord = serde_json::from_str(r#"{"keywords": [{"term": "GAN"}]}"#).unwrap();
        assert!(record.summary.is_empty());
        assert!(record.sections.is_empty());
        assert_eq!(record.keywords[0].definition, "");
    }

    #[test]
    fn test_unavailable_record() {
        let record = AnalysisRecord::unavailable("down");
        assert_eq!(record.summary, "down");
        assert!(record.has_no_annotations());
    }
}
