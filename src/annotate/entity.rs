//! TextEntity catalogue + Aho-Corasick entity index
//!
//! Keywords, people and emails from the analysis record are unified into
//! `TextEntity` values and compiled into one automaton. LeftmostLongest
//! semantics make "Neural Network" win over "Network" at the same start.
//! Case-insensitive matching runs over Unicode-lowercased text, so
//! "SCHRÖDINGER" finds "Schrödinger".

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::analysis::AnalysisRecord;
use crate::error::{Error, Result};

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Keyword,
    Person,
    Email,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Keyword => "keyword",
            EntityKind::Person => "person",
            EntityKind::Email => "email",
        }
    }

    /// Class the viewer styles this kind with
    pub fn css_class(&self) -> &'static str {
        match self {
            EntityKind::Keyword => "highlight",
            EntityKind::Person => "person-marker",
            EntityKind::Email => "email-marker",
        }
    }
}

/// Something to find in page text. Built per render, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEntity {
    pub text: String,
    pub kind: EntityKind,
    pub tooltip: Option<String>,
}

impl TextEntity {
    /// Trimmed entity, or `None` when the text is blank
    pub fn new(text: &str, kind: EntityKind, tooltip: Option<&str>) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            kind,
            tooltip: tooltip.map(str::to_string),
        })
    }

    /// Keywords, then people, then emails, in record order
    pub fn collect(record: &AnalysisRecord) -> Vec<TextEntity> {
        let keywords = record
            .keywords
            .iter()
            .filter_map(|k| TextEntity::new(&k.term, EntityKind::Keyword, Some(&k.definition)));
        let people = record
            .people
            .iter()
            .filter_map(|p| TextEntity::new(&p.name, EntityKind::Person, Some(&p.description)));
        let emails = record
            .emails
            .iter()
            .filter_map(|e| TextEntity::new(e, EntityKind::Email, None));

        keywords.chain(people).chain(emails).collect()
    }

    /// Tooltip text; empty for emails
    pub fn tooltip_text(&self) -> &str {
        self.tooltip.as_deref().unwrap_or("")
    }
}

/// Where an entity was found inside a fragment's plain text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityHit {
    pub start: usize,
    pub end: usize,
    /// Index into [`EntityIndex::entities`]
    pub entity: usize,
}

// =============================================================================
// Case folding
// =============================================================================

/// Per-char Unicode lowercasing, applied identically to patterns and haystacks
fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Lowercased view of a haystack with a map back to source offsets.
///
/// Lowercasing can change byte lengths ("İ" folds to two chars), so
/// non-ASCII text keeps, per folded byte, the start of the source char it
/// came from.
struct FoldedText<'a> {
    source: &'a str,
    folded: String,
    /// None when the source is ASCII: folded offsets == source offsets
    origins: Option<Vec<usize>>,
}

impl<'a> FoldedText<'a> {
    fn new(source: &'a str) -> Self {
        if source.is_ascii() {
            return Self {
                source,
                folded: source.to_ascii_lowercase(),
                origins: None,
            };
        }

        let mut folded = String::with_capacity(source.len());
        let mut origins = Vec::with_capacity(source.len());
        for (idx, ch) in source.char_indices() {
            for lower in ch.to_lowercase() {
                folded.push(lower);
                origins.extend(std::iter::repeat(idx).take(lower.len_utf8()));
            }
        }
        Self {
            source,
            folded,
            origins: Some(origins),
        }
    }

    /// Source range covering folded `[start, end)`, widened to whole chars
    fn source_span(&self, start: usize, end: usize) -> (usize, usize) {
        let Some(origins) = &self.origins else {
            return (start, end);
        };
        let src_start = origins[start];
        let last = origins[end - 1];
        let last_len = self.source[last..].chars().next().map_or(0, char::len_utf8);
        (src_start, last + last_len)
    }
}

// =============================================================================
// EntityIndex
// =============================================================================

/// Compiled multi-pattern matcher over distinct entity texts
#[derive(Debug, Clone)]
pub struct EntityIndex {
    automaton: Option<AhoCorasick>,
    /// Pattern id == position in this list
    entities: Vec<TextEntity>,
    /// Patterns and haystacks are Unicode-lowercased before matching
    case_insensitive: bool,
}

impl EntityIndex {
    /// Build from a catalogue. Texts that collide (lowercased when
    /// `case_insensitive`) keep the first entity; patterns are ordered by
    /// descending length.
    pub fn build(catalogue: Vec<TextEntity>, case_insensitive: bool) -> Result<Self> {
        let pattern_of = |e: &TextEntity| if case_insensitive { fold_case(&e.text) } else { e.text.clone() };

        let mut seen = HashSet::new();
        let mut entities: Vec<TextEntity> = catalogue
            .into_iter()
            .filter(|e| seen.insert(pattern_of(e)))
            .collect();

        // Stable: equal lengths keep catalogue order
        entities.sort_by(|a, b| b.text.len().cmp(&a.text.len()));

        if entities.is_empty() {
            return Ok(Self::empty());
        }

        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build(entities.iter().map(pattern_of))
            .map_err(|e| Error::Index(e.to_string()))?;

        Ok(Self {
            automaton: Some(automaton),
            entities,
            case_insensitive,
        })
    }

    pub fn empty() -> Self {
        Self {
            automaton: None,
            entities: Vec::new(),
            case_insensitive: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[TextEntity] {
        &self.entities
    }

    pub fn entity(&self, idx: usize) -> Option<&TextEntity> {
        self.entities.get(idx)
    }

    /// Non-overlapping leftmost-longest hits in source offsets, in order of start
    pub fn find(&self, text: &str) -> Vec<EntityHit> {
        let Some(automaton) = &self.automaton else {
            return Vec::new();
        };

        if !self.case_insensitive {
            return automaton
                .find_iter(text)
                .map(|mat| EntityHit {
                    start: mat.start(),
                    end: mat.end(),
                    entity: mat.pattern().as_usize(),
                })
                .collect();
        }

        let folded = FoldedText::new(text);
        automaton
            .find_iter(folded.folded.as_str())
            .map(|mat| {
                let (start, end) = folded.source_span(mat.start(), mat.end());
                EntityHit {
                    start,
                    end,
                    entity: mat.pattern().as_usize(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{KeywordEntry, PersonEntry};

    fn keyword(text: &str) -> TextEntity {
        TextEntity::new(text, EntityKind::Keyword, Some("def")).unwrap()
    }

    // -------------------------------------------------------------------------
    // Requirement 1: Blank entities are discarded, text is trimmed
    // -------------------------------------------------------------------------
    #[test]
    fn test_collect_discards_blank() {
        let record = AnalysisRecord {
            keywords: vec![KeywordEntry::new("  CNN ", "net"), KeywordEntry::new("   ", "nothing")],
            people: vec![PersonEntry::new("", "nobody")],
            emails: vec!["a@b.c".into(), "".into()],
            ..AnalysisRecord::default()
        };
        let entities = TextEntity::collect(&record);

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].text, "CNN");
        assert_eq!(entities[0].kind, EntityKind::Keyword);
        assert_eq!(entities[1].kind, EntityKind::Email);
        assert_eq!(entities[1].tooltip_text(), "");
    }

    // -------------------------------------------------------------------------
    // Requirement 2: Longer term wins when one contains another
    // -------------------------------------------------------------------------
    #[test]
    fn test_longest_wins() {
        let index = EntityIndex::build(vec![keyword("Network"), keyword("Neural Network")], true).unwrap();
        let hits = index.find("Neural Network");

        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].start, hits[0].end), (0, 14));
        assert_eq!(index.entity(hits[0].entity).unwrap().text, "Neural Network");
    }

    #[test]
    fn test_patterns_sorted_by_length() {
        let index = EntityIndex::build(vec![keyword("ab"), keyword("abcd"), keyword("abc")], true).unwrap();
        let texts: Vec<&str> = index.entities().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "abc", "ab"]);
    }

    // -------------------------------------------------------------------------
    // Requirement 3: Case-insensitive matching
    // -------------------------------------------------------------------------
    #[test]
    fn test_case_insensitive() {
        let index = EntityIndex::build(vec![keyword("CNN")], true).unwrap();
        assert_eq!(index.find("cnns and CNNs").len(), 2);

        let strict = EntityIndex::build(vec![keyword("CNN")], false).unwrap();
        assert_eq!(strict.find("cnns and CNNs").len(), 1);
    }

    // -------------------------------------------------------------------------
    // Requirement 4: Duplicate texts keep the first entity
    // -------------------------------------------------------------------------
    #[test]
    fn test_duplicate_text_first_wins() {
        let person = TextEntity::new("turing", EntityKind::Person, Some("Alan")).unwrap();
        let index = EntityIndex::build(vec![keyword("Turing"), person], true).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.entities()[0].kind, EntityKind::Keyword);
    }

    // -------------------------------------------------------------------------
    // Requirement 5: Case folding covers non-ASCII letters
    // -------------------------------------------------------------------------
    #[test]
    fn test_unicode_case_insensitive() {
        let person = TextEntity::new("Schrödinger", EntityKind::Person, Some("Physicist")).unwrap();
        let index = EntityIndex::build(vec![person], true).unwrap();

        let text = "SCHRÖDINGER wrote";
        let hits = index.find(text);
        assert_eq!(hits.len(), 1);
        assert_eq!(&text[hits[0].start..hits[0].end], "SCHRÖDINGER");
    }

    #[test]
    fn test_offsets_after_length_changing_fold() {
        // "İ" lowercases to two chars; later offsets must still be source offsets
        let index = EntityIndex::build(vec![keyword("Ankara")], true).unwrap();
        let text = "İstanbul and ANKARA";
        let hits = index.find(text);

        assert_eq!(hits.len(), 1);
        assert_eq!(&text[hits[0].start..hits[0].end], "ANKARA");
    }

    #[test]
    fn test_unicode_duplicates_collapse() {
        let index = EntityIndex::build(vec![keyword("Ölfen"), keyword("ÖLFEN")], true).unwrap();
        assert_eq!(index.len(), 1);

        let strict = EntityIndex::build(vec![keyword("Ölfen"), keyword("ÖLFEN")], false).unwrap();
        assert_eq!(strict.len(), 2);
        assert!(strict.find("ölfen").is_empty());
    }

    #[test]
    fn test_empty_index_finds_nothing() {
        let index = EntityIndex::build(Vec::new(), true).unwrap();
        assert!(index.is_empty());
        assert!(index.find("anything").is_empty());
    }
}
