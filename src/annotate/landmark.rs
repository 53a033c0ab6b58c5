//! Section Landmark Locator
//!
//! Places one landmark per section title, at the first short fragment that
//! contains the title's search key. A title is consumed once placed and is
//! never looked for again in the same document, so running headers that
//! repeat the title on later pages do not produce duplicates.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::fragment::TextFragment;
use super::markup::MarkupText;
use crate::analysis::SectionEntry;
use crate::config::AnnotatorConfig;

/// Placement instruction for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub top: f64,
    /// Already shifted left by the configured offset
    pub left: f64,
    pub tooltip: String,
    pub title: String,
    /// Index of the anchoring fragment within its page
    pub fragment: usize,
}

/// Drop a leading numeric/punctuation prefix ("1.", "2.1"), lowercase, trim
pub fn section_key(title: &str) -> String {
    title
        .trim_start_matches(|c: char| c.is_ascii_digit() || c.is_ascii_punctuation() || c.is_whitespace())
        .trim()
        .to_lowercase()
}

#[derive(Debug, Clone)]
struct PendingSection {
    key: String,
    key_len: usize,
    section: SectionEntry,
}

/// Owns the consumed-titles set for one document
#[derive(Debug, Clone)]
pub struct SectionLandmarkLocator {
    sections: Vec<PendingSection>,
    consumed: HashSet<String>,
    slack: usize,
    offset: f64,
}

impl SectionLandmarkLocator {
    pub fn new(sections: &[SectionEntry], config: &AnnotatorConfig) -> Self {
        let sections = sections
            .iter()
            .map(|section| {
                let key = section_key(&section.title);
                PendingSection {
                    key_len: key.chars().count(),
                    key,
                    section: section.clone(),
                }
            })
            .filter(|pending| !pending.key.is_empty())
            .collect();

        Self {
            sections,
            consumed: HashSet::new(),
            slack: config.landmark_slack,
            offset: config.landmark_offset,
        }
    }

    /// Landmarks for one page, in section order. Consumes matched titles.
    pub fn locate(&mut self, fragments: &[TextFragment]) -> Vec<Landmark> {
        if self.sections.len() == self.consumed.len() || fragments.is_empty() {
            return Vec::new();
        }

        let texts: Vec<(String, usize)> = fragments
            .iter()
            .map(|f| {
                let text = MarkupText::parse(&f.content).plain().trim().to_lowercase();
                let len = text.chars().count();
                (text, len)
            })
            .collect();

        let mut landmarks = Vec::new();
        for pending in &self.sections {
            if self.consumed.contains(&pending.key) {
                continue;
            }

            let anchor = texts
                .iter()
                .position(|(text, len)| text.contains(&pending.key) && *len < pending.key_len + self.slack);

            if let Some(idx) = anchor {
                let fragment = &fragments[idx];
                landmarks.push(Landmark {
                    top: fragment.top,
                    left: fragment.left - self.offset,
                    tooltip: pending.section.summary.clone(),
                    title: pending.section.title.clone(),
                    fragment: idx,
                });
                self.consumed.insert(pending.key.clone());
            }
        }
        landmarks
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }

    /// Titles still eligible for placement
    pub fn pending_titles(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|p| !self.consumed.contains(&p.key))
            .map(|p| p.section.title.as_str())
            .collect()
    }

    /// Make every title eligible again (new document)
    pub fn reset(&mut self) {
        self.consumed.clear();
    }
}
