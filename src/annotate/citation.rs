//! Citation marker syntax: `[n]`, `[n-m]`, `[n, m, ...]`
//!
//! Numbers are 1-3 ASCII digits. Parts are separated by commas; a part may
//! be a dash range (`-` or en dash) which expands to every integer in it.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One comma-separated part of a bracket group, with plain-text offsets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationPart {
    pub start: usize,
    pub end: usize,
    /// Expanded numbers; the first one resolves the displayed tooltip
    pub numbers: Vec<u32>,
}

/// A whole `[...]` marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationGroup {
    pub start: usize,
    pub end: usize,
    pub parts: Vec<CitationPart>,
}

impl CitationGroup {
    pub fn first_number(&self) -> Option<u32> {
        self.parts.iter().flat_map(|p| p.numbers.iter().copied()).next()
    }

    /// Every number referenced by the group, in order
    pub fn numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.parts.iter().flat_map(|p| p.numbers.iter().copied())
    }
}

/// Expand a part's text: `"7"` → `[7]`, `"3-5"` → `[3, 4, 5]`.
///
/// A reversed range (`"5-3"`) yields only its start.
pub fn expand_part(part: &str) -> Vec<u32> {
    let mut bounds = part
        .split(['-', '–'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<u32>().ok());

    match (bounds.next(), bounds.next()) {
        (Some(start), Some(end)) if start <= end => (start..=end).collect(),
        (Some(start), _) => vec![start],
        (None, _) => Vec::new(),
    }
}

pub struct CitationScanner {
    group_re: Regex,
    part_re: Regex,
}

impl Default for CitationScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl CitationScanner {
    pub fn new() -> Self {
        // [12] / [3-5] / [1, 4, 7–9]
        // Group 1: inner number list
        let group_re = Regex::new(r"\[([0-9]{1,3}(?:\s*[,\-–]\s*[0-9]{1,3})*)\]")
            .expect("citation group pattern compiles");

        // 7 / 3-5 / 3 – 5
        let part_re = Regex::new(r"[0-9]{1,3}(?:\s*[\-–]\s*[0-9]{1,3})?")
            .expect("citation part pattern compiles");

        Self { group_re, part_re }
    }

    /// All bracket groups in `text`, left to right
    pub fn find(&self, text: &str) -> Vec<CitationGroup> {
        self.group_re
            .captures_iter(text)
            .filter_map(|cap| {
                let full = cap.get(0)?;
                let inner = cap.get(1)?;
                let parts = self
                    .part_re
                    .find_iter(inner.as_str())
                    .map(|m| CitationPart {
                        start: inner.start() + m.start(),
                        end: inner.start() + m.end(),
                        numbers: expand_part(m.as_str()),
                    })
                    .collect();
                Some(CitationGroup {
                    start: full.start(),
                    end: full.end(),
                    parts,
                })
            })
            .collect()
    }
}
