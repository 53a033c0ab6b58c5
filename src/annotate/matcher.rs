//! FragmentMatcher: entity + citation annotation of one text fragment
//!
//! Two pure phases:
//! 1. [`FragmentMatcher::candidates`] finds every entity hit and citation
//!    group in the fragment's plain text, tagged with offsets and kind.
//! 2. [`resolve_overlaps`] sorts by start (stable, so entity hits precede
//!    citations found at the same offset) and drops any candidate starting
//!    before the end of the last kept one.
//!
//! Kept candidates are then resolved against the reference map and spliced
//! back into the original markup-bearing content.

use serde::{Deserialize, Serialize};

use super::citation::{CitationGroup, CitationScanner};
use super::entity::{EntityIndex, EntityKind, TextEntity};
use super::markup::MarkupText;
use super::references::ReferenceMap;
use super::render;
use crate::config::AnnotatorConfig;
use crate::error::Result;

// =============================================================================
// Candidates
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateKind {
    /// Index into the matcher's entity index
    Entity(usize),
    Citation(CitationGroup),
}

/// A possible match over plain-text offsets `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub start: usize,
    pub end: usize,
    pub kind: CandidateKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub kept: Vec<Candidate>,
    pub dropped: usize,
}

/// First-claimed-wins: earlier start wins; on equal start, discovery order.
pub fn resolve_overlaps(mut candidates: Vec<Candidate>) -> Resolution {
    candidates.sort_by_key(|c| c.start);

    let mut resolution = Resolution::default();
    let mut last_end = 0;
    for candidate in candidates {
        if candidate.start < last_end {
            resolution.dropped += 1;
            continue;
        }
        last_end = candidate.end;
        resolution.kept.push(candidate);
    }
    resolution
}

// =============================================================================
// Resolved units
// =============================================================================

/// One number a citation part stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationUnit {
    pub number: u32,
    pub tooltip: String,
}

/// A citation part with its tooltip resolved from its first number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPart {
    pub start: usize,
    pub end: usize,
    /// Part text as it appears, e.g. "3-5"
    pub label: String,
    pub tooltip: String,
    pub units: Vec<CitationUnit>,
}

/// An enriched region of a fragment, plain-text offsets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Unit {
    Entity {
        start: usize,
        end: usize,
        text: String,
        kind: EntityKind,
        tooltip: String,
    },
    Citation {
        start: usize,
        end: usize,
        parts: Vec<ResolvedPart>,
    },
}

impl Unit {
    pub fn span(&self) -> (usize, usize) {
        match self {
            Unit::Entity { start, end, .. } | Unit::Citation { start, end, .. } => (*start, *end),
        }
    }
}

/// Result of annotating one fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedFragment {
    pub markup: String,
    pub units: Vec<Unit>,
    /// Candidates lost to the overlap policy
    pub dropped_overlaps: usize,
    /// Kept candidates whose range could not be mapped onto the markup
    pub unmappable: usize,
}

impl AnnotatedFragment {
    pub fn unchanged(content: &str) -> Self {
        Self {
            markup: content.to_string(),
            units: Vec::new(),
            dropped_overlaps: 0,
            unmappable: 0,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.units.is_empty()
    }
}

// =============================================================================
// FragmentMatcher
// =============================================================================

pub struct FragmentMatcher {
    entities: EntityIndex,
    citations: CitationScanner,
    references: ReferenceMap,
}

impl FragmentMatcher {
    pub fn new(catalogue: Vec<TextEntity>, references: ReferenceMap, config: &AnnotatorConfig) -> Result<Self> {
        Ok(Self {
            entities: EntityIndex::build(catalogue, config.case_insensitive)?,
            citations: CitationScanner::new(),
            references,
        })
    }

    pub fn entity_index(&self) -> &EntityIndex {
        &self.entities
    }

    pub fn references(&self) -> &ReferenceMap {
        &self.references
    }

    /// Phase 1: entity hits first, then citation groups
    pub fn candidates(&self, plain: &str) -> Vec<Candidate> {
        let entities = self.entities.find(plain).into_iter().map(|hit| Candidate {
            start: hit.start,
            end: hit.end,
            kind: CandidateKind::Entity(hit.entity),
        });
        let citations = self.citations.find(plain).into_iter().map(|group| Candidate {
            start: group.start,
            end: group.end,
            kind: CandidateKind::Citation(group),
        });
        entities.chain(citations).collect()
    }

    /// Resolve a citation group's parts against the reference map
    pub fn resolve_citation(&self, plain: &str, group: &CitationGroup) -> Vec<ResolvedPart> {
        group
            .parts
            .iter()
            .filter_map(|part| {
                let first = *part.numbers.first()?;
                let tooltip = self.references.resolve(first);
                Some(ResolvedPart {
                    start: part.start,
                    end: part.end,
                    label: plain[part.start..part.end].to_string(),
                    units: part
                        .numbers
                        .iter()
                        .map(|&number| CitationUnit { number, tooltip: tooltip.clone() })
                        .collect(),
                    tooltip,
                })
            })
            .collect()
    }

    /// Annotate one fragment's content
    pub fn annotate(&self, content: &str) -> AnnotatedFragment {
        if content.trim().is_empty() {
            return AnnotatedFragment::unchanged(content);
        }

        let text = MarkupText::parse(content);
        let plain = text.plain();
        let resolution = resolve_overlaps(self.candidates(plain));
        if resolution.kept.is_empty() {
            return AnnotatedFragment::unchanged(content);
        }

        let source = text.source();
        let mut markup = String::with_capacity(content.len() * 2);
        let mut units = Vec::with_capacity(resolution.kept.len());
        let mut unmappable = 0;
        let mut cursor = 0;

        for candidate in &resolution.kept {
            let Some((src_start, src_end)) = text.source_range(candidate.start, candidate.end) else {
                unmappable += 1;
                continue;
            };

            let (replacement, unit) = match &candidate.kind {
                CandidateKind::Entity(idx) => {
                    let Some(entity) = self.entities.entity(*idx) else {
                        unmappable += 1;
                        continue;
                    };
                    let unit = Unit::Entity {
                        start: candidate.start,
                        end: candidate.end,
                        text: plain[candidate.start..candidate.end].to_string(),
                        kind: entity.kind,
                        tooltip: entity.tooltip_text().to_string(),
                    };
                    (render::entity_span(&source[src_start..src_end], entity), unit)
                }
                CandidateKind::Citation(group) => {
                    let parts = self.resolve_citation(plain, group);
                    let Some(replacement) = splice_citation(&text, src_start, src_end, &parts) else {
                        unmappable += 1;
                        continue;
                    };
                    let unit = Unit::Citation {
                        start: candidate.start,
                        end: candidate.end,
                        parts,
                    };
                    (replacement, unit)
                }
            };

            markup.push_str(&source[cursor..src_start]);
            markup.push_str(&replacement);
            cursor = src_end;
            units.push(unit);
        }

        if units.is_empty() {
            tracing::debug!(unmappable, "no candidate could be mapped onto fragment markup");
            return AnnotatedFragment {
                unmappable,
                dropped_overlaps: resolution.dropped,
                ..AnnotatedFragment::unchanged(content)
            };
        }

        markup.push_str(&source[cursor..]);
        AnnotatedFragment {
            markup,
            units,
            dropped_overlaps: resolution.dropped,
            unmappable,
        }
    }
}

/// Rebuild a `[...]` group: brackets + separators verbatim, parts wrapped.
fn splice_citation(text: &MarkupText<'_>, group_start: usize, group_end: usize, parts: &[ResolvedPart]) -> Option<String> {
    let source = text.source();
    let mut out = String::new();
    let mut cursor = group_start;

    for part in parts {
        let (start, end) = text.source_range(part.start, part.end)?;
        out.push_str(&source[cursor..start]);
        out.push_str(&render::citation_span(&source[start..end], part));
        cursor = end;
    }
    out.push_str(&source[cursor..group_end]);
    Some(out)
}
