//! Positioned text fragments supplied by the rendering collaborator

use serde::{Deserialize, Serialize};

use super::markup::MarkupText;

/// One atomic unit of on-page text. Never reordered or merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    /// May contain markup from upstream rendering
    pub content: String,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
}

impl TextFragment {
    pub fn new(content: impl Into<String>, top: f64, left: f64) -> Self {
        Self { content: content.into(), top, left }
    }
}

/// A page's text: each fragment's plain text (tags stripped, character
/// references decoded) joined by single spaces
pub fn page_text(fragments: &[TextFragment]) -> String {
    fragments
        .iter()
        .map(|f| MarkupText::parse(&f.content).plain().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
