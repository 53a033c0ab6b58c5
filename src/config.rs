//! Configuration types and defaults
//!
//! Every field carries its own serde default so a partial object coming from
//! JavaScript (or an empty `{}`) is a valid configuration.

use serde::{Deserialize, Serialize};

/// Default Gemini endpoint used by [`crate::analysis::GeminiClient`].
pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

// =============================================================================
// Annotator
// =============================================================================

/// Tunables for the matcher, resolver, locator and cache
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnnotatorConfig {
    /// Pages read from the end of the document to find the bibliography. Default: 3
    #[serde(default = "default_trailing_pages")]
    pub trailing_pages: usize,
    /// A heading fragment may be at most this many chars longer than its key. Default: 20
    #[serde(default = "default_landmark_slack")]
    pub landmark_slack: usize,
    /// Landmarks sit this far left of their fragment. Default: 24.0
    #[serde(default = "default_landmark_offset")]
    pub landmark_offset: f64,
    /// Character budget of text sent to the analysis service. Default: 950_000
    #[serde(default = "default_max_analysis_chars")]
    pub max_analysis_chars: usize,
    #[serde(default = "default_cache_namespace")]
    pub cache_namespace: String,
    /// Bumped whenever the stored record format changes. Default: 3
    #[serde(default = "default_cache_version")]
    pub cache_version: u32,
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
    /// Summary of the record substituted when analysis fails
    #[serde(default = "default_unavailable_summary")]
    pub unavailable_summary: String,
    /// Summary used when the payload has none
    #[serde(default = "default_missing_summary")]
    pub missing_summary: String,
}

fn default_trailing_pages() -> usize { 3 }
fn default_landmark_slack() -> usize { 20 }
fn default_landmark_offset() -> f64 { 24.0 }
fn default_max_analysis_chars() -> usize { 950_000 }
fn default_cache_namespace() -> String { "analysis-cache".to_string() }
fn default_cache_version() -> u32 { 3 }
fn default_true() -> bool { true }
fn default_unavailable_summary() -> String {
    "Could not analyze the document due to an API error.".to_string()
}
fn default_missing_summary() -> String { "No summary available.".to_string() }

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            trailing_pages: default_trailing_pages(),
            landmark_slack: default_landmark_slack(),
            landmark_offset: default_landmark_offset(),
            max_analysis_chars: default_max_analysis_chars(),
            cache_namespace: default_cache_namespace(),
            cache_version: default_cache_version(),
            case_insensitive: true,
            unavailable_summary: default_unavailable_summary(),
            missing_summary: default_missing_summary(),
        }
    }
}

// =============================================================================
// Analysis service
// =============================================================================

/// Remote analysis endpoint
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServiceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Sent as the `key` query parameter; left off when empty
    #[serde(default)]
    pub api_key: String,
}

fn default_endpoint() -> String { DEFAULT_ENDPOINT.to_string() }

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
        }
    }
}

impl ServiceConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Full request URL including the key
    pub fn request_url(&self) -> String {
        if self.api_key.is_empty() {
            self.endpoint.clone()
        } else {
            format!("{}?key={}", self.endpoint, urlencoding::encode(&self.api_key))
        }
    }
}
