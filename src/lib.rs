//! Scholia: semantic annotation overlay for rendered documents
//!
//! A Rust/WASM engine that enriches a document's text layer with key terms,
//! people, email addresses, citation markers and section landmarks.
//!
//! # Architecture
//!
//! ## Analysis
//! - `analysis/types.rs` - AnalysisRecord and its entries (service wire names)
//! - `analysis/payload.rs` - Tolerant decoding of the model's reply
//! - `analysis/client.rs` - AnalysisService seam + Gemini HTTP client
//!
//! ## Cache
//! - `cache/fingerprint.rs` - SHA-256 content fingerprints, versioned keys
//! - `cache/store.rs` - CacheStore: in-memory and `localStorage` stores
//! - `cache/analysis_cache.rs` - AnalysisCache: fingerprint -> record
//!
//! ## Annotation
//! - `annotate/markup.rs` - Plain-text view of markup-bearing fragments
//! - `annotate/entity.rs` - EntityIndex: Aho-Corasick, longest term wins
//! - `annotate/citation.rs` - `[n]`, `[n-m]`, `[n, m]` citation markers
//! - `annotate/references.rs` - ReferenceResolver: bibliography -> number map
//! - `annotate/matcher.rs` - FragmentMatcher: candidates, overlaps, splicing
//! - `annotate/landmark.rs` - SectionLandmarkLocator
//! - `annotate/render.rs` - Emitted span markup
//!
//! ## Pipeline
//! - `pipeline.rs` - DocumentSource, generations, AnnotationContext, Pipeline
//! - `wasm.rs` - JavaScript façade
//!
//! # Usage (Rust)
//! ```ignore
//! let mut pipeline = Pipeline::new(MemoryStore::new(), client, AnnotatorConfig::default());
//! let mut context = pipeline.open(&document).await?;
//! for page in 0..document.page_count() {
//!     let annotated = context.annotate_page(&document.page_fragments(page).await?);
//! }
//! ```

pub mod analysis;
pub mod annotate;
pub mod cache;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod wasm;

pub use analysis::{AnalysisRecord, AnalysisService, GeminiClient, KeywordEntry, PersonEntry, SectionEntry};
pub use annotate::{
    AnnotatedFragment, FragmentMatcher, Landmark, ReferenceMap, ReferenceResolver, SectionLandmarkLocator,
    TextEntity, TextFragment, Unit,
};
pub use cache::{AnalysisCache, CacheStore, Fingerprint, LocalStorageStore, MemoryStore};
pub use config::{AnnotatorConfig, ServiceConfig};
pub use error::{AnalysisError, CacheError, Error, Result};
pub use pipeline::{
    AnalysisOutcome, AnnotatedDocument, AnnotatedPage, AnnotationContext, DocumentSource, Generation,
    MemoryDocument, PageStats, Pipeline, RecordOrigin,
};

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("scholia v{}", env!("CARGO_PKG_VERSION"))
}
