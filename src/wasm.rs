//! JavaScript façade
//!
//! # Usage (JavaScript)
//! ```javascript
//! import init, { DocumentAnnotator, analyzeDocument } from 'scholia';
//!
//! await init();
//! const annotator = new DocumentAnnotator({ trailing_pages: 3 });
//! const generation = annotator.beginDocument();
//!
//! const analysis = await analyzeDocument(fullText, apiKey, null);
//! if (!annotator.hydrate(generation, analysis, trailingText)) return; // stale
//!
//! const page = annotator.annotatePage(fragments);
//! page.fragments.forEach((f, i) => (spans[i].innerHTML = f.markup));
//! page.landmarks.forEach(placeMarker);
//! ```

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::analysis::{decode_or_unavailable, GeminiClient};
use crate::annotate::{reference_search_url, render, ReferenceResolver, TextFragment};
use crate::cache::{AnalysisCache, CacheStore, Fingerprint, LocalStorageStore, MemoryStore};
use crate::config::{AnnotatorConfig, ServiceConfig};
use crate::pipeline::{
    analyze_with_cache, AnalysisOutcome, AnnotationContext, Generation, GenerationCounter, MemoryDocument,
    Pipeline, RecordOrigin,
};

// ==================== HELPERS ====================

fn parse_config(config: JsValue) -> Result<AnnotatorConfig, JsValue> {
    if config.is_null() || config.is_undefined() {
        Ok(AnnotatorConfig::default())
    } else {
        serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))
    }
}

/// Plain objects rather than `Map`s; reference maps arrive keyed by string (`refs["12"]`)
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn warn(message: &str) {
    web_sys::console::warn_1(&message.into());
}

/// Browser storage when available, otherwise a session-only map
fn open_store() -> Box<dyn CacheStore> {
    match LocalStorageStore::open() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn(&format!("[scholia] localStorage unavailable, caching in memory: {}", e));
            Box::new(MemoryStore::new())
        }
    }
}

fn report_outcome(outcome: &AnalysisOutcome, failed_writes: u64) {
    if outcome.origin == RecordOrigin::Fallback {
        warn("[scholia] Analysis failed, showing the unavailable record");
    }
    if failed_writes > 0 {
        warn("[scholia] Failed to save analysis to the cache");
    }
}

// ==================== DOCUMENT ANNOTATOR ====================

/// Per-viewer annotation state. One document at a time; opening a new one
/// makes results tagged with older generations stale.
#[wasm_bindgen]
pub struct DocumentAnnotator {
    config: AnnotatorConfig,
    resolver: ReferenceResolver,
    generations: GenerationCounter,
    context: Option<AnnotationContext>,
}

#[wasm_bindgen]
impl DocumentAnnotator {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<DocumentAnnotator, JsValue> {
        Ok(Self {
            config: parse_config(config)?,
            resolver: ReferenceResolver::new(),
            generations: GenerationCounter::new(),
            context: None,
        })
    }

    /// Start a new document; drops the current one. Returns its generation.
    #[wasm_bindgen(js_name = beginDocument)]
    pub fn begin_document(&mut self) -> f64 {
        self.context = None;
        self.generations.next().0 as f64
    }

    #[wasm_bindgen(js_name = isCurrent)]
    pub fn is_current(&self, generation: f64) -> bool {
        self.generations.is_current(Generation(generation as u64))
    }

    /// Install the analysis result (from `analyzeDocument`) and build the
    /// reference map. Returns false, changing nothing, for a stale generation.
    pub fn hydrate(&mut self, generation: f64, analysis: JsValue, trailing_text: &str) -> Result<bool, JsValue> {
        let generation = Generation(generation as u64);
        if !self.generations.is_current(generation) {
            return Ok(false);
        }

        let outcome: AnalysisOutcome = serde_wasm_bindgen::from_value(analysis)
            .map_err(|e| JsValue::from_str(&format!("Invalid analysis: {}", e)))?;
        let references = self.resolver.resolve(trailing_text);
        let context = AnnotationContext::new(generation, outcome, references, &self.config)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        self.context = Some(context);
        Ok(true)
    }

    #[wasm_bindgen(js_name = annotateFragment)]
    pub fn annotate_fragment(&self, content: &str) -> Result<JsValue, JsValue> {
        to_js(&self.context()?.annotate_fragment(content))
    }

    /// fragments: Array<{ content, top, left }>
    #[wasm_bindgen(js_name = annotatePage)]
    pub fn annotate_page(&mut self, fragments: JsValue) -> Result<JsValue, JsValue> {
        let fragments: Vec<TextFragment> = serde_wasm_bindgen::from_value(fragments)
            .map_err(|e| JsValue::from_str(&format!("Invalid fragments: {}", e)))?;
        let context = self
            .context
            .as_mut()
            .ok_or_else(|| JsValue::from_str("No document hydrated"))?;
        to_js(&context.annotate_page(&fragments))
    }

    pub fn references(&self) -> Result<JsValue, JsValue> {
        to_js(self.context()?.references())
    }

    pub fn summary(&self) -> Result<String, JsValue> {
        Ok(self.context()?.record().summary.clone())
    }

    pub fn close(&mut self) {
        self.context = None;
    }
}

impl DocumentAnnotator {
    fn context(&self) -> Result<&AnnotationContext, JsValue> {
        self.context
            .as_ref()
            .ok_or_else(|| JsValue::from_str("No document hydrated"))
    }
}

// ==================== FREE FUNCTIONS ====================

/// Cache-gated analysis of the full document text. Resolves to
/// `{ fingerprint, record, origin }`; never rejects on service failure.
#[wasm_bindgen(js_name = analyzeDocument)]
pub async fn analyze_document(text: String, api_key: String, config: JsValue) -> Result<JsValue, JsValue> {
    let start = js_sys::Date::now();
    let config = parse_config(config)?;
    let mut cache = AnalysisCache::new(open_store(), &config);
    let client = GeminiClient::new(ServiceConfig::with_api_key(api_key), config.max_analysis_chars);

    let outcome = analyze_with_cache(&mut cache, &client, &text, &config).await;
    report_outcome(&outcome, cache.stats().failed_writes);
    web_sys::console::log_1(
        &format!("[scholia] Analysis ({:?}) ready in {:.0}ms", outcome.origin, js_sys::Date::now() - start).into(),
    );
    to_js(&outcome)
}

/// Whole-document run over pre-extracted pages: `Array<Array<{ content, top, left }>>`
#[wasm_bindgen(js_name = annotateDocument)]
pub async fn annotate_document(pages: JsValue, api_key: String, config: JsValue) -> Result<JsValue, JsValue> {
    let config = parse_config(config)?;
    let pages: Vec<Vec<TextFragment>> = serde_wasm_bindgen::from_value(pages)
        .map_err(|e| JsValue::from_str(&format!("Invalid pages: {}", e)))?;

    let client = GeminiClient::new(ServiceConfig::with_api_key(api_key), config.max_analysis_chars);
    let mut pipeline = Pipeline::new(open_store(), client, config);
    let document = pipeline
        .annotate_document(&MemoryDocument::new(pages))
        .await
        .map_err(|e| {
            web_sys::console::error_1(&format!("[scholia] {}", e).into());
            JsValue::from_str(&e.to_string())
        })?;

    if document.origin == RecordOrigin::Fallback {
        warn("[scholia] Analysis failed, showing the unavailable record");
    }
    to_js(&document)
}

/// Decode a raw model reply fetched by the caller. Falls back to the
/// unavailable record instead of failing.
#[wasm_bindgen(js_name = decodeAnalysis)]
pub fn decode_analysis(raw: &str, config: JsValue) -> Result<JsValue, JsValue> {
    let config = parse_config(config)?;
    to_js(&decode_or_unavailable(Ok(raw.to_string()), &config))
}

#[wasm_bindgen(js_name = resolveReferences)]
pub fn resolve_references(trailing_text: &str) -> Result<JsValue, JsValue> {
    to_js(&ReferenceResolver::new().resolve(trailing_text))
}

#[wasm_bindgen(js_name = referenceSearchUrl)]
pub fn js_reference_search_url(citation: &str) -> String {
    reference_search_url(citation)
}

#[wasm_bindgen(js_name = tooltipHtml)]
pub fn tooltip_html(text: &str) -> String {
    render::tooltip_html(text)
}

#[wasm_bindgen]
pub fn fingerprint(text: &str) -> String {
    Fingerprint::of(text).to_string()
}
