//! Document pipeline
//!
//! extract text -> fingerprint -> cache -> analysis -> references -> context.
//! The resulting [`AnnotationContext`] is the only per-document state; pages
//! are annotated through it one at a time, in order.
//!
//! Every run is tagged with a [`Generation`]. Nothing here cancels in-flight
//! work; callers compare generations and drop results that are no longer
//! current.

use serde::{Deserialize, Serialize};

use crate::analysis::{decode_record, AnalysisRecord, AnalysisService};
use crate::annotate::{
    page_text, AnnotatedFragment, FragmentMatcher, Landmark, ReferenceMap, ReferenceResolver,
    SectionLandmarkLocator, TextEntity, TextFragment,
};
use crate::cache::{AnalysisCache, CacheStore, Fingerprint};
use crate::config::AnnotatorConfig;
use crate::error::{Error, Result};

// =============================================================================
// Document source
// =============================================================================

/// The rendering collaborator: per-page positioned text.
#[allow(async_fn_in_trait)]
pub trait DocumentSource {
    fn page_count(&self) -> usize;

    /// Fragments of page `page` (0-based), in reading order.
    async fn page_fragments(&self, page: usize) -> Result<Vec<TextFragment>>;
}

/// Already-extracted pages held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pages: Vec<Vec<TextFragment>>,
}

impl MemoryDocument {
    pub fn new(pages: Vec<Vec<TextFragment>>) -> Self {
        Self { pages }
    }
}

impl DocumentSource for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    async fn page_fragments(&self, page: usize) -> Result<Vec<TextFragment>> {
        self.pages.get(page).cloned().ok_or(Error::PageOutOfRange {
            page,
            count: self.pages.len(),
        })
    }
}

/// Text of every page, in order
pub async fn page_texts<D: DocumentSource>(source: &D) -> Result<Vec<String>> {
    let mut pages = Vec::with_capacity(source.page_count());
    for page in 0..source.page_count() {
        pages.push(page_text(&source.page_fragments(page).await?));
    }
    Ok(pages)
}

/// Full document text: pages concatenated with no separator. Feeds the fingerprint.
pub fn document_text(pages: &[String]) -> String {
    pages.concat()
}

/// Text of the last `n` pages (all of them when there are fewer)
pub fn trailing_text(pages: &[String], n: usize) -> String {
    pages[pages.len().saturating_sub(n)..].concat()
}

// =============================================================================
// Generations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(pub u64);

#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: u64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run; every earlier generation becomes stale.
    pub fn next(&mut self) -> Generation {
        self.current += 1;
        Generation(self.current)
    }

    pub fn current(&self) -> Generation {
        Generation(self.current)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation.0 == self.current
    }
}

// =============================================================================
// Cached analysis
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordOrigin {
    Cache,
    Service,
    /// Analysis failed; the record is the "unavailable" placeholder
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub fingerprint: Fingerprint,
    pub record: AnalysisRecord,
    pub origin: RecordOrigin,
}

/// Cache lookup, then the service on a miss. Never fails: transport and
/// payload errors yield the fallback record, and a failed cache write is
/// only logged. Fallback records are not persisted.
pub async fn analyze_with_cache<S, A>(
    cache: &mut AnalysisCache<S>,
    service: &A,
    text: &str,
    config: &AnnotatorConfig,
) -> AnalysisOutcome
where
    S: CacheStore,
    A: AnalysisService,
{
    let fingerprint = Fingerprint::of(text);
    if let Some(record) = cache.get(&fingerprint) {
        return AnalysisOutcome {
            fingerprint,
            record,
            origin: RecordOrigin::Cache,
        };
    }

    let decoded = match service.analyze(text).await {
        Ok(raw) => decode_record(&raw, config),
        Err(e) => Err(e),
    };

    match decoded {
        Ok(record) => {
            if let Err(e) = cache.put(&fingerprint, &record) {
                tracing::warn!(error = %e, fingerprint = %fingerprint, "failed to persist analysis");
            }
            AnalysisOutcome {
                fingerprint,
                record,
                origin: RecordOrigin::Service,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "analysis unavailable, using fallback record");
            AnalysisOutcome {
                fingerprint,
                record: AnalysisRecord::unavailable(config.unavailable_summary.clone()),
                origin: RecordOrigin::Fallback,
            }
        }
    }
}

// =============================================================================
// Annotation context
// =============================================================================

/// Per-page counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageStats {
    pub fragments: usize,
    /// Fragments with at least one unit
    pub annotated_fragments: usize,
    pub units: usize,
    pub dropped_overlaps: usize,
    pub unmappable: usize,
    pub landmarks: usize,
    pub elapsed_us: u64,
}

/// One page's output: same fragment count and order as the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPage {
    pub fragments: Vec<AnnotatedFragment>,
    pub landmarks: Vec<Landmark>,
    pub stats: PageStats,
}

/// Everything needed to annotate one open document
pub struct AnnotationContext {
    generation: Generation,
    fingerprint: Fingerprint,
    origin: RecordOrigin,
    record: AnalysisRecord,
    matcher: FragmentMatcher,
    locator: SectionLandmarkLocator,
}

impl AnnotationContext {
    pub fn new(
        generation: Generation,
        outcome: AnalysisOutcome,
        references: ReferenceMap,
        config: &AnnotatorConfig,
    ) -> Result<Self> {
        let AnalysisOutcome { fingerprint, record, origin } = outcome;
        let matcher = FragmentMatcher::new(TextEntity::collect(&record), references, config)?;
        let locator = SectionLandmarkLocator::new(&record.sections, config);

        tracing::debug!(
            generation = generation.0,
            entities = matcher.entity_index().len(),
            references = matcher.references().len(),
            sections = record.sections.len(),
            "annotation context ready"
        );

        Ok(Self {
            generation,
            fingerprint,
            origin,
            record,
            matcher,
            locator,
        })
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn origin(&self) -> RecordOrigin {
        self.origin
    }

    pub fn record(&self) -> &AnalysisRecord {
        &self.record
    }

    pub fn references(&self) -> &ReferenceMap {
        self.matcher.references()
    }

    pub fn annotate_fragment(&self, content: &str) -> AnnotatedFragment {
        self.matcher.annotate(content)
    }

    /// Annotate a page and place its landmarks. Pages must be fed in order
    /// for landmark consumption to follow reading order.
    pub fn annotate_page(&mut self, fragments: &[TextFragment]) -> AnnotatedPage {
        let start = instant::Instant::now();

        let annotated: Vec<AnnotatedFragment> = fragments
            .iter()
            .map(|fragment| self.matcher.annotate(&fragment.content))
            .collect();
        let landmarks = self.locator.locate(fragments);

        let mut stats = PageStats {
            fragments: fragments.len(),
            landmarks: landmarks.len(),
            ..PageStats::default()
        };
        for fragment in &annotated {
            if !fragment.is_unchanged() {
                stats.annotated_fragments += 1;
            }
            stats.units += fragment.units.len();
            stats.dropped_overlaps += fragment.dropped_overlaps;
            stats.unmappable += fragment.unmappable;
        }
        stats.elapsed_us = start.elapsed().as_micros() as u64;

        AnnotatedPage {
            fragments: annotated,
            landmarks,
            stats,
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Full document output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    pub generation: Generation,
    pub fingerprint: Fingerprint,
    pub origin: RecordOrigin,
    pub record: AnalysisRecord,
    pub references: ReferenceMap,
    pub pages: Vec<AnnotatedPage>,
}

pub struct Pipeline<S: CacheStore, A: AnalysisService> {
    cache: AnalysisCache<S>,
    service: A,
    resolver: ReferenceResolver,
    config: AnnotatorConfig,
    generations: GenerationCounter,
}

impl<S: CacheStore, A: AnalysisService> Pipeline<S, A> {
    pub fn new(store: S, service: A, config: AnnotatorConfig) -> Self {
        Self {
            cache: AnalysisCache::new(store, &config),
            service,
            resolver: ReferenceResolver::new(),
            config,
            generations: GenerationCounter::new(),
        }
    }

    pub fn cache(&self) -> &AnalysisCache<S> {
        &self.cache
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generations.is_current(generation)
    }

    /// Read, analyze and index a document. Only a failure to read the
    /// document's pages is returned as an error.
    pub async fn open<D: DocumentSource>(&mut self, source: &D) -> Result<AnnotationContext> {
        let generation = self.generations.next();
        let pages = page_texts(source).await?;

        let outcome = analyze_with_cache(&mut self.cache, &self.service, &document_text(&pages), &self.config).await;
        let references = self
            .resolver
            .resolve(&trailing_text(&pages, self.config.trailing_pages));

        tracing::info!(
            generation = generation.0,
            pages = pages.len(),
            origin = ?outcome.origin,
            references = references.len(),
            "document opened"
        );

        AnnotationContext::new(generation, outcome, references, &self.config)
    }

    /// [`Pipeline::open`], then annotate every page in order
    pub async fn annotate_document<D: DocumentSource>(&mut self, source: &D) -> Result<AnnotatedDocument> {
        let mut context = self.open(source).await?;

        let mut pages = Vec::with_capacity(source.page_count());
        for page in 0..source.page_count() {
            let fragments = source.page_fragments(page).await?;
            pages.push(context.annotate_page(&fragments));
        }

        Ok(AnnotatedDocument {
            generation: context.generation,
            fingerprint: context.fingerprint.clone(),
            origin: context.origin,
            references: context.references().clone(),
            record: context.record.clone(),
            pages,
        })
    }
}
