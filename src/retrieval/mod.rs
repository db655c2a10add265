//! Hybrid query orchestration: concurrent fan-out to the store, a wait-all
//! barrier, rank fusion, and provenance assembly.
//!
//! The orchestrator never fails: a sub-query that errors or times out is
//! logged and dropped from fusion, and if every source fails the result set
//! is empty rather than an error. Callers distinguish "no matches" from
//! "system down" via logs, not the return value.

pub mod memory;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, join_all};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::fusion::{DEFAULT_RRF_K, RankedList, ScoredKey, fuse};

pub use memory::MemoryStore;
pub use store::{
    ChunkField, ChunkFieldMetadata, ChunkHit, DocumentFields, DocumentStore, ExtraStrategy,
    FilterValue, MetadataFilter, StoreError, chunk_key,
};

/// Tuning knobs for [`HybridRetriever`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RetrieverOptions {
    /// Rank constant passed to [`fuse`].
    pub rrf_k: u32,
    /// Each sub-query requests `size * window_multiplier` hits so fusion has
    /// more than `size` candidates to agree on.
    pub window_multiplier: usize,
    /// Vector search examines `size * candidate_multiplier` approximate
    /// nearest-neighbor candidates.
    pub candidate_multiplier: usize,
    /// Per-sub-query deadline; a timeout is treated like any other failure.
    pub request_timeout: Option<Duration>,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            rrf_k: DEFAULT_RRF_K,
            window_multiplier: 2,
            candidate_multiplier: 10,
            request_timeout: None,
        }
    }
}

/// One hybrid query.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub text: String,
    pub filter: Option<MetadataFilter>,
    /// Maximum number of results to return.
    pub size: usize,
    /// Issue a vector sub-query alongside the lexical one.
    pub include_vector: bool,
    /// Additional strategies, one sub-query each.
    pub extra_strategies: Vec<ExtraStrategy>,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filter: None,
            size: 5,
            include_vector: true,
            extra_strategies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn include_vector(mut self, include: bool) -> Self {
        self.include_vector = include;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: ExtraStrategy) -> Self {
        self.extra_strategies.push(strategy);
        self
    }
}

/// Native score one source assigned to a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceScore {
    pub source: String,
    pub score: f32,
}

/// A fused, provenance-enriched query hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Stable chunk key (document id plus chunk ordinal).
    pub key: String,
    pub document_id: String,
    pub document_name: String,
    /// The chunk text.
    pub content: String,
    pub chunk_metadata: serde_json::Value,
    pub document_metadata: serde_json::Value,
    /// Native score per contributing source, in sighting order.
    pub per_source_scores: Vec<SourceScore>,
    /// Fused reciprocal-rank score.
    pub rrf_score: f64,
    /// The score callers should rank by; equals `rrf_score`.
    pub final_score: f64,
}

/// Chunk data gathered while draining sub-query results; recorded on first
/// sighting, extended with further per-source scores on later sightings.
struct ChunkAccumulator {
    document_id: String,
    document_name: String,
    content: String,
    chunk_metadata: serde_json::Value,
    document_metadata: serde_json::Value,
    per_source_scores: Vec<SourceScore>,
}

impl ChunkAccumulator {
    fn first_sighting(source: &str, hit: ChunkHit) -> Self {
        Self {
            document_id: hit.document_id,
            document_name: hit.document_name,
            content: hit.content,
            chunk_metadata: hit.chunk_metadata,
            document_metadata: hit.document_metadata,
            per_source_scores: vec![SourceScore {
                source: source.to_string(),
                score: hit.score,
            }],
        }
    }
}

/// Fans a query out to the store's search strategies and fuses the answers.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use ragfuse::retrieval::{HybridRetriever, MemoryStore, QueryRequest};
///
/// # async fn example() {
/// let store = Arc::new(MemoryStore::new());
/// let retriever = HybridRetriever::new(store, "knowledge-base");
/// let results = retriever
///     .query(&QueryRequest::new("how does rank fusion work").with_size(3))
///     .await;
/// # }
/// ```
pub struct HybridRetriever<S> {
    store: Arc<S>,
    index: String,
    options: RetrieverOptions,
}

impl<S: DocumentStore> HybridRetriever<S> {
    pub fn new(store: Arc<S>, index: impl Into<String>) -> Self {
        Self {
            store,
            index: index.into(),
            options: RetrieverOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RetrieverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RetrieverOptions {
        &self.options
    }

    /// Run the hybrid query; returns at most `request.size` results.
    pub async fn query(&self, request: &QueryRequest) -> Vec<QueryResult> {
        if request.size == 0 {
            return Vec::new();
        }

        let window = request
            .size
            .saturating_mul(self.options.window_multiplier)
            .max(request.size);
        let candidates = request
            .size
            .saturating_mul(self.options.candidate_multiplier)
            .max(window);
        let filter = request.filter.as_ref();

        // Fixed set of tagged sub-queries, all in flight at once.
        let mut sub_queries: Vec<(&'static str, SearchFuture<'_>)> = Vec::new();
        sub_queries.push((
            "lexical",
            Box::pin(
                self.store
                    .search_lexical(&self.index, &request.text, filter, window),
            ),
        ));
        if request.include_vector {
            sub_queries.push((
                "vector",
                Box::pin(self.store.search_vector(
                    &self.index,
                    &request.text,
                    filter,
                    window,
                    candidates,
                )),
            ));
        }
        for strategy in &request.extra_strategies {
            sub_queries.push((
                strategy.name(),
                Box::pin(self.store.search_extra(
                    &self.index,
                    *strategy,
                    &request.text,
                    filter,
                    window,
                )),
            ));
        }

        let deadline = self.options.request_timeout;
        let outcomes = join_all(sub_queries.into_iter().map(|(source, search)| async move {
            let outcome = match deadline {
                Some(limit) => match tokio::time::timeout(limit, search).await {
                    Ok(result) => result,
                    Err(_) => Err(StoreError::Timeout(limit)),
                },
                None => search.await,
            };
            (source, outcome)
        }))
        .await;

        // Barrier passed: aggregate single-threaded, no locking needed.
        let mut lists: Vec<RankedList> = Vec::new();
        let mut accumulators: FxHashMap<String, ChunkAccumulator> = FxHashMap::default();

        for (source, outcome) in outcomes {
            match outcome {
                Err(error) => {
                    tracing::warn!(
                        source,
                        error = %error,
                        "sub-query failed; dropping source from fusion"
                    );
                }
                Ok(hits) => {
                    let mut ranked = Vec::with_capacity(hits.len());
                    for hit in hits {
                        ranked.push(ScoredKey::new(hit.key.clone(), hit.score));
                        match accumulators.get_mut(&hit.key) {
                            Some(accumulator) => {
                                accumulator.per_source_scores.push(SourceScore {
                                    source: source.to_string(),
                                    score: hit.score,
                                });
                            }
                            None => {
                                accumulators.insert(
                                    hit.key.clone(),
                                    ChunkAccumulator::first_sighting(source, hit),
                                );
                            }
                        }
                    }
                    lists.push(RankedList::new(source, ranked));
                }
            }
        }

        if lists.is_empty() {
            tracing::warn!("every search source failed; returning empty result set");
            return Vec::new();
        }

        let fused = fuse(&lists, self.options.rrf_k);
        let mut results = Vec::with_capacity(request.size.min(fused.len()));
        for item in fused.into_iter().take(request.size) {
            let Some(accumulator) = accumulators.remove(&item.key) else {
                continue;
            };
            results.push(QueryResult {
                key: item.key,
                document_id: accumulator.document_id,
                document_name: accumulator.document_name,
                content: accumulator.content,
                chunk_metadata: accumulator.chunk_metadata,
                document_metadata: accumulator.document_metadata,
                per_source_scores: accumulator.per_source_scores,
                rrf_score: item.score,
                final_score: item.score,
            });
        }

        tracing::debug!(
            sources = lists.len(),
            results = results.len(),
            "hybrid query complete"
        );
        results
    }
}

type SearchFuture<'a> = BoxFuture<'a, Result<Vec<ChunkHit>, StoreError>>;
