//! # ragfuse: structure-aware chunking and rank-fusion retrieval
//!
//! ```text
//! Raw text ──► segmentation::Segmenter ──► spans
//!                         │
//!                         └─► segmentation::merge_short_spans ──► chunks
//!                                            │
//! ingestion::IngestionPipeline ──► Store::embed ──► Store::index_document
//!
//! Query ──► retrieval::HybridRetriever ─┬─► Store::search_lexical ─┐
//!                                       ├─► Store::search_vector ──┤ barrier
//!                                       └─► extra strategies ──────┘
//!                                            │
//!                                            └─► fusion::fuse ──► QueryResults
//! ```
//!
//! The crate has two independent halves joined by the store seam:
//!
//! * **Ingestion** — [`segmentation::Segmenter`] splits text into bounded,
//!   structure-aware spans (headings, lists, quotes, code, tables,
//!   sentences, ...); [`segmentation::merge_short_spans`] folds fragments
//!   below the minimum viable length into a neighbor; the
//!   [`ingestion::IngestionPipeline`] embeds and persists the result.
//! * **Retrieval** — [`retrieval::HybridRetriever`] fans a query out to the
//!   store's search strategies concurrently, joins on all of them, and merges
//!   the surviving ranked lists with [`fusion::fuse`] (Reciprocal Rank
//!   Fusion), tolerant of partial search failures.
//!
//! The remote backend sits behind [`retrieval::DocumentStore`];
//! [`retrieval::MemoryStore`] is a deterministic in-process implementation
//! for tests and demos.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use ragfuse::ingestion::{DocumentSource, IngestionPipeline};
//! use ragfuse::retrieval::{HybridRetriever, MemoryStore, QueryRequest};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//!
//! let pipeline = IngestionPipeline::new(Arc::clone(&store), "kb", "embed-model");
//! pipeline
//!     .ingest(DocumentSource::new(
//!         "doc-1",
//!         "fusion notes",
//!         "Reciprocal rank fusion combines independently ordered result lists \
//!          into a single ranking. Each list contributes one over k plus rank \
//!          for every item it contains, so items that several sources agree on \
//!          rise to the top of the fused ordering without score normalisation.",
//!     ))
//!     .await?;
//!
//! let retriever = HybridRetriever::new(store, "kb");
//! let results = retriever
//!     .query(&QueryRequest::new("rank fusion").with_size(3))
//!     .await;
//! assert!(!results.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod fusion;
pub mod ingestion;
pub mod retrieval;
pub mod segmentation;

pub use fusion::{DEFAULT_RRF_K, FusionResult, RankedList, ScoredKey, fuse};
pub use ingestion::{Chunk, DocumentSource, IngestError, IngestReport, IngestionPipeline};
pub use retrieval::{
    ChunkHit, DocumentStore, ExtraStrategy, HybridRetriever, MemoryStore, MetadataFilter,
    QueryRequest, QueryResult, RetrieverOptions, SourceScore, StoreError,
};
pub use segmentation::{Segmenter, SegmenterConfig, Span, SpanKind, merge_short_spans};
