//! Ingestion: turning raw documents into embedded, store-ready chunks.
//!
//! The pipeline is segment → merge → embed → persist. Segmentation and
//! merging are the pure functions from [`segmentation`](crate::segmentation);
//! embedding goes through the store's inference endpoint and persistence
//! through [`DocumentStore::index_document`], so this module owns no
//! transport of its own.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::retrieval::store::{
    ChunkField, ChunkFieldMetadata, DocumentFields, DocumentStore, StoreError,
};
use crate::segmentation::{Segmenter, Span, merge_short_spans};

/// Failure on the ingestion path.
///
/// Unlike the query path, ingestion is fallible: a document that cannot be
/// embedded or persisted must not be silently half-indexed.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

/// A document handed to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSource {
    pub id: String,
    pub name: String,
    pub text: String,
    pub metadata: serde_json::Value,
}

impl DocumentSource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            text: text.into(),
            metadata: serde_json::Value::Object(Default::default()),
        }
    }

    /// Create a source with a generated v4 id.
    pub fn generated(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), name, text)
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A finalized, merge-resolved chunk destined for storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub content: String,
    pub index: usize,
    pub offset: usize,
    pub length: usize,
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    fn from_span(span: Span) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: span.content,
            index: span.index,
            offset: span.start,
            length: span.length,
            embedding: None,
        }
    }

    fn into_field(self) -> ChunkField {
        ChunkField {
            content: self.content,
            metadata: ChunkFieldMetadata {
                index: self.index,
                offset: self.offset,
                length: self.length,
            },
            embedding: self.embedding,
        }
    }
}

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_id: String,
    /// Chunks embedded and persisted.
    pub chunk_count: usize,
    /// Spans the merger dropped because no merge neighbor existed
    /// (a short single-span document).
    pub dropped_spans: usize,
}

/// Segments, merges, embeds, and persists documents against one index.
pub struct IngestionPipeline<S> {
    store: Arc<S>,
    segmenter: Segmenter,
    index: String,
    model_id: String,
}

impl<S: DocumentStore> IngestionPipeline<S> {
    pub fn new(store: Arc<S>, index: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            store,
            segmenter: Segmenter::new(),
            index: index.into(),
            model_id: model_id.into(),
        }
    }

    /// Replace the default segmenter, e.g. to change grammar caps.
    #[must_use]
    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    /// Chunk `source`, embed every chunk, and persist the document.
    ///
    /// A document whose text yields no chunks (empty input, or a single span
    /// below the merge threshold) is not persisted; the report records what
    /// was dropped.
    pub async fn ingest(&self, source: DocumentSource) -> Result<IngestReport, IngestError> {
        let spans = self.segmenter.segment(&source.text);
        let segmented = spans.len();
        let merged = merge_short_spans(spans, self.segmenter.min_chunk_length());
        let dropped_spans = usize::from(merged.is_empty() && segmented > 0);

        if merged.is_empty() {
            tracing::debug!(
                document_id = %source.id,
                segmented,
                "document produced no viable chunks; skipping persistence"
            );
            return Ok(IngestReport {
                document_id: source.id,
                chunk_count: 0,
                dropped_spans,
            });
        }

        let mut chunks: Vec<Chunk> = merged.into_iter().map(Chunk::from_span).collect();
        for chunk in &mut chunks {
            let embedding = self.store.embed(&chunk.content, &self.model_id).await?;
            chunk.embedding = Some(embedding);
        }

        let chunk_count = chunks.len();
        let fields = DocumentFields {
            name: source.name,
            metadata: source.metadata,
            chunks: chunks.into_iter().map(Chunk::into_field).collect(),
        };
        self.store
            .index_document(&self.index, &source.id, fields)
            .await?;

        tracing::debug!(
            document_id = %source.id,
            segmented,
            chunk_count,
            "document ingested"
        );

        Ok(IngestReport {
            document_id: source.id,
            chunk_count,
            dropped_spans,
        })
    }
}
