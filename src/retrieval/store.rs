//! The store seam: an implementation-agnostic contract for the remote
//! document-plus-vector backend.
//!
//! The retrieval and ingestion layers only ever talk to a [`DocumentStore`],
//! so any backend that can rank chunks lexically and by vector similarity can
//! sit behind the fusion core. Transport, retries, and authentication all
//! belong to implementations, never to this crate.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure surfaced by a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or the connection broke mid-request.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request exceeded the caller-configured deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered with something the client could not interpret.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The backend reported an error of its own.
    #[error("backend error: {0}")]
    Backend(String),

    /// The backend does not implement the requested capability.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// A single filter value: one exact term or a set of acceptable terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

/// Metadata filter applied as an AND of exact/terms matches.
///
/// Keys address document metadata fields; a [`FilterValue::Many`] entry
/// matches when the field equals any of the listed terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter(pub BTreeMap<String, FilterValue>);

impl MetadataFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value` exactly.
    #[must_use]
    pub fn term(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(field.into(), FilterValue::One(value.into()));
        self
    }

    /// Require `field` to equal any of `values`.
    #[must_use]
    pub fn terms<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.0.insert(
            field.into(),
            FilterValue::Many(values.into_iter().map(Into::into).collect()),
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An additional search strategy beyond lexical and vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ExtraStrategy {
    /// Edit-distance-tolerant term matching.
    Fuzzy,
    /// Exact phrase containment.
    Phrase,
}

impl ExtraStrategy {
    /// Source name used for provenance tagging.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Fuzzy => "fuzzy",
            Self::Phrase => "phrase",
        }
    }
}

/// Stable chunk identity: document id plus chunk ordinal.
#[must_use]
pub fn chunk_key(document_id: &str, chunk_index: usize) -> String {
    format!("{document_id}_{chunk_index}")
}

/// One chunk-level hit returned by a store search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkHit {
    /// Stable chunk key; see [`chunk_key`].
    pub key: String,
    pub document_id: String,
    pub document_name: String,
    /// The chunk text.
    pub content: String,
    /// Chunk-level metadata (`index`, `offset`, `length`).
    pub chunk_metadata: serde_json::Value,
    /// Document-level metadata.
    pub document_metadata: serde_json::Value,
    /// Native relevance score assigned by the source.
    pub score: f32,
}

/// Chunk-level position metadata persisted alongside the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFieldMetadata {
    pub index: usize,
    pub offset: usize,
    pub length: usize,
}

/// One chunk as persisted inside a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkField {
    pub content: String,
    pub metadata: ChunkFieldMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// The fields persisted for one document: name, metadata, and its chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFields {
    pub name: String,
    pub metadata: serde_json::Value,
    pub chunks: Vec<ChunkField>,
}

/// Contract the fusion core and ingestion pipeline consume.
///
/// Implementations own transport, serialization, and any retry policy. Every
/// search method returns hits in relevance order — position is what the
/// fusion layer turns into rank.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Lexical relevance ranking over chunk content.
    async fn search_lexical(
        &self,
        index: &str,
        query: &str,
        filter: Option<&MetadataFilter>,
        size: usize,
    ) -> Result<Vec<ChunkHit>, StoreError>;

    /// Approximate nearest-neighbor ranking over stored chunk embeddings.
    ///
    /// The store resolves query-time embedding internally (or accepts raw
    /// text); the fusion core never computes vectors on the query path.
    async fn search_vector(
        &self,
        index: &str,
        query: &str,
        filter: Option<&MetadataFilter>,
        k: usize,
        num_candidates: usize,
    ) -> Result<Vec<ChunkHit>, StoreError>;

    /// Ranking for one additional strategy (fuzzy, phrase).
    async fn search_extra(
        &self,
        index: &str,
        strategy: ExtraStrategy,
        query: &str,
        filter: Option<&MetadataFilter>,
        size: usize,
    ) -> Result<Vec<ChunkHit>, StoreError>;

    /// Compute an embedding via the store's inference endpoint.
    ///
    /// Used on the ingestion path only.
    async fn embed(&self, text: &str, model_id: &str) -> Result<Vec<f32>, StoreError>;

    /// Persist a document with its chunk fields.
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        fields: DocumentFields,
    ) -> Result<(), StoreError>;
}
