//! Deterministic in-memory [`DocumentStore`] for tests and demos.
//!
//! Embeddings are a hashed bag-of-words projection, so identical text always
//! produces identical vectors and no external inference service is needed.
//! Ranking quality is intentionally naive — the point is a faithful, fully
//! local implementation of the store contract, not a search engine.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHasher};
use tokio::sync::RwLock;

use super::store::{
    ChunkHit, DocumentFields, DocumentStore, ExtraStrategy, FilterValue, MetadataFilter,
    StoreError, chunk_key,
};

const DEFAULT_DIMENSIONS: usize = 32;

/// In-memory document store with deterministic embeddings.
#[derive(Debug)]
pub struct MemoryStore {
    documents: RwLock<FxHashMap<String, FxHashMap<String, DocumentFields>>>,
    dimensions: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(FxHashMap::default()),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    /// Number of documents held for `index`.
    pub async fn document_count(&self, index: &str) -> usize {
        self.documents
            .read()
            .await
            .get(index)
            .map_or(0, FxHashMap::len)
    }

    fn project(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions.max(1)];
        for token in tokenize(text) {
            let mut hasher = FxHasher::default();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % vector.len();
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }

    async fn collect_hits<F>(
        &self,
        index: &str,
        filter: Option<&MetadataFilter>,
        size: usize,
        score_chunk: F,
    ) -> Vec<ChunkHit>
    where
        F: Fn(&str, Option<&[f32]>) -> f32,
    {
        let documents = self.documents.read().await;
        let Some(indexed) = documents.get(index) else {
            return Vec::new();
        };

        let mut hits: Vec<ChunkHit> = Vec::new();
        for (id, fields) in indexed {
            if !matches_filter(&fields.metadata, filter) {
                continue;
            }
            for chunk in &fields.chunks {
                let score = score_chunk(&chunk.content, chunk.embedding.as_deref());
                if score <= 0.0 {
                    continue;
                }
                hits.push(ChunkHit {
                    key: chunk_key(id, chunk.metadata.index),
                    document_id: id.clone(),
                    document_name: fields.name.clone(),
                    content: chunk.content.clone(),
                    chunk_metadata: serde_json::to_value(chunk.metadata)
                        .unwrap_or(serde_json::Value::Null),
                    document_metadata: fields.metadata.clone(),
                    score,
                });
            }
        }

        // Map iteration order is arbitrary; sort for deterministic ranking.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        hits.truncate(size);
        hits
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn search_lexical(
        &self,
        index: &str,
        query: &str,
        filter: Option<&MetadataFilter>,
        size: usize,
    ) -> Result<Vec<ChunkHit>, StoreError> {
        let terms = tokenize(query);
        Ok(self
            .collect_hits(index, filter, size, |content, _| {
                let chunk_terms = tokenize(content);
                terms
                    .iter()
                    .filter(|term| chunk_terms.contains(term))
                    .count() as f32
            })
            .await)
    }

    async fn search_vector(
        &self,
        index: &str,
        query: &str,
        filter: Option<&MetadataFilter>,
        k: usize,
        _num_candidates: usize,
    ) -> Result<Vec<ChunkHit>, StoreError> {
        let query_vector = self.project(query);
        Ok(self
            .collect_hits(index, filter, k, |_, embedding| {
                embedding.map_or(0.0, |e| cosine(&query_vector, e))
            })
            .await)
    }

    async fn search_extra(
        &self,
        index: &str,
        strategy: ExtraStrategy,
        query: &str,
        filter: Option<&MetadataFilter>,
        size: usize,
    ) -> Result<Vec<ChunkHit>, StoreError> {
        match strategy {
            ExtraStrategy::Fuzzy => {
                let terms = tokenize(query);
                Ok(self
                    .collect_hits(index, filter, size, |content, _| {
                        let chunk_terms = tokenize(content);
                        terms
                            .iter()
                            .filter(|term| {
                                chunk_terms.iter().any(|other| fuzzy_match(term, other))
                            })
                            .count() as f32
                    })
                    .await)
            }
            ExtraStrategy::Phrase => {
                let needle = query.to_lowercase();
                Ok(self
                    .collect_hits(index, filter, size, |content, _| {
                        if needle.is_empty() {
                            0.0
                        } else {
                            content.to_lowercase().matches(&needle).count() as f32
                        }
                    })
                    .await)
            }
        }
    }

    async fn embed(&self, text: &str, _model_id: &str) -> Result<Vec<f32>, StoreError> {
        Ok(self.project(text))
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        fields: DocumentFields,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        documents
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Exact match or single-edit tolerance for terms of four chars or more.
fn fuzzy_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    if a.len() < 4 || b.len() < 4 {
        return false;
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    match long.len() - short.len() {
        0 => {
            short
                .chars()
                .zip(long.chars())
                .filter(|(x, y)| x != y)
                .count()
                <= 1
        }
        1 => {
            // One deletion: skip a single char of the longer term.
            let mut short_chars = short.chars().peekable();
            let mut skipped = false;
            for c in long.chars() {
                if short_chars.peek() == Some(&c) {
                    short_chars.next();
                } else if skipped {
                    return false;
                } else {
                    skipped = true;
                }
            }
            short_chars.peek().is_none()
        }
        _ => false,
    }
}

fn matches_filter(metadata: &serde_json::Value, filter: Option<&MetadataFilter>) -> bool {
    let Some(filter) = filter else { return true };
    filter.0.iter().all(|(field, expected)| {
        let Some(actual) = metadata.get(field) else {
            return false;
        };
        let actual = json_as_term(actual);
        match expected {
            FilterValue::One(term) => actual == *term,
            FilterValue::Many(terms) => terms.iter().any(|term| actual == *term),
        }
    })
}

fn json_as_term(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
