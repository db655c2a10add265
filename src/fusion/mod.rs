//! Reciprocal Rank Fusion over independently-ordered result lists.
//!
//! Each input list contributes `1 / (k + rank)` per item, with rank taken
//! from list position (1-based), never from native score magnitude. The sum
//! across lists rewards items that several sources agree on without having to
//! normalise incompatible score scales.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};

/// Default rank constant. Larger values flatten the discount curve; `60` is
/// the conventional default from the rank-fusion literature.
pub const DEFAULT_RRF_K: u32 = 60;

/// One item key with the native score its source assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredKey {
    pub key: String,
    pub score: f32,
}

impl ScoredKey {
    pub fn new(key: impl Into<String>, score: f32) -> Self {
        Self {
            key: key.into(),
            score,
        }
    }
}

/// An ordered result list from one search source.
#[derive(Debug, Clone)]
pub struct RankedList {
    /// Originating source name (`"lexical"`, `"vector"`, `"fuzzy"`, ...).
    pub source: String,
    /// Hits in relevance order; position defines rank.
    pub hits: Vec<ScoredKey>,
}

impl RankedList {
    pub fn new(source: impl Into<String>, hits: Vec<ScoredKey>) -> Self {
        Self {
            source: source.into(),
            hits,
        }
    }
}

/// A fused item with its accumulated RRF score and contributing sources.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionResult {
    pub key: String,
    pub score: f64,
    pub sources: BTreeSet<String>,
}

/// Fuse ranked lists into a single ranking via Reciprocal Rank Fusion.
///
/// For every item appearing in any list, the fused score is the sum over
/// lists containing it of `1 / (k + rank)`. Duplicate keys within one list
/// keep their first occurrence as the canonical rank; later duplicates are
/// ignored. Output is sorted by score descending; equal scores retain the
/// order in which the items were first seen, scanning list-by-list then
/// hit-by-hit.
///
/// # Examples
///
/// ```
/// use ragfuse::fusion::{DEFAULT_RRF_K, RankedList, ScoredKey, fuse};
///
/// let lexical = RankedList::new(
///     "lexical",
///     vec![ScoredKey::new("a", 9.1), ScoredKey::new("b", 4.2)],
/// );
/// let vector = RankedList::new(
///     "vector",
///     vec![ScoredKey::new("b", 0.93), ScoredKey::new("a", 0.88)],
/// );
///
/// let fused = fuse(&[lexical, vector], DEFAULT_RRF_K);
/// assert_eq!(fused.len(), 2);
/// assert_eq!(fused[0].key, "a"); // tied with "b", "a" was seen first
/// assert!(fused[0].sources.contains("vector"));
/// ```
pub fn fuse(lists: &[RankedList], k: u32) -> Vec<FusionResult> {
    let mut order: Vec<FusionResult> = Vec::new();
    let mut positions: FxHashMap<&str, usize> = FxHashMap::default();

    for list in lists {
        let mut seen_in_list: FxHashSet<&str> = FxHashSet::default();
        for (position, hit) in list.hits.iter().enumerate() {
            if !seen_in_list.insert(hit.key.as_str()) {
                // Duplicate within one list: first occurrence is canonical.
                continue;
            }
            let rank = position + 1;
            let contribution = 1.0 / (f64::from(k) + rank as f64);
            let at = match positions.get(hit.key.as_str()).copied() {
                Some(at) => at,
                None => {
                    positions.insert(hit.key.as_str(), order.len());
                    order.push(FusionResult {
                        key: hit.key.clone(),
                        score: 0.0,
                        sources: BTreeSet::new(),
                    });
                    order.len() - 1
                }
            };
            order[at].score += contribution;
            order[at].sources.insert(list.source.clone());
        }
    }

    order.retain(|result| result.score > 0.0);
    // Stable sort keeps first-seen order among equal scores.
    order.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    tracing::debug!(
        input_lists = lists.len(),
        rrf_k = k,
        result_count = order.len(),
        "rank fusion complete"
    );

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(source: &str, keys: &[&str]) -> RankedList {
        let hits = keys
            .iter()
            .enumerate()
            .map(|(i, key)| ScoredKey::new(*key, 1.0 - i as f32 * 0.1))
            .collect();
        RankedList::new(source, hits)
    }

    #[test]
    fn empty_input_fuses_to_empty_output() {
        assert!(fuse(&[], DEFAULT_RRF_K).is_empty());
        assert!(fuse(&[list("lexical", &[])], DEFAULT_RRF_K).is_empty());
    }

    #[test]
    fn single_list_preserves_order_with_rank_derived_scores() {
        let fused = fuse(&[list("lexical", &["a", "b", "c"])], DEFAULT_RRF_K);
        let keys: Vec<&str> = fused.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
        assert!((fused[0].score - 1.0 / 61.0).abs() < 1e-12);
        assert!((fused[1].score - 1.0 / 62.0).abs() < 1e-12);
        assert!((fused[2].score - 1.0 / 63.0).abs() < 1e-12);
    }

    #[test]
    fn two_lists_swap_top_ranks_ties_resolve_first_seen() {
        let a = list("lexical", &["x", "y", "z"]);
        let b = list("vector", &["y", "x", "z"]);
        let fused = fuse(&[a, b], 60);

        assert_eq!(fused[0].key, "x");
        assert_eq!(fused[1].key, "y");
        assert_eq!(fused[2].key, "z");
        let expected_top = 1.0 / 61.0 + 1.0 / 62.0;
        assert!((fused[0].score - expected_top).abs() < 1e-12);
        assert!((fused[1].score - expected_top).abs() < 1e-12);
        assert!((fused[2].score - 2.0 / 63.0).abs() < 1e-12);
    }

    #[test]
    fn contributing_sources_are_recorded() {
        let a = list("lexical", &["x", "y"]);
        let b = list("vector", &["y"]);
        let fused = fuse(&[a, b], DEFAULT_RRF_K);

        let y = fused.iter().find(|r| r.key == "y").unwrap();
        assert_eq!(y.sources.len(), 2);
        let x = fused.iter().find(|r| r.key == "x").unwrap();
        assert_eq!(x.sources.len(), 1);
        assert!(x.sources.contains("lexical"));
    }

    #[test]
    fn score_grows_with_agreeing_sources() {
        let solo = fuse(&[list("lexical", &["a"])], DEFAULT_RRF_K);
        let both = fuse(
            &[list("lexical", &["a"]), list("vector", &["a"])],
            DEFAULT_RRF_K,
        );
        assert!(both[0].score > solo[0].score);
    }

    #[test]
    fn duplicates_within_one_list_keep_first_rank() {
        let duped = RankedList::new(
            "lexical",
            vec![
                ScoredKey::new("a", 0.9),
                ScoredKey::new("a", 0.8),
                ScoredKey::new("b", 0.7),
            ],
        );
        let fused = fuse(&[duped], DEFAULT_RRF_K);
        assert_eq!(fused.len(), 2);
        assert!((fused[0].score - 1.0 / 61.0).abs() < 1e-12);
        // "b" keeps its positional rank (3) even though the duplicate was skipped.
        assert!((fused[1].score - 1.0 / 63.0).abs() < 1e-12);
    }

    #[test]
    fn zero_k_reduces_to_pure_reciprocal_rank() {
        let fused = fuse(&[list("lexical", &["a", "b"])], 0);
        assert!((fused[0].score - 1.0).abs() < 1e-12);
        assert!((fused[1].score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn disjoint_lists_union_all_keys() {
        let fused = fuse(
            &[list("lexical", &["a", "b"]), list("vector", &["c", "d"])],
            DEFAULT_RRF_K,
        );
        assert_eq!(fused.len(), 4);
    }
}
