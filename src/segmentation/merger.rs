//! Short-span folding: one forward pass that eliminates fragments below the
//! minimum viable length by merging them into a neighbor.
//!
//! The pass is deliberately not iterated to a fixed point: each short span is
//! folded exactly once, and a run of short spans with no viable anchor on
//! either side is dropped outright rather than retried. That is accepted
//! behavior, not something to repair here.

use super::span::Span;

/// Fold spans shorter than `min_len` chars into an adjacent span.
///
/// Each short span is merged into the shorter of its two neighbors — the last
/// span already placed in the result on the left, the next *original* span on
/// the right — with ties going left and an absent neighbor treated as
/// infinitely long. Merge-right mutates a staging copy of the input in place
/// so the enlarged right span is what the next iteration sees. A short span
/// with no neighbor on either side is dropped. Survivors are re-indexed
/// sequentially from 0.
///
/// # Examples
///
/// ```
/// use ragfuse::segmentation::{Segmenter, SegmenterConfig, merge_short_spans};
///
/// let segmenter = Segmenter::new();
/// let spans = segmenter.segment("# Heading\n\nA much longer body sentence follows the heading.");
/// let chunks = merge_short_spans(spans, 20);
/// assert!(chunks.iter().all(|chunk| chunk.length >= 20));
/// ```
pub fn merge_short_spans(spans: Vec<Span>, min_len: usize) -> Vec<Span> {
    // Staging arena: merge-right writes into `staged[i + 1]` by index so the
    // update is visible on the next iteration without reference aliasing.
    let mut staged = spans;
    let mut result: Vec<Span> = Vec::new();

    for i in 0..staged.len() {
        let span = staged[i].clone();
        if span.length >= min_len {
            let index = result.len();
            let mut placed = span;
            placed.index = index;
            result.push(placed);
            continue;
        }

        let left_len = result.last().map(|left| left.length);
        let right_len = staged.get(i + 1).map(|right| right.length);

        match (left_len, right_len) {
            (None, None) => {
                tracing::debug!(
                    length = span.length,
                    min_len,
                    "dropping short span with no merge neighbor"
                );
            }
            // Ties go left; an absent neighbor counts as infinitely long.
            (Some(left), right) if right.is_none_or(|r| left <= r) => {
                let last = result
                    .last_mut()
                    .expect("left neighbor length came from a placed span");
                last.content.push_str(&span.content);
                last.length += span.length;
                last.end = span.end;
            }
            _ => {
                let right = &mut staged[i + 1];
                let mut content = span.content;
                content.push_str(&right.content);
                right.content = content;
                right.length += span.length;
                right.start = span.start;
            }
        }
    }

    result
}
