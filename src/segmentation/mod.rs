//! Structure-aware text segmentation.
//!
//! The pipeline has two stages:
//!
//! * [`Segmenter`] — splits raw text into bounded spans using a layered
//!   grammar of structural and sentence-level categories, evaluated as an
//!   ordered alternation in a single left-to-right scan.
//! * [`merge_short_spans`] — folds spans below the minimum viable length
//!   (half the sentence cap) into a neighbor, producing the final chunk
//!   sequence.
//!
//! Both stages are synchronous pure functions of their input and never fail.

mod config;
mod merger;
mod rules;
mod segmenter;
mod span;

pub use config::SegmenterConfig;
pub use merger::merge_short_spans;
pub use segmenter::Segmenter;
pub use span::{Span, SpanKind};
