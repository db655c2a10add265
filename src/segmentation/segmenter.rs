//! Linear left-to-right scanner over the prioritized grammar.
//!
//! At every scan position the rules from [`rules`](super::rules) are tried in
//! order and the first match wins; positions no rule claims (inter-span
//! whitespace) are skipped one char at a time. The fallback rule accepts any
//! residual non-whitespace text, so segmentation is total: it never fails and
//! returns at least one span for any input containing non-whitespace.

use once_cell::sync::Lazy;

use super::config::SegmenterConfig;
use super::rules::{Matcher, SegmentRule, build_rules};
use super::span::{Span, SpanKind};

static DEFAULT_RULES: Lazy<Vec<SegmentRule>> =
    Lazy::new(|| build_rules(&SegmenterConfig::default()));

/// Splits raw text into bounded, structure-aware spans.
///
/// # Examples
///
/// ```
/// use ragfuse::segmentation::{Segmenter, SpanKind};
///
/// let segmenter = Segmenter::new();
/// let spans = segmenter.segment("# Title\n\nBody sentence.");
/// assert_eq!(spans[0].kind, SpanKind::Heading);
/// assert_eq!(spans[0].content, "# Title");
/// ```
pub struct Segmenter {
    config: SegmenterConfig,
    rules: Vec<SegmentRule>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter {
    /// Create a segmenter with the default grammar caps.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SegmenterConfig::default(),
            rules: DEFAULT_RULES.clone(),
        }
    }

    /// Create a segmenter with custom grammar caps.
    #[must_use]
    pub fn with_config(config: SegmenterConfig) -> Self {
        let rules = build_rules(&config);
        Self { config, rules }
    }

    /// The caps this segmenter was built with.
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Minimum viable chunk length derived from the sentence cap.
    #[must_use]
    pub fn min_chunk_length(&self) -> usize {
        self.config.min_chunk_length()
    }

    /// Split `text` into document-ordered, non-overlapping spans.
    ///
    /// Empty or whitespace-only input yields an empty vec; anything else
    /// yields at least one span.
    pub fn segment(&self, text: &str) -> Vec<Span> {
        let mut spans: Vec<Span> = Vec::new();
        let mut pos = 0;
        let mut at_line_start = true;

        while pos < text.len() {
            let rest = &text[pos..];
            if let Some((kind, len)) = self.match_at(rest, at_line_start) {
                let matched = &rest[..len];
                let content = matched.trim();
                if !content.is_empty() {
                    let lead = matched.len() - matched.trim_start().len();
                    spans.push(Span::new(content, pos + lead, spans.len(), kind));
                }
                at_line_start = matched.ends_with('\n');
                pos += len;
            } else {
                let Some(ch) = rest.chars().next() else { break };
                // Leading indentation keeps line-start status so indented
                // constructs (code, nested lists) still see a line boundary.
                at_line_start = ch == '\n' || (at_line_start && matches!(ch, ' ' | '\t'));
                pos += ch.len_utf8();
            }
        }

        tracing::debug!(spans = spans.len(), bytes = text.len(), "segmentation complete");
        spans
    }

    fn match_at(&self, rest: &str, at_line_start: bool) -> Option<(SpanKind, usize)> {
        for rule in &self.rules {
            if rule.line_start_only && !at_line_start {
                continue;
            }
            let matched = match &rule.matcher {
                Matcher::Pattern(regex) => regex.find(rest).map(|found| found.end()),
                Matcher::Sentence { max_len, guarded } => {
                    match_sentence(rest, *max_len, self.config.lookahead_range, *guarded)
                }
            };
            if let Some(end) = matched {
                if end > 0 {
                    return Some((rule.kind, end));
                }
            }
        }
        None
    }
}

/// Match a sentence-shaped span at the start of `rest`.
///
/// Returns the byte length of the match: text up to `max_len` chars ending at
/// the first sentence boundary, where a boundary is terminal punctuation
/// (optionally followed by one closing quote) followed by whitespace or end of
/// text, or an end of line, or the end of the text. When no boundary falls
/// within the cap the scan extends up to `lookahead` further chars to reach
/// one before giving up and cutting at the cap.
pub(crate) fn match_sentence(
    rest: &str,
    max_len: usize,
    lookahead: usize,
    guarded: bool,
) -> Option<usize> {
    let first = rest.chars().next()?;
    if first.is_whitespace() {
        return None;
    }
    if guarded && (is_avoid_at_start(first) || is_enclosure_opener(first)) {
        return None;
    }

    let cap = max_len.max(1);
    let limit = cap.saturating_add(lookahead);
    let mut count = 0usize;
    let mut cap_end: Option<usize> = None;
    let mut prev: Option<char> = None;
    let mut iter = rest.char_indices().peekable();

    while let Some((idx, ch)) = iter.next() {
        if count == cap && cap_end.is_none() {
            cap_end = Some(idx);
        }
        if matches!(ch, '\n' | '\r') {
            // Sentences never cross lines.
            return Some(idx);
        }
        if is_terminal_punct(ch) && !prev.is_some_and(is_boundary_avoid) {
            let end = idx + ch.len_utf8();
            match iter.peek().copied() {
                None => return Some(end),
                Some((_, next)) if next.is_whitespace() => return Some(end),
                Some((quote_idx, quote)) if is_closing_quote(quote) => {
                    let quote_end = quote_idx + quote.len_utf8();
                    let after = rest[quote_end..].chars().next();
                    if after.is_none_or(char::is_whitespace) {
                        return Some(quote_end);
                    }
                }
                Some(_) => {}
            }
        }
        count += 1;
        if count >= limit {
            // No boundary within cap + lookahead: hard cut at the cap.
            return Some(cap_end.unwrap_or(idx + ch.len_utf8()));
        }
        prev = Some(ch);
    }

    // Text ended inside the cap + lookahead window; end of text is a boundary.
    Some(rest.len())
}

fn is_terminal_punct(ch: char) -> bool {
    matches!(
        ch,
        '.' | '!' | '?' | '…' | '。' | '！' | '？' | '‽' | '⁇' | '⁈' | '⁉'
    )
}

/// Characters that disqualify an immediately following terminal punctuation
/// from being a sentence boundary.
fn is_boundary_avoid(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, ',' | ';' | ':' | '(' | '[' | '{' | '“' | '‘')
}

fn is_closing_quote(ch: char) -> bool {
    matches!(ch, '"' | '\'' | '”' | '’' | '»' | '›')
}

fn is_avoid_at_start(ch: char) -> bool {
    matches!(ch, ',' | ';' | ':' | ')' | ']' | '}' | '>' | '”' | '’' | '»')
}

fn is_enclosure_opener(ch: char) -> bool {
    matches!(
        ch,
        '"' | '\'' | '“' | '‘' | '`' | '(' | '[' | '{' | '$' | '<'
    )
}
