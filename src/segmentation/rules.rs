//! The segmentation grammar as an ordered rule list.
//!
//! Categories are tried in priority order (specificity before generality) at
//! each scan position; the first rule that matches wins. Structural rules are
//! regexes with the configured caps interpolated; sentence-shaped rules
//! delegate to the procedural boundary scanner in
//! [`segmenter`](super::segmenter) so the bounded lookahead does not have to
//! be expressed as a regex.

use regex::Regex;

use super::config::SegmenterConfig;
use super::span::SpanKind;

/// How a rule recognises text at the current scan position.
#[derive(Clone)]
pub(crate) enum Matcher {
    /// A compiled pattern, anchored at the start of the remaining text.
    Pattern(Regex),
    /// The shared sentence matcher with a category-specific cap.
    Sentence {
        max_len: usize,
        /// Guarded matchers decline to start on enclosure openers and
        /// avoid-at-start characters so later categories stay reachable.
        /// The fallback rule is unguarded.
        guarded: bool,
    },
}

/// One prioritized grammar category.
#[derive(Clone)]
pub(crate) struct SegmentRule {
    pub kind: SpanKind,
    /// Line constructs only apply when the scan position is at a line start.
    pub line_start_only: bool,
    pub matcher: Matcher,
}

impl SegmentRule {
    fn pattern(kind: SpanKind, line_start_only: bool, pattern: &str) -> Self {
        // Patterns are assembled from fixed templates with numeric caps
        // interpolated, so compilation cannot fail for any config.
        let regex = Regex::new(pattern).expect("segmentation grammar pattern is well-formed");
        Self {
            kind,
            line_start_only,
            matcher: Matcher::Pattern(regex),
        }
    }

    fn sentence(kind: SpanKind, line_start_only: bool, max_len: usize, guarded: bool) -> Self {
        Self {
            kind,
            line_start_only,
            matcher: Matcher::Sentence { max_len, guarded },
        }
    }
}

/// List item markers: task checkbox, bullet, numbered, lettered.
const LIST_MARKER: &str = r"(?:[-*+•][ \t]\[[ xX]\]|[-*+•]|\d{1,3}[.)]|[a-zA-Z][.)])";

/// Body of a depth-bounded nested enclosure, e.g. parentheses within
/// parentheses. The `regex` crate has no recursion, so each nesting level is
/// written out explicitly up to `depth`.
fn enclosure_body(open: &str, close: &str, depth: usize, cap: usize) -> String {
    let mut body = format!("[^{open}{close}]{{0,{cap}}}");
    for _ in 1..depth.max(1) {
        body = format!("(?:[^{open}{close}]|{open}{body}{close}){{0,{cap}}}");
    }
    body
}

/// Build the full priority-ordered rule list for `config`.
#[allow(clippy::too_many_lines)]
pub(crate) fn build_rules(config: &SegmenterConfig) -> Vec<SegmentRule> {
    let heading = format!(
        r"^(?:[ \t]{{0,3}}\#{{1,{marks}}}[ \t][^\r\n]{{1,{content}}}|[^\r\n]{{1,{content}}}\r?\n[ \t]{{0,3}}(?:={{2,{underline}}}|-{{2,{underline}}})|<h[1-6][^>\r\n]{{0,{attrs}}}>(?s:.){{1,{content}}}?</h[1-6]>)[ \t]*\r?\n?",
        marks = config.max_heading_length,
        content = config.max_heading_content_length,
        underline = config.max_heading_underline_length,
        attrs = config.max_html_heading_attributes_length,
    );

    let citation = format!(
        r"^[ \t]{{0,3}}\[\d{{1,3}}\][ \t:]?[^\r\n]{{0,{text}}}[ \t]*\r?\n?",
        text = config.max_sentence_length,
    );

    let list_item = format!(
        r"^[ \t]{{0,3}}{marker}[ \t][^\r\n]{{1,{item}}}(?:\r?\n[ \t]{{2,{indent}}}{marker}[ \t][^\r\n]{{1,{item}}}){{0,{nested}}}[ \t]*\r?\n?",
        marker = LIST_MARKER,
        item = config.max_list_item_length,
        indent = config.max_list_indent_spaces,
        nested = config.max_nested_list_items,
    );

    let block_quote = format!(
        r"^(?:[ \t]{{0,3}}>[ \t]?[^\r\n]{{0,{line}}}(?:\r?\n|$)){{1,{lines}}}",
        line = config.max_blockquote_line_length,
        lines = config.max_blockquote_lines,
    );

    let code_block = format!(
        "^(?:(?:```|~~~)[^\\r\\n]{{0,{lang}}}\\r?\\n(?s:.){{0,{block}}}?(?:```|~~~)|<(?:pre|code)\\b[^>]{{0,{attrs}}}>(?s:.){{0,{block}}}?</(?:pre|code)>|(?:(?:[ ]{{4}}|\\t)[^\\r\\n]*(?:\\r?\\n|$)){{1,{lines}}})[ \\t]*\\r?\\n?",
        lang = config.max_code_language_length,
        block = config.max_code_block_length,
        attrs = config.max_html_tag_attributes_length,
        lines = config.max_indented_code_lines,
    );

    let table = format!(
        r"^(?:(?:[ \t]{{0,3}}\|(?:[^\r\n|]{{0,{cell}}}\|)+[ \t]*(?:\r?\n|$)){{2,{rows}}}|<table\b[^>]{{0,{attrs}}}>(?s:.){{0,{html}}}?</table>[ \t]*\r?\n?)",
        cell = config.max_table_cell_length,
        rows = config.max_table_rows,
        attrs = config.max_html_tag_attributes_length,
        html = config.max_html_table_length,
    );

    let horizontal_rule = format!(
        r"^(?:[ \t]{{0,3}}(?:(?:-[ \t]*){{{min},}}|(?:\*[ \t]*){{{min},}}|(?:_[ \t]*){{{min},}})(?:\r?\n|$)|<hr\b[^>]{{0,{attrs}}}/?>[ \t]*\r?\n?)",
        min = config.min_horizontal_rule_length,
        attrs = config.max_html_tag_attributes_length,
    );

    let standalone_html_line = format!(
        r"^<[a-zA-Z][a-zA-Z0-9]{{0,15}}\b[^>\r\n]{{0,{attrs}}}>[^\r\n]{{1,{line}}}</[a-zA-Z][a-zA-Z0-9]{{0,15}}>[ \t]*\r?\n?",
        attrs = config.max_html_tag_attributes_length,
        line = config.max_standalone_line_length,
    );

    let paren_body = enclosure_body(
        r"\(",
        r"\)",
        config.max_nested_parentheses,
        config.max_parenthetical_content_length,
    );
    let bracket_body = enclosure_body(
        r"\[",
        r"\]",
        config.max_nested_parentheses,
        config.max_parenthetical_content_length,
    );
    let inline_enclosure = format!(
        "^(?:\"{{3}}(?s:.){{1,{quoted}}}?\"{{3}}|'{{3}}(?s:.){{1,{quoted}}}?'{{3}}|\"[^\"\\r\\n]{{1,{quoted}}}\"|'[^'\\r\\n]{{1,{quoted}}}'|\u{201c}[^\u{201d}\\r\\n]{{1,{quoted}}}\u{201d}|\u{2018}[^\u{2019}\\r\\n]{{1,{quoted}}}\u{2019}|`[^`\\r\\n]{{1,{quoted}}}`|\\({paren}\\)|\\[{bracket}\\]|\\$[^$\\r\\n]{{1,{math}}}\\$)",
        quoted = config.max_quoted_text_length,
        paren = paren_body,
        bracket = bracket_body,
        math = config.max_math_inline_length,
    );

    let html_element = format!(
        r"^(?:<[a-zA-Z][a-zA-Z0-9]{{0,15}}\b[^>]{{0,{attrs}}}>(?s:.){{0,{content}}}?</[a-zA-Z][a-zA-Z0-9]{{0,15}}>|<[a-zA-Z][a-zA-Z0-9]{{0,15}}\b[^>]{{0,{attrs}}}/?>)[ \t]*\r?\n?",
        attrs = config.max_html_tag_attributes_length,
        content = config.max_html_tag_content_length,
    );

    let math_block = format!(
        r"^(?:\$\$(?s:.){{1,{block}}}?\$\$|\\\[(?s:.){{1,{block}}}?\\\]|\\\((?s:.){{1,{inline}}}?\\\))[ \t]*\r?\n?",
        block = config.max_math_block_length,
        inline = config.max_math_inline_length,
    );

    vec![
        SegmentRule::pattern(SpanKind::Heading, true, &heading),
        SegmentRule::pattern(SpanKind::Citation, true, &citation),
        SegmentRule::pattern(SpanKind::ListItem, true, &list_item),
        SegmentRule::pattern(SpanKind::BlockQuote, true, &block_quote),
        SegmentRule::pattern(SpanKind::CodeBlock, true, &code_block),
        SegmentRule::pattern(SpanKind::Table, true, &table),
        SegmentRule::pattern(SpanKind::HorizontalRule, true, &horizontal_rule),
        SegmentRule::pattern(SpanKind::StandaloneLine, true, &standalone_html_line),
        SegmentRule::sentence(
            SpanKind::StandaloneLine,
            true,
            config.max_standalone_line_length,
            true,
        ),
        SegmentRule::sentence(SpanKind::Sentence, false, config.max_sentence_length, true),
        SegmentRule::pattern(SpanKind::InlineEnclosure, false, &inline_enclosure),
        SegmentRule::sentence(SpanKind::Paragraph, true, config.max_paragraph_length, true),
        SegmentRule::pattern(SpanKind::HtmlElement, false, &html_element),
        SegmentRule::pattern(SpanKind::MathBlock, false, &math_block),
        SegmentRule::sentence(SpanKind::Fallback, false, config.max_sentence_length, false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_rules_compile_with_default_config() {
        let rules = build_rules(&SegmenterConfig::default());
        assert_eq!(rules.len(), 15);
    }

    #[test]
    fn rules_compile_with_extreme_caps() {
        let tiny = SegmenterConfig {
            max_heading_length: 1,
            max_sentence_length: 1,
            max_nested_parentheses: 1,
            lookahead_range: 0,
            ..Default::default()
        };
        build_rules(&tiny);

        let huge = SegmenterConfig {
            max_code_block_length: 100_000,
            max_paragraph_length: 100_000,
            max_nested_parentheses: 8,
            ..Default::default()
        };
        build_rules(&huge);
    }

    #[test]
    fn category_priority_is_specificity_before_generality() {
        let rules = build_rules(&SegmenterConfig::default());
        let kinds: Vec<SpanKind> = rules.iter().map(|r| r.kind).collect();
        let position = |kind: SpanKind| kinds.iter().position(|k| *k == kind).unwrap();
        assert!(position(SpanKind::Heading) < position(SpanKind::ListItem));
        assert!(position(SpanKind::CodeBlock) < position(SpanKind::Sentence));
        assert!(position(SpanKind::Sentence) < position(SpanKind::InlineEnclosure));
        assert_eq!(kinds.last(), Some(&SpanKind::Fallback));
    }

    #[test]
    fn nested_enclosure_body_is_depth_bounded() {
        let body = enclosure_body(r"\(", r"\)", 3, 50);
        let pattern = format!(r"^\({body}\)");
        let regex = Regex::new(&pattern).unwrap();
        assert!(regex.is_match("(a (b (c) d) e)"));
    }
}
