//! Length caps governing the segmentation grammar.
//!
//! Every grammar category is bounded so a single match can never swallow a
//! disproportionate amount of context and worst-case scan cost stays linear.
//! The defaults reproduce the cap set the grammar was tuned with; override
//! individual fields with struct-update syntax or the setters.

use serde::{Deserialize, Serialize};

/// Configuration for [`Segmenter`](super::Segmenter).
///
/// All caps are counted in Unicode scalar values (chars), not bytes.
///
/// # Examples
///
/// ```
/// use ragfuse::segmentation::SegmenterConfig;
///
/// let config = SegmenterConfig {
///     max_sentence_length: 600,
///     ..Default::default()
/// };
/// assert_eq!(config.min_chunk_length(), 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SegmenterConfig {
    /// Maximum number of `#` marker characters in an ATX heading.
    pub max_heading_length: usize,
    /// Maximum heading text length.
    pub max_heading_content_length: usize,
    /// Maximum length of a Setext heading underline.
    pub max_heading_underline_length: usize,
    /// Maximum attribute length inside an HTML `h1`–`h6` tag.
    pub max_html_heading_attributes_length: usize,
    /// Maximum length of a single list item.
    pub max_list_item_length: usize,
    /// Maximum number of nested list items folded into one span.
    pub max_nested_list_items: usize,
    /// Maximum indentation (spaces) recognised for nested list items.
    pub max_list_indent_spaces: usize,
    /// Maximum length of one quoted line.
    pub max_blockquote_line_length: usize,
    /// Maximum number of lines in one block quote span.
    pub max_blockquote_lines: usize,
    /// Maximum length of a fenced or HTML code block.
    pub max_code_block_length: usize,
    /// Maximum length of the language tag after a code fence.
    pub max_code_language_length: usize,
    /// Maximum number of indented code lines folded into one span.
    pub max_indented_code_lines: usize,
    /// Maximum length of a single Markdown table cell.
    pub max_table_cell_length: usize,
    /// Maximum number of Markdown table rows in one span.
    pub max_table_rows: usize,
    /// Maximum length of an HTML table span.
    pub max_html_table_length: usize,
    /// Minimum marker repetition for a horizontal rule.
    pub min_horizontal_rule_length: usize,
    /// Maximum sentence length; also drives the merge threshold.
    pub max_sentence_length: usize,
    /// Maximum length of quoted inline text.
    pub max_quoted_text_length: usize,
    /// Maximum length of parenthesised or bracketed inline content.
    pub max_parenthetical_content_length: usize,
    /// Maximum nesting depth for parentheses and brackets.
    pub max_nested_parentheses: usize,
    /// Maximum length of inline math (`$...$`).
    pub max_math_inline_length: usize,
    /// Maximum length of a math block (`$$...$$`).
    pub max_math_block_length: usize,
    /// Maximum length of a blank-line-delimited paragraph.
    pub max_paragraph_length: usize,
    /// Maximum length of a standalone line span.
    pub max_standalone_line_length: usize,
    /// Maximum attribute length inside a generic HTML tag.
    pub max_html_tag_attributes_length: usize,
    /// Maximum content length inside a generic HTML tag span.
    pub max_html_tag_content_length: usize,
    /// How far past a cap the sentence matcher may look for a genuine
    /// sentence end instead of cutting mid-sentence.
    pub lookahead_range: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_heading_length: 7,
            max_heading_content_length: 200,
            max_heading_underline_length: 200,
            max_html_heading_attributes_length: 100,
            max_list_item_length: 200,
            max_nested_list_items: 6,
            max_list_indent_spaces: 7,
            max_blockquote_line_length: 200,
            max_blockquote_lines: 15,
            max_code_block_length: 1500,
            max_code_language_length: 20,
            max_indented_code_lines: 20,
            max_table_cell_length: 200,
            max_table_rows: 20,
            max_html_table_length: 2000,
            min_horizontal_rule_length: 3,
            max_sentence_length: 400,
            max_quoted_text_length: 300,
            max_parenthetical_content_length: 200,
            max_nested_parentheses: 5,
            max_math_inline_length: 100,
            max_math_block_length: 500,
            max_paragraph_length: 1000,
            max_standalone_line_length: 800,
            max_html_tag_attributes_length: 100,
            max_html_tag_content_length: 1000,
            lookahead_range: 100,
        }
    }
}

impl SegmenterConfig {
    /// Create a configuration with the default cap set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum sentence length.
    #[must_use]
    pub fn max_sentence_length(mut self, cap: usize) -> Self {
        self.max_sentence_length = cap;
        self
    }

    /// Set the sentence-boundary lookahead range.
    #[must_use]
    pub fn lookahead_range(mut self, range: usize) -> Self {
        self.lookahead_range = range;
        self
    }

    /// Minimum viable chunk length: spans shorter than this are folded into a
    /// neighbor by [`merge_short_spans`](super::merge_short_spans).
    #[must_use]
    pub fn min_chunk_length(&self) -> usize {
        self.max_sentence_length / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_grammar_caps() {
        let config = SegmenterConfig::default();
        assert_eq!(config.max_sentence_length, 400);
        assert_eq!(config.lookahead_range, 100);
        assert_eq!(config.min_chunk_length(), 200);
    }

    #[test]
    fn min_chunk_length_uses_integer_division() {
        let config = SegmenterConfig::default().max_sentence_length(601);
        assert_eq!(config.min_chunk_length(), 300);
    }

    #[test]
    fn deserializes_with_partial_overrides() {
        let config: SegmenterConfig =
            serde_json::from_str(r#"{"max_sentence_length": 250}"#).unwrap();
        assert_eq!(config.max_sentence_length, 250);
        assert_eq!(config.max_heading_length, 7);
    }
}
