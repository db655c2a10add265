use serde::{Deserialize, Serialize};

/// Which grammar category produced a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum SpanKind {
    /// ATX, Setext, or HTML `h1`–`h6` heading.
    Heading,
    /// Citation-style bracket reference (`[n] ...`).
    Citation,
    /// Bulleted, numbered, lettered, or task list item.
    ListItem,
    /// Block quote.
    BlockQuote,
    /// Fenced, indented, or HTML code block.
    CodeBlock,
    /// Markdown pipe table or HTML table.
    Table,
    /// Horizontal rule.
    HorizontalRule,
    /// Standalone single line or phrase.
    StandaloneLine,
    /// General sentence.
    Sentence,
    /// Quoted, parenthesised, bracketed, or inline-math content.
    InlineEnclosure,
    /// Blank-line-delimited paragraph.
    Paragraph,
    /// Generic HTML tag and content.
    HtmlElement,
    /// LaTeX-style math block or inline math.
    MathBlock,
    /// Residual text no earlier category claimed.
    Fallback,
}

/// A contiguous, document-ordered text region produced by the segmenter.
///
/// `start` and `end` are byte offsets into the source text and always fall on
/// UTF-8 boundaries; `length` counts Unicode scalar values because the grammar
/// caps are character caps. After merging, `content` may be a concatenation of
/// several original regions and is no longer guaranteed to equal the source
/// slice `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// The span text, trimmed of surrounding whitespace.
    pub content: String,
    /// Byte offset of the first content byte in the source text.
    pub start: usize,
    /// Byte offset one past the last content byte in the source text.
    pub end: usize,
    /// Content length in chars.
    pub length: usize,
    /// Ordinal position, reassigned sequentially from 0 after merging.
    pub index: usize,
    /// Grammar category that matched this span.
    pub kind: SpanKind,
}

impl Span {
    pub(crate) fn new(content: &str, start: usize, index: usize, kind: SpanKind) -> Self {
        Self {
            length: content.chars().count(),
            content: content.to_string(),
            start,
            end: start + content.len(),
            index,
            kind,
        }
    }
}
