//! UI-agnostic styled text.
//!
//! The markdown renderer and transcript builder produce these; `render`
//! converts them to ratatui types at draw time.

/// A styled span of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: Style,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// A line of styled spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    /// Creates an empty line.
    pub fn empty() -> Self {
        StyledLine { spans: vec![] }
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Semantic style identifiers, translated to terminal styles by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// No styling.
    Plain,
    /// Role label above a user message.
    UserLabel,
    /// User message content.
    User,
    /// Role label above a model message.
    ModelLabel,
    /// Model message content.
    Assistant,
    /// Role label above an error notice.
    ErrorLabel,
    /// Error notice content.
    Error,
    /// Trailing "..." on an in-flight reply.
    Pending,

    // Markdown styles
    /// Inline code (`code`).
    CodeInline,
    /// Fenced code block content.
    CodeBlock,
    /// Code fence markers.
    CodeFence,
    /// Emphasized text (*italic*).
    Emphasis,
    /// Strong text (**bold**).
    Strong,
    /// Struck-through text (~~gone~~).
    Strikethrough,
    /// Heading level 1.
    H1,
    /// Heading level 2.
    H2,
    /// Heading level 3+.
    H3,
    /// Link text.
    Link,
    /// Blockquote content.
    BlockQuote,
    /// List bullet marker.
    ListBullet,
    /// List number marker.
    ListNumber,
    /// Table borders and cells.
    Table,
}
