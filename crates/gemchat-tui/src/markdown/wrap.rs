//! Width-aware wrapping of styled spans.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::style::{Style, StyledLine, StyledSpan};

/// Wrap settings with optional hanging prefixes.
#[derive(Debug, Clone, Default)]
pub struct WrapOptions {
    /// Maximum display width of an output line, prefix included.
    pub width: usize,
    /// Prefix for the first output line (e.g. a list bullet).
    pub first_prefix: Vec<StyledSpan>,
    /// Prefix for every following line.
    pub rest_prefix: Vec<StyledSpan>,
}

impl WrapOptions {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Same prefix on every line.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Vec<StyledSpan>) -> Self {
        self.first_prefix.clone_from(&prefix);
        self.rest_prefix = prefix;
        self
    }
}

fn prefix_width(spans: &[StyledSpan]) -> usize {
    spans.iter().map(|s| s.text.width()).sum()
}

/// Accumulates output lines.
struct LineBuilder<'a> {
    opts: &'a WrapOptions,
    lines: Vec<StyledLine>,
    current: Vec<StyledSpan>,
    used: usize,
}

impl<'a> LineBuilder<'a> {
    fn new(opts: &'a WrapOptions) -> Self {
        Self {
            opts,
            lines: Vec::new(),
            current: Vec::new(),
            used: 0,
        }
    }

    fn on_first_line(&self) -> bool {
        self.lines.is_empty()
    }

    /// Content width available on the line being built.
    fn capacity(&self) -> usize {
        let prefix = if self.on_first_line() {
            &self.opts.first_prefix
        } else {
            &self.opts.rest_prefix
        };
        self.opts.width.saturating_sub(prefix_width(prefix)).max(1)
    }

    fn remaining(&self) -> usize {
        self.capacity().saturating_sub(self.used)
    }

    fn break_line(&mut self) {
        let mut spans = if self.on_first_line() {
            self.opts.first_prefix.clone()
        } else {
            self.opts.rest_prefix.clone()
        };
        spans.append(&mut self.current);
        self.lines.push(StyledLine { spans });
        self.used = 0;
    }

    fn push(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        self.used += text.width();
        match self.current.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.current.push(StyledSpan::new(text, style)),
        }
    }

    /// Pushes text that must not be split on whitespace, breaking by
    /// character when it is wider than a whole line.
    fn push_unbreakable(&mut self, text: &str, style: Style) {
        let width = text.width();
        if width <= self.remaining() {
            self.push(text, style);
            return;
        }
        if self.used > 0 && width <= self.capacity() {
            self.break_line();
            self.push(text, style);
            return;
        }

        let mut chunk = String::new();
        for ch in text.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if ch_width > 0 && chunk.width() + ch_width > self.remaining() {
                if chunk.is_empty() && self.used > 0 {
                    self.break_line();
                } else if !chunk.is_empty() {
                    self.push(&std::mem::take(&mut chunk), style);
                    self.break_line();
                }
            }
            chunk.push(ch);
        }
        self.push(&chunk, style);
    }

    /// Pushes prose: words are kept whole and runs of whitespace collapse to one space.
    fn push_words(&mut self, text: &str, style: Style) {
        let leading_space = text.starts_with(char::is_whitespace);
        let trailing_space = text.ends_with(char::is_whitespace);
        let mut words = text.split_whitespace().peekable();

        if words.peek().is_none() {
            if self.used > 0 && self.remaining() > 0 {
                self.push(" ", style);
            }
            return;
        }

        let mut first = true;
        while let Some(word) = words.next() {
            let needs_space = (!first || leading_space) && self.used > 0;
            if needs_space {
                if 1 + word.width() <= self.remaining() {
                    self.push(" ", style);
                } else {
                    self.break_line();
                }
            }
            self.push_unbreakable(word, style);
            first = false;

            if words.peek().is_none() && trailing_space && self.remaining() > 0 {
                self.push(" ", style);
            }
        }
    }

    fn finish(mut self) -> Vec<StyledLine> {
        if !self.current.is_empty() || self.lines.is_empty() {
            self.break_line();
        }
        self.lines
    }
}

/// Wraps styled spans to `opts.width`, keeping each span's style across breaks.
///
/// Newlines inside span text force a break. Code spans keep their inner
/// whitespace and are split by character when too long; other text wraps at
/// word boundaries.
pub fn wrap_styled_spans(spans: &[StyledSpan], opts: &WrapOptions) -> Vec<StyledLine> {
    if opts.width == 0 {
        let mut all = opts.first_prefix.clone();
        all.extend(spans.iter().cloned());
        return vec![StyledLine { spans: all }];
    }

    let mut builder = LineBuilder::new(opts);
    for span in spans {
        for (i, part) in span.text.split('\n').enumerate() {
            if i > 0 {
                builder.break_line();
            }
            if part.is_empty() {
                continue;
            }
            if matches!(span.style, Style::CodeInline | Style::CodeBlock) {
                builder.push_unbreakable(part, span.style);
            } else {
                builder.push_words(part, span.style);
            }
        }
    }
    builder.finish()
}

/// Wraps literal text, preserving blank lines. Used for user and error messages.
pub fn wrap_plain(text: &str, style: Style, opts: &WrapOptions) -> Vec<StyledLine> {
    text.split('\n')
        .flat_map(|line| wrap_styled_spans(&[StyledSpan::new(line, style)], opts))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[StyledLine]) -> Vec<String> {
        lines.iter().map(StyledLine::plain_text).collect()
    }

    #[test]
    fn test_wraps_at_word_boundaries() {
        let spans = [StyledSpan::new("the quick brown fox", Style::Plain)];
        let lines = wrap_styled_spans(&spans, &WrapOptions::new(10));
        assert_eq!(texts(&lines), vec!["the quick", "brown fox"]);
    }

    #[test]
    fn test_long_word_is_broken() {
        let spans = [StyledSpan::new("abcdefghij", Style::Plain)];
        let lines = wrap_styled_spans(&spans, &WrapOptions::new(4));
        assert_eq!(texts(&lines), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_styles_survive_line_breaks() {
        let spans = [
            StyledSpan::new("plain ", Style::Plain),
            StyledSpan::new("bold words here", Style::Strong),
        ];
        let lines = wrap_styled_spans(&spans, &WrapOptions::new(11));
        assert_eq!(texts(&lines), vec!["plain bold", "words here"]);
        assert!(lines[1].spans.iter().all(|s| s.style == Style::Strong));
    }

    #[test]
    fn test_hanging_prefix() {
        let opts = WrapOptions {
            width: 10,
            first_prefix: vec![StyledSpan::new("- ", Style::ListBullet)],
            rest_prefix: vec![StyledSpan::new("  ", Style::Plain)],
        };
        let spans = [StyledSpan::new("one two three", Style::Plain)];
        let lines = wrap_styled_spans(&spans, &opts);
        assert_eq!(texts(&lines), vec!["- one two", "  three"]);
    }

    #[test]
    fn test_wrap_plain_keeps_blank_lines() {
        let lines = wrap_plain("a\n\nb", Style::User, &WrapOptions::new(20));
        assert_eq!(texts(&lines), vec!["a", "", "b"]);
    }

    #[test]
    fn test_wide_chars_count_double() {
        let spans = [StyledSpan::new("日本語テキスト", Style::Plain)];
        let lines = wrap_styled_spans(&spans, &WrapOptions::new(6));
        assert!(lines.iter().all(|l| l.plain_text().width() <= 6));
    }
}
