//! Multi-line input buffer with a grapheme-aware cursor.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

pub const PLACEHOLDER: &str = "Message Gemini...";

/// Input text laid out for a box of fixed width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedInput {
    pub lines: Vec<String>,
    /// Visual (row, column) of the cursor.
    pub cursor: (usize, usize),
}

#[derive(Debug, Default, Clone)]
pub struct InputState {
    text: String,
    /// Byte offset into `text`, always on a grapheme boundary.
    cursor: usize,
}

impl InputState {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn insert_char(&mut self, ch: char) {
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    /// Inserts pasted text, normalizing CRLF and lone CR to LF.
    pub fn insert_str(&mut self, s: &str) {
        let normalized = s.replace("\r\n", "\n").replace('\r', "\n");
        self.text.insert_str(self.cursor, &normalized);
        self.cursor += normalized.len();
    }

    pub fn backspace(&mut self) {
        if let Some(start) = self.prev_boundary() {
            self.text.replace_range(start..self.cursor, "");
            self.cursor = start;
        }
    }

    pub fn delete(&mut self) {
        if let Some(end) = self.next_boundary() {
            self.text.replace_range(self.cursor..end, "");
        }
    }

    pub fn move_left(&mut self) {
        if let Some(pos) = self.prev_boundary() {
            self.cursor = pos;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(pos) = self.next_boundary() {
            self.cursor = pos;
        }
    }

    /// Moves to the start of the current line.
    pub fn move_home(&mut self) {
        self.cursor = self.text[..self.cursor].rfind('\n').map_or(0, |i| i + 1);
    }

    /// Moves to the end of the current line.
    pub fn move_end(&mut self) {
        self.cursor = self.text[self.cursor..]
            .find('\n')
            .map_or(self.text.len(), |i| self.cursor + i);
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Soft-wraps the text at `width` display columns, tracking where the
    /// cursor lands. Graphemes are never split.
    pub fn wrap(&self, width: usize) -> WrappedInput {
        let width = width.max(1);
        let mut lines = Vec::new();
        let mut cursor = (0, 0);
        let mut line_start = 0;

        for logical in self.text.split('\n') {
            let mut current = String::new();
            let mut col = 0;
            for (offset, grapheme) in logical.grapheme_indices(true) {
                let w = grapheme.width();
                if col + w > width && !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    col = 0;
                }
                if line_start + offset == self.cursor {
                    cursor = (lines.len(), col);
                }
                current.push_str(grapheme);
                col += w;
            }
            if line_start + logical.len() == self.cursor {
                cursor = if col >= width {
                    (lines.len() + 1, 0)
                } else {
                    (lines.len(), col)
                };
            }
            lines.push(current);
            line_start += logical.len() + 1;
        }

        if cursor.0 >= lines.len() {
            lines.push(String::new());
        }
        WrappedInput { lines, cursor }
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .graphemes(true)
            .next()
            .map(|g| self.cursor + g.len())
    }
}
