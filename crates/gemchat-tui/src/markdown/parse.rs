use comfy_table::{ContentArrangement, Table};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use unicode_width::UnicodeWidthStr;

use super::wrap::{WrapOptions, wrap_styled_spans};
use crate::style::{Style, StyledLine, StyledSpan};

/// Renders GitHub-flavored markdown into styled lines wrapped at `width`.
///
/// Raw HTML is dropped rather than echoed to the terminal.
pub fn render_markdown(text: &str, width: usize) -> Vec<StyledLine> {
    if text.is_empty() {
        return vec![StyledLine::empty()];
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = MarkdownRenderer::new(width);
    for event in Parser::new_ext(text, options) {
        renderer.process_event(event);
    }
    renderer.finish()
}

/// Collects table cells until the table ends, then lays them out with comfy-table.
#[derive(Debug, Default)]
struct TableBuffer {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

impl TableBuffer {
    fn finish_cell(&mut self) {
        self.row.push(std::mem::take(&mut self.cell).trim().to_string());
    }

    fn finish_row(&mut self, is_header: bool) {
        let row = std::mem::take(&mut self.row);
        if is_header {
            self.header = row;
        } else {
            self.rows.push(row);
        }
    }

    fn render(&self, max_width: usize) -> Vec<String> {
        let mut table = Table::new();
        table.set_width(u16::try_from(max_width).unwrap_or(u16::MAX));
        table.set_content_arrangement(ContentArrangement::Dynamic);
        if !self.header.is_empty() {
            table.set_header(&self.header);
        }
        for row in &self.rows {
            table.add_row(row);
        }
        table.to_string().lines().map(String::from).collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct ListState {
    /// None for bullets, Some(n) for the next number.
    next_number: Option<u64>,
}

struct MarkdownRenderer {
    width: usize,
    lines: Vec<StyledLine>,
    spans: Vec<StyledSpan>,
    style_stack: Vec<Style>,
    code_block: Option<Option<String>>,
    lists: Vec<ListState>,
    /// Marker for the list item whose first line has not been emitted yet.
    pending_marker: Option<(String, Style)>,
    quote_depth: usize,
    table: Option<TableBuffer>,
    in_table_head: bool,
}

impl MarkdownRenderer {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            spans: Vec::new(),
            style_stack: vec![Style::Assistant],
            code_block: None,
            lists: Vec::new(),
            pending_marker: None,
            quote_depth: 0,
            table: None,
            in_table_head: false,
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or(Style::Assistant)
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|l| !l.spans.is_empty()) {
            self.lines.push(StyledLine::empty());
        }
    }

    fn quote_prefix(&self) -> Vec<StyledSpan> {
        if self.quote_depth == 0 {
            Vec::new()
        } else {
            vec![StyledSpan::new("│ ".repeat(self.quote_depth), Style::BlockQuote)]
        }
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => self.add_inline_code(&code),
            Event::SoftBreak => self.add_text(" "),
            Event::HardBreak => {
                if let Some(table) = &mut self.table {
                    table.cell.push(' ');
                } else {
                    self.spans.push(StyledSpan::new("\n", self.current_style()));
                }
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.spans.push(StyledSpan::new(marker, Style::ListBullet));
            }
            Event::Rule => {
                self.flush_paragraph();
                self.lines.push(StyledLine {
                    spans: vec![StyledSpan::new("─".repeat(self.width.min(40)), Style::Plain)],
                });
                self.lines.push(StyledLine::empty());
            }
            Event::InlineMath(math) | Event::DisplayMath(math) => self.add_text(&math),
            Event::Html(_) | Event::InlineHtml(_) | Event::FootnoteReference(_) => {}
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_paragraph();
                self.style_stack.push(match level {
                    HeadingLevel::H1 => Style::H1,
                    HeadingLevel::H2 => Style::H2,
                    _ => Style::H3,
                });
            }
            Tag::CodeBlock(kind) => {
                self.flush_paragraph();
                self.code_block = Some(match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                });
            }
            Tag::List(start) => {
                self.flush_paragraph();
                self.lists.push(ListState { next_number: start });
            }
            Tag::Item => {
                self.flush_paragraph();
                let marker = match self.lists.last_mut() {
                    Some(ListState {
                        next_number: Some(n),
                    }) => {
                        let marker = (format!("{n}. "), Style::ListNumber);
                        *n += 1;
                        marker
                    }
                    _ => ("• ".to_string(), Style::ListBullet),
                };
                self.pending_marker = Some(marker);
            }
            Tag::BlockQuote(_) => {
                self.flush_paragraph();
                self.quote_depth += 1;
                self.style_stack.push(Style::BlockQuote);
            }
            Tag::Emphasis => self.style_stack.push(Style::Emphasis),
            Tag::Strong => self.style_stack.push(Style::Strong),
            Tag::Strikethrough => self.style_stack.push(Style::Strikethrough),
            Tag::Link { .. } => self.style_stack.push(Style::Link),
            Tag::Table(_) => {
                self.flush_paragraph();
                self.table = Some(TableBuffer::default());
            }
            Tag::TableHead => self.in_table_head = true,
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_paragraph();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Heading(_) => {
                self.flush_paragraph();
                self.pop_style();
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                self.flush_code_block();
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.flush_paragraph();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => self.flush_paragraph(),
            TagEnd::BlockQuote(_) => {
                self.flush_paragraph();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.pop_style();
                self.blank_line();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.pop_style();
            }
            TagEnd::Table => {
                self.flush_table();
                self.blank_line();
            }
            TagEnd::TableHead => {
                if let Some(table) = &mut self.table {
                    table.finish_row(true);
                }
                self.in_table_head = false;
            }
            TagEnd::TableRow => {
                if !self.in_table_head
                    && let Some(table) = &mut self.table
                {
                    table.finish_row(false);
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = &mut self.table {
                    table.finish_cell();
                }
            }
            _ => {}
        }
    }

    fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(table) = &mut self.table {
            table.cell.push_str(&text.replace('\n', " "));
            return;
        }
        let style = if self.code_block.is_some() {
            Style::CodeBlock
        } else {
            self.current_style()
        };
        self.spans.push(StyledSpan::new(text, style));
    }

    fn add_inline_code(&mut self, code: &str) {
        if let Some(table) = &mut self.table {
            table.cell.push_str(&format!("`{}`", code.replace('\n', " ")));
            return;
        }
        self.spans.push(StyledSpan::new(code, Style::CodeInline));
    }

    fn flush_paragraph(&mut self) {
        if self.spans.is_empty() && self.pending_marker.is_none() {
            return;
        }
        if self.spans.is_empty() {
            // Item whose content starts with a nested block: emit the marker alone.
            self.spans.push(StyledSpan::new("", self.current_style()));
        }

        let spans = std::mem::take(&mut self.spans);
        let quote = self.quote_prefix();
        let opts = match self.pending_marker.take() {
            Some((marker, marker_style)) => {
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let mut first = quote.clone();
                first.push(StyledSpan::new(indent.clone(), Style::Plain));
                first.push(StyledSpan::new(marker.clone(), marker_style));
                let mut rest = quote;
                rest.push(StyledSpan::new(
                    format!("{indent}{}", " ".repeat(marker.width())),
                    Style::Plain,
                ));
                WrapOptions {
                    width: self.width,
                    first_prefix: first,
                    rest_prefix: rest,
                }
            }
            None if !self.lists.is_empty() => {
                let indent = "  ".repeat(self.lists.len());
                let mut prefix = quote;
                prefix.push(StyledSpan::new(indent, Style::Plain));
                WrapOptions::new(self.width).with_prefix(prefix)
            }
            None => WrapOptions::new(self.width).with_prefix(quote),
        };
        self.lines.extend(wrap_styled_spans(&spans, &opts));
    }

    fn flush_code_block(&mut self) {
        let Some(lang) = self.code_block.take() else {
            return;
        };
        let body: String = std::mem::take(&mut self.spans)
            .into_iter()
            .map(|s| s.text)
            .collect();

        let fence = match lang {
            Some(lang) => format!("```{lang}"),
            None => "```".to_string(),
        };
        self.lines.push(StyledLine {
            spans: vec![StyledSpan::new(fence, Style::CodeFence)],
        });
        for line in body.trim_end_matches('\n').split('\n') {
            self.lines.push(StyledLine {
                spans: vec![
                    StyledSpan::new("  ", Style::Plain),
                    StyledSpan::new(line, Style::CodeBlock),
                ],
            });
        }
        self.lines.push(StyledLine {
            spans: vec![StyledSpan::new("```", Style::CodeFence)],
        });
    }

    fn flush_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        for line in table.render(self.width) {
            self.lines.push(StyledLine {
                spans: vec![StyledSpan::new(line, Style::Table)],
            });
        }
    }

    fn finish(mut self) -> Vec<StyledLine> {
        if self.code_block.is_some() {
            // Unterminated fence while the reply is still streaming.
            self.flush_code_block();
        } else {
            self.flush_paragraph();
        }
        self.flush_table();

        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        if self.lines.is_empty() {
            self.lines.push(StyledLine::empty());
        }
        self.lines
    }
}
