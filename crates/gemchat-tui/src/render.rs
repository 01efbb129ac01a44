//! View: a pure function of `AppState`.

use gemchat_core::conversation::{Message, MessageId, Role};
use gemchat_core::session::{PENDING_MARKER, SubmissionState};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::input::{PLACEHOLDER, WrappedInput};
use crate::markdown::{WrapOptions, render_markdown, wrap_plain};
use crate::state::AppState;
use crate::style::{Style as TextStyle, StyledLine, StyledSpan};

pub const TITLE: &str = "Gemini Clone";
pub const WELCOME: &str = "How can I help you today?";

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const MAX_INPUT_ROWS: usize = 6;
/// Left margin for message bodies under their role label.
const BODY_INDENT: &str = "  ";

/// Draws the whole screen and returns the largest useful scroll offset.
pub fn render(app: &AppState, frame: &mut Frame) -> usize {
    let inner_width = usize::from(frame.area().width.saturating_sub(2));
    let wrapped = app.input.wrap(inner_width);
    let input_rows = wrapped.lines.len().clamp(1, MAX_INPUT_ROWS) as u16;
    let [header, body, input] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(input_rows + 2),
    ])
    .areas(frame.area());

    render_header(app, frame, header);
    let max_offset = render_transcript(app, frame, body);
    render_input(app, &wrapped, frame, input);
    max_offset
}

fn render_header(app: &AppState, frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {TITLE} "),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("· {}", app.model_name),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_transcript(app: &AppState, frame: &mut Frame, area: Rect) -> usize {
    let conversation = app.session.conversation();
    if conversation.is_empty() {
        let top = area.height / 2;
        let welcome = Rect {
            y: area.y + top.saturating_sub(1),
            height: 1.min(area.height),
            ..area
        };
        frame.render_widget(
            Paragraph::new(WELCOME)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray)),
            welcome,
        );
        return 0;
    }

    let width = usize::from(area.width).saturating_sub(1);
    let pending = match app.session.state() {
        SubmissionState::Streaming { placeholder, .. } => Some(*placeholder),
        SubmissionState::Idle => None,
    };
    let lines = transcript_lines(conversation.messages(), pending, width);

    let height = usize::from(area.height);
    let max_offset = lines.len().saturating_sub(height);
    let offset = app.scroll.offset_from_bottom.min(max_offset);
    let end = lines.len() - offset;
    let start = end.saturating_sub(height);

    let visible: Vec<Line> = lines[start..end].iter().map(to_line).collect();
    frame.render_widget(Paragraph::new(visible), area);
    max_offset
}

/// Builds every transcript line for `messages` at the given width.
///
/// `pending` is the reply still streaming, whose trailing marker is drawn
/// in its own style.
pub fn transcript_lines(
    messages: &[Message],
    pending: Option<MessageId>,
    width: usize,
) -> Vec<StyledLine> {
    let body_width = width.saturating_sub(BODY_INDENT.len()).max(1);
    let indent = vec![StyledSpan::new(BODY_INDENT, TextStyle::Plain)];
    let mut lines = Vec::new();

    for message in messages {
        let label_style = match message.role {
            Role::User => TextStyle::UserLabel,
            Role::Model => TextStyle::ModelLabel,
            Role::Error => TextStyle::ErrorLabel,
        };
        lines.push(StyledLine {
            spans: vec![StyledSpan::new(message.role.label(), label_style)],
        });

        let body = match message.role {
            Role::Model if pending == Some(message.id) => {
                pending_body(&message.content, body_width)
            }
            Role::Model => render_markdown(&message.content, body_width),
            Role::User => wrap_plain(
                &message.content,
                TextStyle::User,
                &WrapOptions::new(body_width),
            ),
            Role::Error => wrap_plain(
                &message.content,
                TextStyle::Error,
                &WrapOptions::new(body_width),
            ),
        };
        lines.extend(body.into_iter().map(|mut line| {
            line.spans.splice(0..0, indent.iter().cloned());
            line
        }));
        lines.push(StyledLine::empty());
    }

    lines.pop();
    lines
}

fn pending_body(content: &str, width: usize) -> Vec<StyledLine> {
    let Some(text) = content.strip_suffix(PENDING_MARKER) else {
        return render_markdown(content, width);
    };
    let mut lines = if text.is_empty() {
        Vec::new()
    } else {
        render_markdown(text, width)
    };
    match lines.last_mut() {
        Some(last) if !last.spans.is_empty() => {
            last.spans
                .push(StyledSpan::new(PENDING_MARKER, TextStyle::Pending));
        }
        _ => lines.push(StyledLine {
            spans: vec![StyledSpan::new(PENDING_MARKER, TextStyle::Pending)],
        }),
    }
    lines
}

fn render_input(app: &AppState, wrapped: &WrappedInput, frame: &mut Frame, area: Rect) {
    let busy = app.session.is_busy();
    let title = if busy {
        let spinner = SPINNER[app.spinner_frame % SPINNER.len()];
        format!(" {spinner} Gemini is typing ")
    } else {
        String::new()
    };
    let border = if app.can_submit() {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title);
    let inner = block.inner(area);

    let (row, col) = wrapped.cursor;
    let visible_rows = usize::from(inner.height).max(1);
    let scroll_rows = row.saturating_sub(visible_rows - 1);

    let paragraph = if app.input.is_empty() {
        Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        let lines: Vec<Line> = wrapped
            .lines
            .iter()
            .skip(scroll_rows)
            .map(|l| Line::raw(l.as_str()))
            .collect();
        Paragraph::new(lines)
    };
    frame.render_widget(paragraph.block(block), area);

    if !busy {
        let x = inner.x + (col as u16).min(inner.width.saturating_sub(1));
        let y = inner.y + (row - scroll_rows) as u16;
        frame.set_cursor_position(Position::new(x, y));
    }
}

fn to_line(line: &StyledLine) -> Line<'static> {
    Line::from(
        line.spans
            .iter()
            .map(|s| Span::styled(s.text.clone(), style_for(s.style)))
            .collect::<Vec<_>>(),
    )
}

fn style_for(style: TextStyle) -> Style {
    match style {
        TextStyle::Plain | TextStyle::Assistant => Style::default(),
        TextStyle::UserLabel => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        TextStyle::User => Style::default().fg(Color::Green),
        TextStyle::ModelLabel => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        TextStyle::ErrorLabel => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),
        TextStyle::Error => Style::default().fg(Color::Red),
        TextStyle::Pending => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::SLOW_BLINK),
        TextStyle::CodeInline | TextStyle::CodeBlock => Style::default().fg(Color::Cyan),
        TextStyle::CodeFence | TextStyle::Table => Style::default().fg(Color::DarkGray),
        TextStyle::Emphasis => Style::default().add_modifier(Modifier::ITALIC),
        TextStyle::Strong => Style::default().add_modifier(Modifier::BOLD),
        TextStyle::Strikethrough => Style::default().add_modifier(Modifier::CROSSED_OUT),
        TextStyle::H1 => Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        TextStyle::H2 => Style::default().add_modifier(Modifier::BOLD),
        TextStyle::H3 => Style::default().add_modifier(Modifier::ITALIC),
        TextStyle::Link => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::UNDERLINED),
        TextStyle::BlockQuote => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::ITALIC),
        TextStyle::ListBullet | TextStyle::ListNumber => Style::default().fg(Color::Yellow),
    }
}
