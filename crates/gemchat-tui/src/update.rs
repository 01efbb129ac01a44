//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;

const MOUSE_SCROLL_LINES: usize = 3;

pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            if app.session.is_busy() {
                app.spinner_frame = app.spinner_frame.wrapping_add(1);
            }
            vec![]
        }
        UiEvent::Frame { height, .. } => {
            app.viewport_height = height;
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::Ingest(ingest_event) => {
            app.session.apply(ingest_event);
            sync_scroll(app);
            vec![]
        }
    }
}

/// Reacts to a conversation change: a view that follows the bottom stays there.
fn sync_scroll(app: &mut AppState) {
    let revision = app.session.conversation().revision();
    if revision != app.seen_revision {
        app.seen_revision = revision;
        if app.scroll.is_following() {
            app.scroll.scroll_to_bottom();
        }
    }
}

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Paste(text) => {
            app.input.insert_str(&text);
            vec![]
        }
        Event::Mouse(mouse) => {
            handle_mouse(app, mouse);
            vec![]
        }
        _ => vec![],
    }
}

fn handle_mouse(app: &mut AppState, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll.scroll_up(MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollDown => app.scroll.scroll_down(MOUSE_SCROLL_LINES),
        _ => {}
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let page = usize::from(app.viewport_height / 2).max(1);

    match key.code {
        KeyCode::Char('c') if ctrl => return vec![UiEffect::Quit],
        KeyCode::Char('d') if ctrl && app.input.is_empty() => return vec![UiEffect::Quit],
        KeyCode::Enter
            if key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            app.input.insert_char('\n');
        }
        KeyCode::Char('j') if ctrl => app.input.insert_char('\n'),
        KeyCode::Enter => return submit(app),
        KeyCode::Char(ch) if !ctrl => app.input.insert_char(ch),
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Left => app.input.move_left(),
        KeyCode::Right => app.input.move_right(),
        KeyCode::Home if ctrl => app.scroll.scroll_to_top(),
        KeyCode::End if ctrl => app.scroll.scroll_to_bottom(),
        KeyCode::Home => app.input.move_home(),
        KeyCode::End => app.input.move_end(),
        KeyCode::Up => app.scroll.scroll_up(1),
        KeyCode::Down => app.scroll.scroll_down(1),
        KeyCode::PageUp => app.scroll.scroll_up(page),
        KeyCode::PageDown => app.scroll.scroll_down(page),
        _ => {}
    }
    vec![]
}

/// Opens a submission for the current input.
///
/// The input is kept when the submission is refused (blank text, a reply
/// still streaming, or no model available).
fn submit(app: &mut AppState) -> Vec<UiEffect> {
    if app.model.is_none() {
        return vec![];
    }
    let Some(request) = app.session.begin_submission(app.input.text()) else {
        return vec![];
    };

    app.input.clear();
    app.spinner_frame = 0;
    app.scroll.scroll_to_bottom();
    sync_scroll(app);
    vec![UiEffect::StartReply { request }]
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyEvent, KeyEventState};
    use gemchat_core::conversation::Role;
    use gemchat_core::ingest::IngestEvent;
    use gemchat_core::providers::gemini::{GeminiClient, GeminiConfig};
    use gemchat_core::providers::{ProviderError, ProviderErrorKind};
    use gemchat_core::session::{ChatSession, INIT_FAILURE_NOTICE, STREAM_FAILURE_NOTICE};

    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: "test".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "gemini-2.5-flash".to_string(),
            max_output_tokens: None,
        })
    }

    fn app() -> AppState {
        AppState::new(
            ChatSession::new(None),
            Some(client()),
            "gemini-2.5-flash".to_string(),
        )
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }))
    }

    fn type_text(app: &mut AppState, text: &str) {
        for ch in text.chars() {
            update(app, key(KeyCode::Char(ch), KeyModifiers::NONE));
        }
    }

    fn enter(app: &mut AppState) -> Vec<UiEffect> {
        update(app, key(KeyCode::Enter, KeyModifiers::NONE))
    }

    #[test]
    fn test_enter_submits_and_clears_input() {
        let mut app = app();
        type_text(&mut app, "hello");

        let effects = enter(&mut app);

        assert!(matches!(
            effects.as_slice(),
            [UiEffect::StartReply { request }] if request.message == "hello"
        ));
        assert!(app.input.is_empty());
        assert!(app.session.is_busy());
        assert_eq!(app.session.conversation().len(), 2);
    }

    #[test]
    fn test_enter_while_busy_keeps_input() {
        let mut app = app();
        type_text(&mut app, "first");
        enter(&mut app);
        type_text(&mut app, "second");

        let effects = enter(&mut app);

        assert!(effects.is_empty());
        assert_eq!(app.input.text(), "second");
        assert_eq!(app.session.conversation().len(), 2);
    }

    #[test]
    fn test_blank_enter_is_ignored() {
        let mut app = app();
        type_text(&mut app, "   ");

        assert!(enter(&mut app).is_empty());
        assert!(app.session.conversation().is_empty());
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let mut app = app();
        type_text(&mut app, "a");
        update(&mut app, key(KeyCode::Enter, KeyModifiers::SHIFT));
        type_text(&mut app, "b");

        assert_eq!(app.input.text(), "a\nb");
        assert!(!app.session.is_busy());
    }

    #[test]
    fn test_ingest_events_flow_into_session() {
        let mut app = app();
        type_text(&mut app, "hi");
        enter(&mut app);

        update(&mut app, UiEvent::Ingest(IngestEvent::Fragment("Hey".into())));
        assert_eq!(
            app.session.conversation().last().unwrap().content,
            "Hey..."
        );

        update(&mut app, UiEvent::Ingest(IngestEvent::Completed));
        assert_eq!(app.session.conversation().last().unwrap().content, "Hey");
        assert!(!app.session.is_busy());
    }

    #[test]
    fn test_failed_stream_shows_notice_and_allows_retry() {
        let mut app = app();
        type_text(&mut app, "hi");
        enter(&mut app);
        update(
            &mut app,
            UiEvent::Ingest(IngestEvent::Failed(ProviderError::new(
                ProviderErrorKind::Timeout,
                "slow",
            ))),
        );

        let last = app.session.conversation().last().unwrap();
        assert_eq!(last.role, Role::Error);
        assert_eq!(last.content, STREAM_FAILURE_NOTICE);

        type_text(&mut app, "again");
        assert_eq!(enter(&mut app).len(), 1);
    }

    #[test]
    fn test_missing_model_shows_init_error_and_refuses_input() {
        let mut app = AppState::new(ChatSession::new(None), None, "gemini-2.5-flash".into());
        assert_eq!(
            app.session.conversation().last().unwrap().content,
            INIT_FAILURE_NOTICE
        );

        type_text(&mut app, "hello");
        assert!(enter(&mut app).is_empty());
        assert_eq!(app.session.conversation().len(), 1);
    }

    #[test]
    fn test_scrolled_view_is_not_yanked_to_bottom() {
        let mut app = app();
        app.scroll.max_offset = 50;
        type_text(&mut app, "hi");
        enter(&mut app);

        update(&mut app, key(KeyCode::PageUp, KeyModifiers::NONE));
        let offset = app.scroll.offset_from_bottom;
        assert!(offset > 0);

        update(&mut app, UiEvent::Ingest(IngestEvent::Fragment("x".into())));
        assert_eq!(app.scroll.offset_from_bottom, offset);

        update(&mut app, key(KeyCode::End, KeyModifiers::CONTROL));
        assert!(app.scroll.is_following());
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = app();
        let effects = update(&mut app, key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(matches!(effects.as_slice(), [UiEffect::Quit]));
    }

    #[test]
    fn test_paste_inserts_text() {
        let mut app = app();
        update(
            &mut app,
            UiEvent::Terminal(Event::Paste("line one\r\nline two".into())),
        );
        assert_eq!(app.input.text(), "line one\nline two");
    }
}
