use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line editing shared by the key field and the draft.
/// Returns `false` for keys it does not handle.
fn edit_line(text: &mut String, cursor: &mut usize, key: KeyEvent) -> bool {
    let char_count = text.chars().count();
    *cursor = (*cursor).min(char_count);

    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(char_count),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = char_count,
        _ => return false,
    }
    true
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }
    if key.code == KeyCode::Esc {
        app.should_quit = true;
        return;
    }

    match app.screen {
        Screen::Credential => handle_credential(app, key),
        Screen::Chat => handle_chat(app, key),
    }
}

fn handle_credential(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Enter {
        app.confirm_credential();
        return;
    }

    if let Some(gate) = app.gate.as_mut() {
        edit_line(&mut gate.input, &mut gate.cursor, key);
    }
}

fn handle_chat(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.send_turn(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(app.page_height()),
        KeyCode::PageDown => app.scroll_down(app.page_height()),
        _ => {
            edit_line(app.conversation.draft_mut(), &mut app.draft_cursor, key);
        }
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen != Screen::Chat {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(3),
        MouseEventKind::ScrollDown => app.scroll_down(3),
        _ => {}
    }
}
