use crate::state::{AppState, Focus};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use peditor_core::Direction;

use super::KeyAction;

/// Handle keys when no dialog is open
pub fn handle_normal_key(event: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    let alt = event.modifiers.contains(KeyModifiers::ALT);

    if ctrl {
        return match event.code {
            KeyCode::Char('q') | KeyCode::Char('c') => Some(KeyAction::Exit),
            KeyCode::Char('r') => {
                let template = state.selected_template();
                Some(KeyAction::RunTemplate { title: template.title(), option: state.selected_option() })
            }
            KeyCode::Char('o') => Some(KeyAction::MoveOutputToInput),
            KeyCode::Char('y') => Some(KeyAction::Copy { kind: state.focus.kind() }),
            KeyCode::Char('l') => Some(KeyAction::Clear { kind: state.focus.kind() }),
            KeyCode::Char('s') => {
                state.open_settings();
                Some(KeyAction::OpenSettings)
            }
            _ => None,
        };
    }

    if alt {
        return match event.code {
            KeyCode::Left => Some(KeyAction::Navigate { kind: state.focus.kind(), direction: Direction::Prev }),
            KeyCode::Right => Some(KeyAction::Navigate { kind: state.focus.kind(), direction: Direction::Next }),
            _ => None,
        };
    }

    match event.code {
        KeyCode::Tab => {
            state.toggle_focus();
            return Some(KeyAction::ToggleFocus);
        }
        KeyCode::Esc => return state.is_processing().then_some(KeyAction::CancelGeneration),
        KeyCode::F(2) => {
            state.next_template();
            return Some(KeyAction::SelectTemplate { title: state.selected_template().title() });
        }
        KeyCode::F(3) => {
            let title = state.selected_template().title();
            return state.next_option().map(|value| KeyAction::SelectOption { title, value });
        }
        _ => {}
    }

    match state.focus {
        Focus::Input => handle_edit_key(event, state),
        Focus::Output => handle_output_key(event, state),
    }
}

fn handle_edit_key(event: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let editor = &mut state.editor;
    let changed = match event.code {
        KeyCode::Char(c) => {
            editor.insert_char(c);
            true
        }
        KeyCode::Enter => {
            editor.insert_newline();
            true
        }
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Delete => editor.delete(),
        KeyCode::Left => {
            editor.move_left();
            false
        }
        KeyCode::Right => {
            editor.move_right();
            false
        }
        KeyCode::Home => {
            editor.move_home();
            false
        }
        KeyCode::End => {
            editor.move_end();
            false
        }
        _ => false,
    };

    changed.then(|| KeyAction::InputChanged { text: editor.text().to_string() })
}

fn handle_output_key(event: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let delta = match event.code {
        KeyCode::Up => -1,
        KeyCode::Down => 1,
        KeyCode::PageUp => -10,
        KeyCode::PageDown => 10,
        KeyCode::Home => {
            state.output_scroll = 0;
            return Some(KeyAction::ScrollOutput);
        }
        _ => return None,
    };
    state.scroll_output(delta);
    Some(KeyAction::ScrollOutput)
}
