use crate::state::{AppState, SettingsField};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::KeyAction;

/// Handle keys while the settings dialog is open
pub fn handle_settings_key(event: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    let Some(dialog) = state.dialog.as_mut() else {
        return None;
    };

    if ctrl {
        return match event.code {
            KeyCode::Char('q') | KeyCode::Char('c') => Some(KeyAction::Exit),
            KeyCode::Char('v') => {
                dialog.toggle_reveal();
                Some(KeyAction::SettingsEdited)
            }
            _ => None,
        };
    }

    match event.code {
        KeyCode::Esc => {
            state.close_settings();
            return Some(KeyAction::CloseSettings);
        }
        KeyCode::Enter => {
            let action = KeyAction::SaveSettings {
                credential: dialog.credential().to_string(),
                model: dialog.model.clone(),
                temperature: dialog.temperature,
            };
            state.close_settings();
            return Some(action);
        }
        KeyCode::Tab | KeyCode::Down => {
            dialog.next_field();
            return Some(KeyAction::SettingsEdited);
        }
        KeyCode::BackTab | KeyCode::Up => {
            dialog.prev_field();
            return Some(KeyAction::SettingsEdited);
        }
        _ => {}
    }

    match dialog.field {
        SettingsField::ApiKey => match event.code {
            KeyCode::Char(c) => dialog.key.insert_char(c),
            KeyCode::Backspace => {
                dialog.key.backspace();
            }
            KeyCode::Delete => {
                dialog.key.delete();
            }
            KeyCode::Left => dialog.key.move_left(),
            KeyCode::Right => dialog.key.move_right(),
            KeyCode::Home => dialog.key.move_home(),
            KeyCode::End => dialog.key.move_end(),
            _ => return None,
        },
        SettingsField::Model => match event.code {
            KeyCode::Left => dialog.cycle_model(false),
            KeyCode::Right | KeyCode::Char(' ') => dialog.cycle_model(true),
            _ => return None,
        },
        SettingsField::Temperature => match event.code {
            KeyCode::Left | KeyCode::Char('-') => dialog.adjust_temperature(-0.1),
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => dialog.adjust_temperature(0.1),
            _ => return None,
        },
    }

    Some(KeyAction::SettingsEdited)
}
