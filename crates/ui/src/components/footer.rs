use crate::{
    state::{AppState, Focus},
    theme::Theme,
};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

/// Footer: the active notice on the left, key hints on the right
pub struct Footer<'a> {
    state: &'a AppState,
}

impl<'a> Footer<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(self.hints_width())])
            .split(area);

        if let Some(active) = &self.state.notice {
            let notice = &active.notice;
            let line = Line::from(vec![Span::raw(" "), Theme::notice_span(notice.level, &notice.message)]);
            frame.render_widget(Paragraph::new(line).style(Theme::base()), chunks[0]);
        } else {
            frame.render_widget(Paragraph::new("").style(Theme::base()), chunks[0]);
        }

        frame.render_widget(
            Paragraph::new(Line::from(self.hints())).alignment(Alignment::Right).style(Theme::base()),
            chunks[1],
        );
    }

    fn hint_pairs(&self) -> Vec<(&'static str, &'static str)> {
        if self.state.dialog.is_some() {
            return vec![("Enter", "save"), ("Esc", "cancel"), ("Ctrl+V", "reveal")];
        }

        let mut pairs = Vec::new();
        if self.state.is_processing() {
            pairs.push(("Esc", "stop"));
        } else {
            pairs.push(("^R", "run"));
        }
        pairs.push(("Tab", "focus"));
        pairs.push(("Alt+←→", "history"));
        if self.state.focus == Focus::Output {
            pairs.push(("^O", "to input"));
        }
        pairs.extend([("^Y", "copy"), ("^L", "clear"), ("^S", "settings"), ("^Q", "quit")]);
        pairs
    }

    fn hints(&self) -> Vec<Span<'static>> {
        self.hint_pairs()
            .into_iter()
            .flat_map(|(key, label)| {
                [Span::styled(key, Theme::key_hint()), Span::styled(format!(" {label}  "), Style::default().fg(Theme::MUTED))]
            })
            .collect()
    }

    fn hints_width(&self) -> u16 {
        self.hints().iter().map(|s| s.width() as u16).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peditor_agent::{GenerationId, GenerationStatus};

    fn keys(footer: &Footer<'_>) -> Vec<&'static str> {
        footer.hint_pairs().into_iter().map(|(key, _)| key).collect()
    }

    #[test]
    fn test_hints_follow_mode() {
        let mut state = AppState::default();
        assert!(keys(&Footer::new(&state)).contains(&"^R"));
        assert!(!keys(&Footer::new(&state)).contains(&"^O"));

        state.toggle_focus();
        assert!(keys(&Footer::new(&state)).contains(&"^O"));

        state.status = GenerationStatus::Streaming { id: GenerationId::new(1), slot: 0 };
        assert!(keys(&Footer::new(&state)).contains(&"Esc"));
        assert!(!keys(&Footer::new(&state)).contains(&"^R"));
    }

    #[test]
    fn test_dialog_hints() {
        let mut state = AppState::default();
        state.open_settings();
        assert_eq!(keys(&Footer::new(&state)), vec!["Enter", "Esc", "Ctrl+V"]);
    }
}
