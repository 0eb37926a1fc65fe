use crate::{state::AppState, theme::Theme};

use peditor_core::templates;
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

/// Template bar. The selected template is highlighted; everything is dimmed while
/// the run trigger is disabled.
pub struct ActionsBar<'a> {
    state: &'a AppState,
}

impl<'a> ActionsBar<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        frame.render_widget(Paragraph::new(self.line()).style(Theme::panel()), area);
    }

    fn line(&self) -> Line<'static> {
        let enabled = self.state.triggers_enabled();
        let mut spans = vec![Span::styled(" F2 ", Theme::key_hint())];

        for (index, template) in templates().iter().enumerate() {
            let label = match self.state.option_for(index).and_then(|v| template.find_option(v)) {
                Some(option) => format!("{}: {}", template.title(), option.title),
                None => template.title().to_string(),
            };

            let style = if index == self.state.template_index {
                if enabled { Theme::active() } else { Style::default().fg(Theme::MUTED).bg(Theme::ACTIVE) }
            } else if enabled {
                Style::default().fg(Theme::FG)
            } else {
                Style::default().fg(Theme::MUTED)
            };
            spans.push(Span::styled(format!(" {label} "), style));
        }

        if self.state.selected_template().is_group() {
            spans.push(Span::styled("  F3", Theme::key_hint()));
            spans.push(Span::styled(" option", Style::default().fg(Theme::MUTED)));
        }
        Line::from(spans)
    }
}
