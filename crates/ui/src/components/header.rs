use crate::{state::AppState, theme::Theme};
use peditor_core::format_temperature;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Header component: title, provider/model, temperature and the generation indicator
pub struct Header<'a> {
    state: &'a AppState,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        frame.render_widget(Paragraph::new(self.line()).style(Theme::base()), area);
    }

    fn line(&self) -> Line<'static> {
        let settings = &self.state.settings;
        let separator = || Span::styled(" │ ", Style::default().fg(Theme::BORDER));

        let model = if self.state.provider.is_empty() {
            settings.model_label().to_string()
        } else {
            format!("{}/{}", self.state.provider, settings.model_label())
        };

        Line::from(vec![
            Span::styled(" peditor", Style::default().fg(Theme::BLUE).add_modifier(Modifier::BOLD)),
            separator(),
            Span::styled(model, Style::default().fg(Theme::PURPLE)),
            separator(),
            Span::styled(
                format!("temp {}", format_temperature(settings.temperature)),
                Style::default().fg(Theme::CYAN),
            ),
            separator(),
            Theme::processing_span(self.state.is_processing()),
        ])
    }
}
