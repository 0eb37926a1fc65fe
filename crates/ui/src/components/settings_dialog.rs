use crate::{
    layout::EditorLayout,
    state::{SettingsDialogState, SettingsField},
    theme::Theme,
};

use peditor_core::settings::{find_model, format_temperature};
use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

const LABEL_WIDTH: usize = 14;

/// Modal settings dialog drawn over the editor
pub struct SettingsDialog<'a> {
    dialog: &'a SettingsDialogState,
}

impl<'a> SettingsDialog<'a> {
    pub fn new(dialog: &'a SettingsDialogState) -> Self {
        Self { dialog }
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let area = EditorLayout::dialog(area);
        frame.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border(true))
            .title(Span::styled(" Settings ", Theme::primary().add_modifier(Modifier::BOLD)))
            .style(Theme::panel());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        frame.render_widget(Paragraph::new(self.lines()).style(Theme::panel()), inner);

        if self.dialog.field == SettingsField::ApiKey && inner.height > 1 {
            let (_, col) = self.dialog.key.cursor_position();
            let shown = if self.dialog.reveal_key { col } else { self.dialog.key_display().width().min(col) };
            let x = inner.x + (2 + LABEL_WIDTH + shown) as u16;
            if x < inner.x + inner.width {
                frame.set_cursor_position(Position::new(x, inner.y + 1));
            }
        }
    }

    fn value(&self, field: SettingsField) -> String {
        match field {
            SettingsField::ApiKey => {
                if self.dialog.key.is_empty() {
                    String::new()
                } else {
                    self.dialog.key_display()
                }
            }
            SettingsField::Model => {
                let label = find_model(&self.dialog.model).map(|m| m.label).unwrap_or(&self.dialog.model);
                format!("◂ {label} ▸")
            }
            SettingsField::Temperature => format!("◂ {} ▸", format_temperature(self.dialog.temperature)),
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![Line::default()];

        for field in SettingsField::VALUES {
            let selected = *field == self.dialog.field;
            let marker = if selected { "▸ " } else { "  " };
            let label_style = if selected {
                Style::default().fg(Theme::BLUE).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Theme::MUTED)
            };
            let value_style = if selected { Style::default().fg(Theme::FG) } else { Style::default().fg(Theme::CYAN) };

            lines.push(Line::from(vec![
                Span::styled(marker, label_style),
                Span::styled(format!("{:<width$}", field.label(), width = LABEL_WIDTH), label_style),
                Span::styled(self.value(*field), value_style),
            ]));
        }

        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled("  Enter", Theme::key_hint()),
            Span::styled(" save  ", Style::default().fg(Theme::MUTED)),
            Span::styled("Esc", Theme::key_hint()),
            Span::styled(" cancel  ", Style::default().fg(Theme::MUTED)),
            Span::styled("Ctrl+V", Theme::key_hint()),
            Span::styled(if self.dialog.reveal_key { " hide key" } else { " show key" }, Style::default().fg(Theme::MUTED)),
        ]));
        lines
    }
}
