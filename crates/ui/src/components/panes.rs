use crate::{
    markdown,
    state::{AppState, Focus},
    theme::Theme,
};

use peditor_agent::GenerationStatus;
use peditor_core::{History, notice::messages};
use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

const INPUT_PLACEHOLDER: &str = "Type or paste text here";
const OUTPUT_PLACEHOLDER: &str = "Pick a template with F2 and run it with Ctrl+R";

fn pane_block<'a>(title: &'a str, history: &History, focused: bool) -> Block<'a> {
    let mut title_spans = vec![Span::styled(format!(" {title} "), Theme::border(focused).add_modifier(Modifier::BOLD))];
    if let Some(position) = history.position_label() {
        title_spans.push(Span::styled(format!("{position} "), Style::default().fg(Theme::MUTED)));
    }

    Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border(focused))
        .title(Line::from(title_spans))
        .style(Theme::base())
}

/// Editable input pane showing the selected input entry
pub struct InputPane<'a> {
    state: &'a AppState,
}

impl<'a> InputPane<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let focused = self.state.focus == Focus::Input;
        let block = pane_block("Input", &self.state.histories.input, focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let editor = &self.state.editor;
        if editor.is_empty() {
            let placeholder = Paragraph::new(Span::styled(INPUT_PLACEHOLDER, Style::default().fg(Theme::MUTED)));
            frame.render_widget(placeholder, inner);
        }

        let (line, col) = editor.cursor_position();
        let cursor_x = editor
            .text()
            .split('\n')
            .nth(line)
            .map(|l| l.chars().take(col).collect::<String>().width())
            .unwrap_or(0) as u16;
        let scroll_y = (line as u16).saturating_sub(inner.height - 1);
        let scroll_x = cursor_x.saturating_sub(inner.width - 1);

        if !editor.is_empty() {
            let text = Text::from(editor.text().split('\n').map(|l| Line::from(l.to_string())).collect::<Vec<_>>());
            frame.render_widget(Paragraph::new(text).scroll((scroll_y, scroll_x)), inner);
        }

        if focused && self.state.dialog.is_none() {
            frame.set_cursor_position(Position::new(
                inner.x + cursor_x - scroll_x,
                inner.y + line as u16 - scroll_y,
            ));
        }
    }
}

/// Read-only output pane rendering the selected output entry as markdown
pub struct OutputPane<'a> {
    state: &'a AppState,
}

impl<'a> OutputPane<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let focused = self.state.focus == Focus::Output;
        let block = pane_block("Output", &self.state.histories.output, focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let lines = self.lines(inner.width as usize);
        let max_scroll = lines.len().saturating_sub(1) as u16;
        let scroll = self.state.output_scroll.min(max_scroll);
        frame.render_widget(Paragraph::new(Text::from(lines)).scroll((scroll, 0)), inner);
    }

    /// Whether the selected output entry is the one currently being streamed into
    fn is_streaming_here(&self) -> bool {
        match self.state.status {
            GenerationStatus::Streaming { slot, .. } => self.state.histories.output.cursor() == Some(slot),
            GenerationStatus::Idle => false,
        }
    }

    fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        if !self.state.settings.has_credential() {
            lines.push(Line::from(Span::styled(
                messages::API_KEY_REQUIRED,
                Style::default().fg(Theme::YELLOW).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(vec![
                Span::styled("Press ", Style::default().fg(Theme::MUTED)),
                Span::styled("Ctrl+S", Theme::key_hint()),
                Span::styled(" to open settings.", Style::default().fg(Theme::MUTED)),
            ]));
            lines.push(Line::default());
        }

        let text = self.state.histories.output.current_value();
        if text.is_empty() {
            let placeholder = if self.is_streaming_here() { "…" } else { OUTPUT_PLACEHOLDER };
            lines.push(Line::from(Span::styled(placeholder, Style::default().fg(Theme::MUTED))));
            return lines;
        }

        lines.extend(markdown::render(text, width));
        if self.is_streaming_here()
            && let Some(last) = lines.last_mut()
        {
            last.spans.push(Span::styled("▌", Style::default().fg(Theme::BLUE)));
        }
        lines
    }
}
