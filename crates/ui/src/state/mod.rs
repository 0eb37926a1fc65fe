mod input;
mod notice;
mod settings_dialog;

pub use input::EditorBuffer;
pub use notice::{ActiveNotice, NOTICE_TTL};
pub use settings_dialog::{SettingsDialogState, SettingsField};

use peditor_agent::GenerationStatus;
use peditor_core::{Histories, HistoryKind, Notice, Settings, Template, templates};
use std::time::Instant;

/// Which pane receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Output,
}

impl Focus {
    pub fn kind(&self) -> HistoryKind {
        match self {
            Focus::Input => HistoryKind::Input,
            Focus::Output => HistoryKind::Output,
        }
    }

    pub fn toggle(&self) -> Focus {
        match self {
            Focus::Input => Focus::Output,
            Focus::Output => Focus::Input,
        }
    }
}

/// Everything the view renders.
///
/// Histories, settings and generation status are copies of the shared stores, refreshed by
/// the event loop whenever those change; the rest is local UI state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub focus: Focus,
    pub editor: EditorBuffer,
    pub histories: Histories,
    pub settings: Settings,
    pub status: GenerationStatus,
    /// Index into [`templates()`]
    pub template_index: usize,
    /// Selected option per template, parallel to [`templates()`]
    pub options: Vec<Option<&'static str>>,
    pub dialog: Option<SettingsDialogState>,
    pub notice: Option<ActiveNotice>,
    /// Lines scrolled off the top of the output pane
    pub output_scroll: u16,
    pub provider: String,
    should_exit: bool,
}

impl AppState {
    pub fn new(histories: Histories, settings: Settings, options: Vec<Option<&'static str>>) -> Self {
        let mut editor = EditorBuffer::new();
        editor.set_text(histories.input.current_value());
        let options = if options.len() == templates().len() {
            options
        } else {
            templates().iter().map(|t| t.default_option().map(|o| o.value)).collect()
        };

        Self {
            focus: Focus::Input,
            editor,
            histories,
            settings,
            status: GenerationStatus::Idle,
            template_index: 0,
            options,
            dialog: None,
            notice: None,
            output_scroll: 0,
            provider: String::new(),
            should_exit: false,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn selected_template(&self) -> &'static Template {
        &templates()[self.template_index.min(templates().len() - 1)]
    }

    pub fn selected_option(&self) -> Option<&'static str> {
        self.options.get(self.template_index).copied().flatten()
    }

    pub fn option_for(&self, index: usize) -> Option<&'static str> {
        self.options.get(index).copied().flatten()
    }

    pub fn next_template(&mut self) {
        self.template_index = (self.template_index + 1) % templates().len();
    }

    /// Advance the selected group template to its next option; returns the new value.
    pub fn next_option(&mut self) -> Option<&'static str> {
        let template = self.selected_template();
        let options = template.options();
        if options.is_empty() {
            return None;
        }

        let current = self.selected_option();
        let position = current.and_then(|v| options.iter().position(|o| o.value == v));
        let next = match position {
            Some(i) => &options[(i + 1) % options.len()],
            None => &options[0],
        };
        if let Some(slot) = self.options.get_mut(self.template_index) {
            *slot = Some(next.value);
        }
        Some(next.value)
    }

    pub fn toggle_focus(&mut self) {
        self.focus = self.focus.toggle();
    }

    pub fn is_processing(&self) -> bool {
        !self.status.is_idle()
    }

    /// Run controls are live only when idle and there is input to work on
    pub fn triggers_enabled(&self) -> bool {
        !self.is_processing() && !self.histories.input.current_value().trim().is_empty()
    }

    /// Take a new histories snapshot, reloading the editor when the input changed underneath it.
    pub fn sync_histories(&mut self, histories: Histories) {
        let output_moved = histories.output.cursor() != self.histories.output.cursor();
        let input = histories.input.current_value();
        if input != self.editor.text() {
            self.editor.set_text(input);
        }
        if output_moved {
            self.output_scroll = 0;
        }
        self.histories = histories;
    }

    pub fn set_notice(&mut self, notice: Notice, now: Instant) {
        self.notice = Some(ActiveNotice::new(notice, now));
    }

    /// Drop an expired notice; returns true when one was removed
    pub fn expire_notice(&mut self, now: Instant) -> bool {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notice = None;
            return true;
        }
        false
    }

    pub fn open_settings(&mut self) {
        self.dialog = Some(SettingsDialogState::from_settings(&self.settings));
    }

    pub fn close_settings(&mut self) {
        self.dialog = None;
    }

    pub fn scroll_output(&mut self, delta: i16) {
        self.output_scroll = self.output_scroll.saturating_add_signed(delta);
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    pub fn request_exit(&mut self) {
        self.should_exit = true;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Histories::default(), Settings::default(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peditor_agent::GenerationId;
    use peditor_core::History;
    use std::time::Duration;

    fn histories(inputs: &[&str], outputs: &[&str]) -> Histories {
        let restore = |entries: &[&str]| {
            History::restore(entries.iter().map(|s| s.to_string()).collect(), entries.len() as i64 - 1)
        };
        Histories { input: restore(inputs), output: restore(outputs) }
    }

    #[test]
    fn test_new_loads_editor_from_input() {
        let state = AppState::new(histories(&["draft"], &[]), Settings::default(), Vec::new());
        assert_eq!(state.editor.text(), "draft");
        assert_eq!(state.options.len(), templates().len());
        assert_eq!(state.selected_template().title(), "Change tone");
        assert!(state.selected_option().is_some());
    }

    #[test]
    fn test_template_cycle_wraps() {
        let mut state = AppState::default();
        for _ in 0..templates().len() {
            state.next_template();
        }
        assert_eq!(state.template_index, 0);
    }

    #[test]
    fn test_next_option_only_for_groups() {
        let mut state = AppState::default();
        let first = state.selected_option();
        let next = state.next_option();
        assert!(next.is_some());
        assert_ne!(next, first);
        assert_eq!(state.selected_option(), next);

        state.next_template();
        assert_eq!(state.selected_template().title(), "Summarize");
        assert_eq!(state.next_option(), None);
    }

    #[test]
    fn test_sync_reloads_editor() {
        let mut state = AppState::new(histories(&["a"], &[]), Settings::default(), Vec::new());
        state.sync_histories(histories(&["a", "moved"], &[]));
        assert_eq!(state.editor.text(), "moved");
    }

    #[test]
    fn test_sync_keeps_editor_cursor_when_unchanged() {
        let mut state = AppState::new(histories(&["abc"], &[]), Settings::default(), Vec::new());
        state.editor.move_home();
        state.sync_histories(histories(&["abc"], &["out"]));
        assert_eq!(state.editor.cursor(), 0);
    }

    #[test]
    fn test_triggers_disabled_when_empty_or_busy() {
        let mut state = AppState::new(histories(&["text"], &[]), Settings::default(), Vec::new());
        assert!(state.triggers_enabled());

        state.status = GenerationStatus::Streaming { id: GenerationId::new(1), slot: 0 };
        assert!(!state.triggers_enabled());

        let empty = AppState::default();
        assert!(!empty.triggers_enabled());
    }

    #[test]
    fn test_notice_expires() {
        let mut state = AppState::default();
        let now = Instant::now();
        state.set_notice(Notice::info("copied"), now);
        assert!(!state.expire_notice(now + Duration::from_millis(500)));
        assert!(state.notice.is_some());
        assert!(state.expire_notice(now + NOTICE_TTL));
        assert!(state.notice.is_none());
    }

    #[test]
    fn test_scroll_saturates() {
        let mut state = AppState::default();
        state.scroll_output(-3);
        assert_eq!(state.output_scroll, 0);
        state.scroll_output(5);
        assert_eq!(state.output_scroll, 5);
    }
}
