mod event_loop;

pub use event_loop::run;

use crate::clipboard::Clipboard;
use crate::components::{ActionsBar, Footer, Header, InputPane, OutputPane, SettingsDialog};
use crate::event_handler::{EventHandler, KeyAction};
use crate::layout::EditorLayout;
use crate::state::AppState;
use crate::theme::Theme;

use crossterm::event::Event;
use peditor_agent::Orchestrator;
use peditor_core::{HistoryKind, Notice, notice::messages, template, templates};
use ratatui::{Frame, Terminal, backend::CrosstermBackend, widgets::Block};
use std::io::{Result, Stdout};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

const GENERATION_STOPPED: &str = "Generation stopped";
const SETTINGS_SAVED: &str = "Settings saved";

/// Main TUI application
///
/// Owns the view state and forwards user actions to the shared history store, the
/// settings context and the orchestrator. The view is refreshed from those after every
/// action and whenever one of their watch channels fires.
pub struct App {
    state: AppState,
    orchestrator: Arc<Orchestrator>,
    clipboard: Box<dyn Clipboard>,
}

impl App {
    pub fn new(orchestrator: Arc<Orchestrator>, clipboard: Box<dyn Clipboard>) -> Self {
        let settings = orchestrator.settings();
        let options = templates().iter().map(|t| settings.selected_option(t)).collect();
        let mut state = AppState::new(orchestrator.histories().snapshot(), settings.current(), options)
            .with_provider(orchestrator.provider_name());
        state.status = orchestrator.status();
        Self { state, orchestrator, clipboard }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Pull fresh snapshots of histories, settings and generation status
    pub fn refresh(&mut self) {
        self.state.sync_histories(self.orchestrator.histories().snapshot());
        self.state.settings = self.orchestrator.settings().current();
        self.state.status = self.orchestrator.status();
    }

    /// Route a terminal event through the key handlers and apply the resulting action
    pub fn handle_event(&mut self, event: Event) {
        if let Some(action) = EventHandler::handle_event(&event, &mut self.state) {
            self.handle_action(action);
        }
    }

    pub fn handle_action(&mut self, action: KeyAction) {
        if action.is_view_only() {
            return;
        }
        debug!(?action, "Handling action");

        let histories = Arc::clone(self.orchestrator.histories());
        match action {
            KeyAction::InputChanged { text } => histories.edit_input(text),
            KeyAction::Navigate { kind, direction } => {
                histories.navigate(kind, direction);
            }
            KeyAction::SelectOption { title, value } => {
                if let Some(template) = template::find(title)
                    && let Err(e) = self.orchestrator.settings().set_selected_option(template, value)
                {
                    warn!(template = title, error = %e, "Failed to persist option selection");
                }
            }
            KeyAction::RunTemplate { title, option } => {
                let Some(template) = template::find(title) else {
                    return;
                };
                let outcome = self.orchestrator.submit(template, option);
                if let Some(notice) = outcome.notice() {
                    self.notify(notice);
                }
            }
            KeyAction::MoveOutputToInput => {
                let outcome = histories.move_output_to_input();
                self.notify(outcome.notice());
            }
            KeyAction::Copy { kind } => self.copy(kind),
            KeyAction::Clear { kind } => {
                if kind == HistoryKind::Output && self.orchestrator.is_processing() {
                    self.notify(Notice::warning(messages::BUSY));
                } else {
                    histories.clear(kind);
                }
            }
            KeyAction::SaveSettings { credential, model, temperature } => self.save_settings(credential, model, temperature),
            KeyAction::CancelGeneration => {
                if self.orchestrator.cancel().is_some() {
                    self.notify(Notice::info(GENERATION_STOPPED));
                }
            }
            KeyAction::Exit => {
                self.orchestrator.cancel();
                self.state.request_exit();
            }
            KeyAction::ToggleFocus
            | KeyAction::SelectTemplate { .. }
            | KeyAction::ScrollOutput
            | KeyAction::OpenSettings
            | KeyAction::CloseSettings
            | KeyAction::SettingsEdited => {}
        }

        self.refresh();
    }

    fn copy(&mut self, kind: HistoryKind) {
        let text = self.orchestrator.histories().current_value(kind);
        let notice = match self.clipboard.write_text(&text) {
            Ok(()) => Notice::info(match kind {
                HistoryKind::Input => messages::INPUT_COPIED,
                HistoryKind::Output => messages::OUTPUT_COPIED,
            }),
            Err(e) => {
                warn!(error = %e, "Clipboard write failed");
                Notice::error(messages::COPY_FAILED)
            }
        };
        self.notify(notice);
    }

    fn save_settings(&mut self, credential: String, model: String, temperature: f32) {
        let settings = self.orchestrator.settings();
        let result = settings
            .set_credential(credential)
            .and_then(|_| settings.set_model(model))
            .and_then(|_| settings.set_temperature(temperature));

        match result {
            Ok(()) => self.notify(Notice::info(SETTINGS_SAVED)),
            Err(e) => {
                warn!(error = %e, "Failed to save settings");
                self.notify(Notice::error(e.to_string()));
            }
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.state.set_notice(notice, Instant::now());
    }

    pub fn should_exit(&self) -> bool {
        self.state.should_exit()
    }

    /// Render the whole UI into a frame
    pub fn render(&self, frame: &mut Frame<'_>) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Theme::base()), area);

        let layout = EditorLayout::calculate(area);
        Header::new(&self.state).render(frame, layout.header);
        ActionsBar::new(&self.state).render(frame, layout.actions);
        InputPane::new(&self.state).render(frame, layout.input);
        OutputPane::new(&self.state).render(frame, layout.output);
        Footer::new(&self.state).render(frame, layout.footer);

        if let Some(dialog) = &self.state.dialog {
            SettingsDialog::new(dialog).render(frame, area);
        }
    }

    /// Draw the UI
    pub fn draw(&self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        terminal.draw(|frame| self.render(frame))?;
        Ok(())
    }
}
