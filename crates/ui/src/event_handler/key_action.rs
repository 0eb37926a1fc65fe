use peditor_core::{Direction, HistoryKind};

/// Actions that can be triggered by key events
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    /// The input pane text was edited
    InputChanged { text: String },
    /// Step the cursor of a history
    Navigate { kind: HistoryKind, direction: Direction },
    /// Focus moved to the other pane
    ToggleFocus,
    /// Template selection moved in the actions bar
    SelectTemplate { title: &'static str },
    /// A group template's option changed
    SelectOption { title: &'static str, value: &'static str },
    /// Run a template over the current input
    RunTemplate { title: &'static str, option: Option<&'static str> },
    MoveOutputToInput,
    /// Copy the selected entry of a history
    Copy { kind: HistoryKind },
    /// Clear a whole history
    Clear { kind: HistoryKind },
    /// Output pane scrolled
    ScrollOutput,
    OpenSettings,
    SaveSettings { credential: String, model: String, temperature: f32 },
    CloseSettings,
    /// Edit inside the settings dialog
    SettingsEdited,
    CancelGeneration,
    /// Exit the TUI application
    Exit,
}

impl KeyAction {
    /// Whether the action only changed local view state
    pub fn is_view_only(&self) -> bool {
        matches!(
            self,
            KeyAction::ToggleFocus
                | KeyAction::SelectTemplate { .. }
                | KeyAction::ScrollOutput
                | KeyAction::OpenSettings
                | KeyAction::CloseSettings
                | KeyAction::SettingsEdited
        )
    }
}
