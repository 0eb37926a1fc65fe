use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Layout breakpoints for the editor
///
/// - >= 90 cols: input and output side by side
/// - < 90 cols: output stacked below input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    SideBySide,
    Stacked,
}

impl From<u16> for LayoutMode {
    fn from(width: u16) -> Self {
        match width {
            w if w >= 90 => Self::SideBySide,
            _ => Self::Stacked,
        }
    }
}

/// Calculated layout for the TUI
#[derive(Debug, Clone)]
pub struct EditorLayout {
    pub mode: LayoutMode,
    /// Title and status line (1 line)
    pub header: Rect,
    /// Template bar (1 line)
    pub actions: Rect,
    pub input: Rect,
    pub output: Rect,
    /// Key hints and notices (1 line)
    pub footer: Rect,
}

impl EditorLayout {
    pub fn calculate(area: Rect) -> Self {
        let mode = LayoutMode::from(area.width);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        let header = chunks[0];
        let actions = chunks[1];
        let main = chunks[2];
        let footer = chunks[3];

        let panes = match mode {
            LayoutMode::SideBySide => Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(main),
            LayoutMode::Stacked => Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(main),
        };

        Self { mode, header, actions, input: panes[0], output: panes[1], footer }
    }

    /// Centered overlay for the settings dialog, clamped to the frame
    pub fn dialog(area: Rect) -> Rect {
        let width = area.width.min(60);
        let height = area.height.min(9);
        let x = area.x + (area.width - width) / 2;
        let y = area.y + (area.height - height) / 2;
        Rect::new(x, y, width, height)
    }
}
