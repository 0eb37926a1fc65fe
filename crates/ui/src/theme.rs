use peditor_core::NoticeLevel;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

/// Iceberg color theme for the PEditor TUI
///
/// Based on iceberg.vim color scheme (https://github.com/cocopon/iceberg.vim)
#[derive(Debug, Clone, Copy)]
pub struct Theme;

impl Theme {
    /// Primary background: deep blue-black (fills terminal)
    pub const BG: Color = Color::Rgb(22, 24, 33);

    /// Foreground: light blue-gray (primary text)
    pub const FG: Color = Color::Rgb(198, 200, 209);

    /// Secondary background: panes, dialogs
    pub const PANEL_BG: Color = Color::Rgb(30, 33, 50);

    /// Selected template, focused field
    pub const ACTIVE: Color = Color::Rgb(39, 44, 66);

    pub const BLUE: Color = Color::Rgb(132, 160, 198);
    pub const CYAN: Color = Color::Rgb(137, 184, 194);
    pub const PURPLE: Color = Color::Rgb(160, 147, 199);
    pub const GREEN: Color = Color::Rgb(180, 190, 130);
    pub const YELLOW: Color = Color::Rgb(226, 164, 120);
    pub const RED: Color = Color::Rgb(226, 120, 120);

    /// Muted text: dimmed foreground
    pub const MUTED: Color = Color::Rgb(107, 112, 137);

    pub const BORDER: Color = Color::Rgb(60, 65, 90);

    pub fn base() -> Style {
        Style::default().fg(Self::FG).bg(Self::BG)
    }

    pub fn primary() -> Style {
        Style::default().fg(Self::BLUE).bg(Self::BG)
    }

    pub fn success() -> Style {
        Style::default().fg(Self::GREEN).bg(Self::BG)
    }

    pub fn warning() -> Style {
        Style::default().fg(Self::YELLOW).bg(Self::BG)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::RED).bg(Self::BG)
    }

    pub fn muted() -> Style {
        Style::default().fg(Self::MUTED).bg(Self::BG)
    }

    pub fn panel() -> Style {
        Style::default().fg(Self::FG).bg(Self::PANEL_BG)
    }

    /// Pane border, brighter when the pane has focus
    pub fn border(focused: bool) -> Style {
        if focused { Style::default().fg(Self::BLUE) } else { Style::default().fg(Self::BORDER) }
    }

    pub fn active() -> Style {
        Style::default().fg(Self::FG).bg(Self::ACTIVE).add_modifier(Modifier::BOLD)
    }

    /// Key hint such as `[Ctrl+R]`
    pub fn key_hint() -> Style {
        Style::default().fg(Self::BLUE)
    }

    pub fn notice_color(level: NoticeLevel) -> Color {
        match level {
            NoticeLevel::Info => Self::GREEN,
            NoticeLevel::Warning => Self::YELLOW,
            NoticeLevel::Error => Self::RED,
        }
    }

    pub fn notice_span(level: NoticeLevel, message: &str) -> Span<'_> {
        Span::styled(message, Style::default().fg(Self::notice_color(level)))
    }

    /// Header indicator for the generation state
    pub fn processing_span(processing: bool) -> Span<'static> {
        if processing {
            Span::styled("● generating", Style::default().fg(Self::YELLOW))
        } else {
            Span::styled("○ idle", Style::default().fg(Self::MUTED))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_values() {
        assert!(matches!(Theme::BG, Color::Rgb(_, _, _)));
        assert!(matches!(Theme::FG, Color::Rgb(_, _, _)));
        assert!(matches!(Theme::PANEL_BG, Color::Rgb(_, _, _)));
    }

    #[test]
    fn test_notice_colors() {
        assert_eq!(Theme::notice_color(NoticeLevel::Info), Theme::GREEN);
        assert_eq!(Theme::notice_color(NoticeLevel::Warning), Theme::YELLOW);
        assert_eq!(Theme::notice_color(NoticeLevel::Error), Theme::RED);
    }

    #[test]
    fn test_focus_border() {
        assert_eq!(Theme::border(true).fg, Some(Theme::BLUE));
        assert_eq!(Theme::border(false).fg, Some(Theme::BORDER));
    }

    #[test]
    fn test_styles() {
        let base = Theme::base();
        assert_eq!(base.fg, Some(Theme::FG));
        assert_eq!(base.bg, Some(Theme::BG));

        let panel = Theme::panel();
        assert_eq!(panel.bg, Some(Theme::PANEL_BG));
    }

    #[test]
    fn test_processing_span() {
        assert!(Theme::processing_span(true).content.contains("generating"));
        assert!(Theme::processing_span(false).content.contains("idle"));
    }
}
