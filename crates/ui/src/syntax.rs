use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Syntax highlighter for fenced code blocks
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        let mut theme_set = ThemeSet::load_defaults();
        let theme = theme_set.themes.remove("base16-ocean.dark").unwrap_or_default();
        Self { syntax_set: SyntaxSet::load_defaults_newlines(), theme }
    }

    /// Process-wide instance; loading the syntax definitions is expensive
    pub fn shared() -> &'static SyntaxHighlighter {
        static HIGHLIGHTER: OnceLock<SyntaxHighlighter> = OnceLock::new();
        HIGHLIGHTER.get_or_init(SyntaxHighlighter::new)
    }

    /// Highlight `code`, one output line per source line
    pub fn highlight_lines(&self, code: &str, lang: &str) -> Vec<Line<'static>> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_name(lang))
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let fallback = Style::default().fg(self.text_color());

        LinesWithEndings::from(code)
            .map(|line| {
                let spans = match highlighter.highlight_line(line, &self.syntax_set) {
                    Ok(ranges) => ranges
                        .into_iter()
                        .map(|(style, text)| {
                            Span::styled(
                                text.trim_end_matches(['\n', '\r']).to_string(),
                                Style::default().fg(to_ratatui_color(&style.foreground)),
                            )
                        })
                        .filter(|span| !span.content.is_empty())
                        .collect(),
                    Err(_) => vec![Span::styled(line.trim_end_matches(['\n', '\r']).to_string(), fallback)],
                };
                Line::from(spans)
            })
            .collect()
    }

    /// Default text color from the theme
    fn text_color(&self) -> Color {
        self.theme
            .settings
            .foreground
            .as_ref()
            .map(to_ratatui_color)
            .unwrap_or(Color::Rgb(198, 200, 209))
    }

    pub fn fallback_color(&self) -> Color {
        self.text_color()
    }
}

fn to_ratatui_color(color: &syntect::highlighting::Color) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}
