//! Markdown rendering for the output pane
//!
//! Covers what model replies actually contain: headings, bullet and numbered lists, block
//! quotes, rules, fenced code blocks (highlighted through [`SyntaxHighlighter`]) and inline
//! `code` / **bold** spans. Everything else is shown as wrapped text. Unterminated fences and
//! inline markers are tolerated, since the text may still be streaming in.

use crate::syntax::SyntaxHighlighter;
use crate::theme::Theme;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const FENCE: &str = "```";

/// Render `text` into lines no wider than `width` columns (0 disables wrapping).
pub fn render(text: &str, width: usize) -> Vec<Line<'static>> {
    let width = if width == 0 { usize::MAX } else { width };
    let mut lines = Vec::new();
    let mut source = text.lines();

    while let Some(line) = source.next() {
        let trimmed = line.trim_start();

        if let Some(lang) = trimmed.strip_prefix(FENCE) {
            let mut code = String::new();
            for code_line in source.by_ref() {
                if code_line.trim_start().starts_with(FENCE) {
                    break;
                }
                code.push_str(code_line);
                code.push('\n');
            }
            render_code_block(&code, lang.trim(), &mut lines);
            continue;
        }

        render_block_line(line, width, &mut lines);
    }

    lines
}

fn render_block_line(line: &str, width: usize, lines: &mut Vec<Line<'static>>) {
    let trimmed = line.trim_start();
    let base = Style::default().fg(Theme::FG);

    if trimmed.is_empty() {
        lines.push(Line::default());
        return;
    }

    if is_rule(trimmed) {
        let len = if width == usize::MAX { 3 } else { width };
        lines.push(Line::from(Span::styled("─".repeat(len), Style::default().fg(Theme::BORDER))));
        return;
    }

    if let Some((level, heading)) = heading(trimmed) {
        let color = if level <= 2 { Theme::BLUE } else { Theme::CYAN };
        let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
        wrap_words(words(&parse_inline(heading, style)), width, Vec::new(), Vec::new(), lines);
        return;
    }

    if let Some(quote) = trimmed.strip_prefix('>') {
        let style = base.add_modifier(Modifier::ITALIC);
        let bar = vec![Span::styled("│ ", Style::default().fg(Theme::MUTED))];
        wrap_words(words(&parse_inline(quote.trim_start(), style)), width, bar.clone(), bar, lines);
        return;
    }

    let indent = " ".repeat(line.len() - trimmed.len());
    if let Some((marker, item)) = list_item(trimmed) {
        let marker_span = Span::styled(format!("{indent}{marker} "), Style::default().fg(Theme::PURPLE));
        let hanging = Span::raw(" ".repeat(marker_span.content.width()));
        wrap_words(words(&parse_inline(item, base)), width, vec![marker_span], vec![hanging], lines);
        return;
    }

    wrap_words(words(&parse_inline(trimmed, base)), width, Vec::new(), Vec::new(), lines);
}

fn render_code_block(code: &str, lang: &str, lines: &mut Vec<Line<'static>>) {
    let frame = Style::default().fg(Theme::MUTED);
    let label = if lang.is_empty() { "code".to_string() } else { lang.to_lowercase() };
    lines.push(Line::from(Span::styled(format!("╭─ {label}"), frame)));

    for highlighted in SyntaxHighlighter::shared().highlight_lines(code, lang) {
        let mut spans = vec![Span::styled("│ ", frame)];
        spans.extend(highlighted.spans);
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(Span::styled("╰─", frame)));
}

fn is_rule(line: &str) -> bool {
    let line = line.trim_end();
    line.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|c| line.chars().all(|ch| ch == *c || ch == ' ') && line.contains(*c))
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&level) {
        line[level..].strip_prefix(' ').map(|rest| (level, rest.trim()))
    } else {
        None
    }
}

/// `- item`, `* item`, `+ item` or `12. item`; returns the display marker and the item text
fn list_item(line: &str) -> Option<(String, &str)> {
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return Some(("•".to_string(), rest));
        }
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0
        && let Some(rest) = line[digits..].strip_prefix(". ")
    {
        return Some((line[..digits + 1].to_string(), rest));
    }
    None
}

/// Split a line into styled segments for `code` and **bold** spans.
fn parse_inline(text: &str, base: Style) -> Vec<(String, Style)> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut bold = false;
    let mut code = false;
    let mut chars = text.chars().peekable();

    let style_for = |bold: bool, code: bool| {
        let mut style = if code { base.fg(Theme::CYAN) } else { base };
        if bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        style
    };

    while let Some(c) = chars.next() {
        match c {
            '`' => {
                if !current.is_empty() {
                    segments.push((std::mem::take(&mut current), style_for(bold, code)));
                }
                code = !code;
            }
            '*' if !code && chars.peek() == Some(&'*') => {
                chars.next();
                if !current.is_empty() {
                    segments.push((std::mem::take(&mut current), style_for(bold, code)));
                }
                bold = !bold;
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        segments.push((current, style_for(bold, code)));
    }
    segments
}

struct Word {
    text: String,
    style: Style,
    space_before: bool,
}

fn words(segments: &[(String, Style)]) -> Vec<Word> {
    let mut out = Vec::new();
    let mut pending_space = false;

    for (text, style) in segments {
        let mut buf = String::new();
        for ch in text.chars() {
            if ch.is_whitespace() {
                if !buf.is_empty() {
                    out.push(Word { text: std::mem::take(&mut buf), style: *style, space_before: pending_space });
                }
                pending_space = true;
            } else {
                buf.push(ch);
            }
        }
        if !buf.is_empty() {
            out.push(Word { text: buf, style: *style, space_before: pending_space });
            pending_space = false;
        }
    }
    out
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|s| s.content.width()).sum()
}

/// Greedy word wrap. `first` prefixes the first line, `rest` every continuation line.
fn wrap_words(
    words: Vec<Word>, width: usize, first: Vec<Span<'static>>, rest: Vec<Span<'static>>, lines: &mut Vec<Line<'static>>,
) {
    let rest_width = spans_width(&rest);
    let mut line_width = spans_width(&first);
    let mut spans = first;
    let mut empty = true;

    for word in words {
        let word_width = word.text.width();
        let separator = usize::from(!empty && word.space_before);

        if !empty && line_width + separator + word_width > width {
            lines.push(Line::from(std::mem::replace(&mut spans, rest.clone())));
            line_width = rest_width;
            empty = true;
        }

        if !empty && word.space_before {
            spans.push(Span::raw(" "));
            line_width += 1;
        }

        if empty && line_width + word_width > width && width > line_width {
            let mut chunk = String::new();
            let mut chunk_width = 0;
            for ch in word.text.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if line_width + chunk_width + ch_width > width && !chunk.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut chunk), word.style));
                    lines.push(Line::from(std::mem::replace(&mut spans, rest.clone())));
                    line_width = rest_width;
                    chunk_width = 0;
                }
                chunk.push(ch);
                chunk_width += ch_width;
            }
            spans.push(Span::styled(chunk, word.style));
            line_width += chunk_width;
        } else {
            spans.push(Span::styled(word.text, word.style));
            line_width += word_width;
        }
        empty = false;
    }

    if !empty {
        lines.push(Line::from(spans));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(text_of).collect()
    }

    #[test]
    fn test_plain_paragraph_wraps() {
        let lines = render("the quick brown fox jumps", 10);
        assert_eq!(texts(&lines), vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_zero_width_disables_wrapping() {
        let lines = render("the quick brown fox jumps", 0);
        assert_eq!(texts(&lines), vec!["the quick brown fox jumps"]);
    }

    #[test]
    fn test_long_word_is_split() {
        let lines = render("abcdefghij", 4);
        assert_eq!(texts(&lines), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_heading_is_bold_without_hashes() {
        let lines = render("## Summary", 40);
        assert_eq!(texts(&lines), vec!["Summary"]);
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(lines[0].spans[0].style.fg, Some(Theme::BLUE));
    }

    #[test]
    fn test_not_a_heading_without_space() {
        assert_eq!(texts(&render("#hashtag", 40)), vec!["#hashtag"]);
    }

    #[test]
    fn test_bullets_and_numbers() {
        let lines = render("- first\n* second\n3. third", 40);
        assert_eq!(texts(&lines), vec!["• first", "• second", "3. third"]);
        assert_eq!(lines[0].spans[0].style.fg, Some(Theme::PURPLE));
    }

    #[test]
    fn test_bullet_continuation_is_indented() {
        let lines = render("- alpha beta gamma", 10);
        assert_eq!(texts(&lines), vec!["• alpha", "  beta", "  gamma"]);
    }

    #[test]
    fn test_inline_code_and_bold() {
        let lines = render("use `cargo` **now**", 40);
        assert_eq!(texts(&lines), vec!["use cargo now"]);
        let code = lines[0].spans.iter().find(|s| s.content == "cargo").unwrap();
        assert_eq!(code.style.fg, Some(Theme::CYAN));
        let bold = lines[0].spans.iter().find(|s| s.content == "now").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_fenced_code_block() {
        let lines = render("Intro\n```rust\nfn main() {}\n```\nAfter", 40);
        let rendered = texts(&lines);
        assert_eq!(rendered[0], "Intro");
        assert_eq!(rendered[1], "╭─ rust");
        assert_eq!(rendered[2], "│ fn main() {}");
        assert_eq!(rendered[3], "╰─");
        assert_eq!(rendered[4], "After");
    }

    #[test]
    fn test_unterminated_fence_while_streaming() {
        let lines = render("```python\nprint('hi')", 40);
        let rendered = texts(&lines);
        assert_eq!(rendered, vec!["╭─ python", "│ print('hi')", "╰─"]);
    }

    #[test]
    fn test_blank_lines_and_rules() {
        let lines = render("one\n\n---\ntwo", 5);
        assert_eq!(texts(&lines), vec!["one", "", "─────", "two"]);
    }

    #[test]
    fn test_quote() {
        let lines = render("> quoted text", 40);
        assert_eq!(texts(&lines), vec!["│ quoted text"]);
    }
}
