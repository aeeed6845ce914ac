use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::engine::{CharMark, PracticeSession};
use crate::ui::theme::{Theme, ThemeColors};

const LINE_BREAK_MARK: &str = "\u{21b5}"; // ↵

/// The visible block of lines. The active line is styled per keystroke;
/// committed lines sit above it and upcoming lines render dimmed below.
pub struct TypingArea<'a> {
    session: &'a PracticeSession,
    theme: &'a Theme,
}

impl<'a> TypingArea<'a> {
    pub fn new(session: &'a PracticeSession, theme: &'a Theme) -> Self {
        Self { session, theme }
    }
}

fn miss_style(colors: &ThemeColors) -> Style {
    Style::default()
        .fg(colors.text_incorrect())
        .bg(colors.text_incorrect_bg())
        .add_modifier(Modifier::UNDERLINED)
}

fn cursor_style(colors: &ThemeColors) -> Style {
    Style::default()
        .fg(colors.text_cursor_fg())
        .bg(colors.text_cursor_bg())
}

/// Styled spans for the line being typed: per-slot marks, the typed
/// character shown in place of the target on a miss, overflow appended
/// after the end, and the break marker when a separator follows.
fn active_line_spans(
    line: &str,
    marks: &[CharMark],
    typed: &[char],
    cursor: usize,
    overflow: &str,
    marker: Option<Style>,
    colors: &ThemeColors,
) -> Line<'static> {
    let mut spans: Vec<Span> = Vec::new();

    for (idx, target) in line.chars().enumerate() {
        let mark = marks.get(idx).copied().unwrap_or(CharMark::Pending);
        let (display, style) = match mark {
            CharMark::Correct => (
                target.to_string(),
                Style::default().fg(colors.text_correct()),
            ),
            CharMark::Incorrect => {
                // Show what was actually typed, not what should have been
                let shown = typed.get(idx).copied().unwrap_or(target);
                (shown.to_string(), miss_style(colors))
            }
            CharMark::Pending | CharMark::Placeholder => {
                let style = if idx == cursor {
                    cursor_style(colors)
                } else {
                    Style::default().fg(colors.text_pending())
                };
                (target.to_string(), style)
            }
        };
        spans.push(Span::styled(display, style));
    }

    if !overflow.is_empty() {
        spans.push(Span::styled(overflow.to_string(), miss_style(colors)));
    }

    if let Some(style) = marker {
        spans.push(Span::styled(LINE_BREAK_MARK.to_string(), style));
    }

    Line::from(spans)
}

impl Widget for TypingArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block_lines = self.session.block_lines();
        let active = self.session.active_line_in_block();
        let last_visible = block_lines.len().saturating_sub(1);
        // No separator follows the final line of the text
        let marker_after =
            |i: usize| !(self.session.is_last_block() && i == last_visible);

        let typed: Vec<char> = self.session.buffer().chars().collect();
        let overflow = self.session.overflow_text();

        let mut lines: Vec<Line> = Vec::new();
        for (i, text) in block_lines.iter().enumerate() {
            if i < active {
                let style = Style::default().fg(colors.text_correct());
                let mut spans = vec![Span::styled(text.as_str(), style)];
                if marker_after(i) {
                    spans.push(Span::styled(LINE_BREAK_MARK, style));
                }
                lines.push(Line::from(spans));
            } else if i == active {
                let marker = if marker_after(i) {
                    Some(if self.session.line_ready() {
                        cursor_style(colors)
                    } else {
                        Style::default().fg(colors.text_pending())
                    })
                } else {
                    None
                };
                lines.push(active_line_spans(
                    text,
                    self.session.marks(),
                    &typed,
                    self.session.cursor_in_line(),
                    &overflow,
                    marker,
                    colors,
                ));
            } else {
                let style = Style::default().fg(colors.text_pending());
                let mut spans = vec![Span::styled(text.as_str(), style)];
                if marker_after(i) {
                    spans.push(Span::styled(LINE_BREAK_MARK, style));
                }
                lines.push(Line::from(spans));
            }
        }

        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "Text complete.",
                Style::default().fg(colors.text_correct()),
            )));
        }

        let border = if self.session.is_finished() {
            colors.border()
        } else {
            colors.border_focused()
        };
        let block = Block::bordered()
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(colors.bg()));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });

        paragraph.render(area, buf);
    }
}
