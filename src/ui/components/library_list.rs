use std::ops::Range;

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;

/// One row of the library screen, precomputed by the app so the widget
/// stays free of store and reflow concerns.
pub struct LibraryEntry {
    pub title: String,
    pub completion_percent: u8,
    pub times_completed: u32,
}

pub struct LibraryList<'a> {
    pub entries: &'a [LibraryEntry],
    pub selected: usize,
    pub theme: &'a Theme,
}

fn status_text(percent: u8, times_completed: u32) -> String {
    if times_completed > 0 {
        format!("{percent}% · finished {times_completed}×")
    } else if percent == 0 {
        "not started".to_string()
    } else {
        format!("{percent}% complete")
    }
}

/// Window of entries keeping the selected row visible, two terminal
/// rows per entry.
fn visible_window(selected: usize, len: usize, page: usize) -> Range<usize> {
    let page = page.max(1);
    let start = selected.saturating_sub(page - 1);
    start..(start + page).min(len)
}

impl Widget for &LibraryList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Library ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.entries.is_empty() {
            let hint = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "No texts yet.",
                    Style::default().fg(colors.fg()),
                )),
                Line::from(Span::styled(
                    "Import one with: copytype add <file>",
                    Style::default().fg(colors.text_pending()),
                )),
            ])
            .alignment(Alignment::Center);
            hint.render(inner, buf);
            return;
        }

        let page = (inner.height as usize / 2).max(1);
        let window = visible_window(self.selected, self.entries.len(), page);

        let mut lines: Vec<Line> = Vec::new();
        for i in window {
            let entry = &self.entries[i];
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };

            let title_style = Style::default()
                .fg(if is_selected {
                    colors.accent()
                } else {
                    colors.fg()
                })
                .add_modifier(if is_selected {
                    Modifier::BOLD
                } else {
                    Modifier::empty()
                });

            let status_style = if entry.times_completed > 0 {
                Style::default().fg(colors.success())
            } else if entry.completion_percent > 0 {
                Style::default().fg(colors.warning())
            } else {
                Style::default().fg(colors.text_pending())
            };

            lines.push(Line::from(Span::styled(
                format!(" {indicator} {}", entry.title),
                title_style,
            )));
            lines.push(Line::from(Span::styled(
                format!(
                    "     {}",
                    status_text(entry.completion_percent, entry.times_completed)
                ),
                status_style,
            )));
        }

        Paragraph::new(lines).render(inner, buf);
    }
}
