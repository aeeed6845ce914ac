use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;

/// Final numbers for a completed text, captured by the app when the
/// session finishes.
pub struct TextSummary {
    pub title: String,
    pub wpm: u32,
    pub accuracy: u8,
    pub entries: usize,
    pub errors: usize,
    pub elapsed_secs: f64,
    pub coins_earned: u64,
}

pub struct SummaryPanel<'a> {
    pub summary: &'a TextSummary,
    pub theme: &'a Theme,
}

fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        let total = secs.round() as u64;
        let (minutes, rest) = (total / 60, total % 60);
        if minutes >= 60 {
            format!("{}:{:02}:{:02}", minutes / 60, minutes % 60, rest)
        } else {
            format!("{minutes}:{rest:02}")
        }
    }
}

impl Widget for SummaryPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let summary = self.summary;

        let block = Block::bordered()
            .title(" Text Complete ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let [title_row, wpm_row, acc_row, time_row, coins_row, _, help_row] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .areas(inner);

        Paragraph::new(Line::from(Span::styled(
            summary.title.clone(),
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(title_row, buf);

        let label_style = Style::default().fg(colors.fg());
        let stat_row = |label: &'static str, value: String, value_style: Style| {
            Paragraph::new(Line::from(vec![
                Span::styled(label, label_style),
                Span::styled(value, value_style),
            ]))
        };

        stat_row(
            "  Speed:    ",
            format!("{} WPM", summary.wpm),
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )
        .render(wpm_row, buf);

        let acc_color = match summary.accuracy {
            95.. => colors.success(),
            85.. => colors.warning(),
            _ => colors.error(),
        };
        let correct = summary.entries.saturating_sub(summary.errors);
        Paragraph::new(Line::from(vec![
            Span::styled("  Accuracy: ", label_style),
            Span::styled(
                format!("{}%", summary.accuracy),
                Style::default().fg(acc_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ({correct}/{} correct)", summary.entries),
                Style::default().fg(colors.text_pending()),
            ),
        ]))
        .render(acc_row, buf);

        stat_row(
            "  Time:     ",
            format_duration(summary.elapsed_secs),
            label_style,
        )
        .render(time_row, buf);

        let coin_color = if summary.coins_earned > 0 {
            colors.success()
        } else {
            colors.fg()
        };
        stat_row(
            "  Coins:    ",
            format!("+{}", summary.coins_earned),
            Style::default().fg(coin_color),
        )
        .render(coins_row, buf);

        let hint_style = Style::default().fg(colors.accent());
        Paragraph::new(Line::from(vec![
            Span::styled("  [Enter] Library  ", hint_style),
            Span::styled("[r] Practice again  ", hint_style),
            Span::styled("[q] Quit", hint_style),
        ]))
        .render(help_row, buf);
    }
}
