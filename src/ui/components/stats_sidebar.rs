use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::engine::PracticeSession;
use crate::ui::theme::{Theme, ThemeColors};

/// Live session numbers plus a completion bar, shown beside the typing
/// area on wide terminals.
pub struct StatsSidebar<'a> {
    session: &'a PracticeSession,
    coins: u64,
    theme: &'a Theme,
}

impl<'a> StatsSidebar<'a> {
    pub fn new(session: &'a PracticeSession, coins: u64, theme: &'a Theme) -> Self {
        Self {
            session,
            coins,
            theme,
        }
    }
}

fn render_completion_bar(area: Rect, buf: &mut Buffer, percent: u8, colors: &ThemeColors) {
    let block = Block::bordered()
        .title(" Progress ")
        .border_style(Style::default().fg(colors.border()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(area);
    block.render(area, buf);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let ratio = f64::from(percent) / 100.0;
    let filled_width = (ratio * f64::from(inner.width)) as u16;
    let label = format!("{percent}%");

    for x in inner.x..inner.x + inner.width {
        let style = if x < inner.x + filled_width {
            Style::default().fg(colors.bg()).bg(colors.bar_filled())
        } else {
            Style::default().fg(colors.fg()).bg(colors.bar_empty())
        };
        buf[(x, inner.y)].set_style(style);
    }

    let label_x = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
    buf.set_string(label_x, inner.y, &label, Style::default().fg(colors.fg()));
}

impl Widget for StatsSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(3)])
            .split(area);

        let wpm = self.session.wpm();
        let accuracy = self.session.accuracy();
        let errors = self.session.errors();
        let elapsed = self.session.elapsed_secs();

        let wpm_str = format!("{wpm}");
        let acc_str = format!("{accuracy}%");
        let errors_str = format!("{errors}");
        let elapsed_str = format!("{elapsed:.1}s");
        let coins_str = format!("{}", self.coins);

        let lines = vec![
            Line::from(vec![
                Span::styled("WPM: ", Style::default().fg(colors.fg())),
                Span::styled(wpm_str, Style::default().fg(colors.accent())),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Accuracy: ", Style::default().fg(colors.fg())),
                Span::styled(
                    acc_str,
                    Style::default().fg(if accuracy >= 95 {
                        colors.success()
                    } else if accuracy >= 85 {
                        colors.warning()
                    } else {
                        colors.error()
                    }),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Errors: ", Style::default().fg(colors.fg())),
                Span::styled(
                    errors_str,
                    Style::default().fg(if errors == 0 {
                        colors.success()
                    } else {
                        colors.error()
                    }),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Time: ", Style::default().fg(colors.fg())),
                Span::styled(elapsed_str, Style::default().fg(colors.fg())),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Coins: ", Style::default().fg(colors.fg())),
                Span::styled(coins_str, Style::default().fg(colors.warning())),
            ]),
        ];

        let block = Block::bordered()
            .title(" Session ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(lines).block(block).render(sections[0], buf);

        render_completion_bar(
            sections[1],
            buf,
            self.session.completion_percent(),
            colors,
        );
    }
}
