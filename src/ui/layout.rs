use ratatui::layout::{Constraint, Flex, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutTier {
    Wide,   // ≥100 cols: typing area + stats sidebar
    Medium, // 60-99 cols: full-width typing, stats in the header
    Narrow, // <60 cols: full-width typing only
}

impl LayoutTier {
    pub fn from_area(area: Rect) -> Self {
        match area.width {
            0..60 => LayoutTier::Narrow,
            60..100 => LayoutTier::Medium,
            _ => LayoutTier::Wide,
        }
    }

    pub fn show_sidebar(&self) -> bool {
        *self == LayoutTier::Wide
    }
}

/// The fixed three-row frame every screen renders into, with the middle
/// row optionally split for a sidebar.
pub struct AppLayout {
    pub tier: LayoutTier,
    pub header: Rect,
    pub main: Rect,
    pub sidebar: Option<Rect>,
    pub footer: Rect,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let tier = LayoutTier::from_area(area);
        let [header, middle, footer] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .areas(area);

        let (main, sidebar) = if tier.show_sidebar() {
            let [main, side] =
                Layout::horizontal([Constraint::Percentage(70), Constraint::Percentage(30)])
                    .areas(middle);
            (main, Some(side))
        } else {
            (middle, None)
        };

        Self {
            tier,
            header,
            main,
            sidebar,
            footer,
        }
    }
}

/// Interior cell count of the bordered typing paragraph, fed to column
/// estimation before reflowing the text.
pub fn typing_cells(main: Rect) -> usize {
    main.width.saturating_sub(2) as usize
}

/// Pack key hints into indented rows no wider than `width`. A hint that
/// cannot fit anywhere still gets a row of its own.
pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    const INDENT: &str = "  ";
    const GAP: &str = "  ";

    if width == 0 {
        return Vec::new();
    }
    let mut rows: Vec<String> = Vec::new();
    for hint in hints.iter().filter(|h| !h.is_empty()) {
        let needed = GAP.len() + hint.chars().count();
        match rows.last_mut() {
            Some(row) if row.chars().count() + needed <= width => {
                row.push_str(GAP);
                row.push_str(hint);
            }
            _ => rows.push(format!("{INDENT}{hint}")),
        }
    }
    rows
}

/// Center a `percent_x` by `percent_y` popup in `area`, never smaller
/// than the floor a dialog needs to stay legible.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 72;
    const MIN_POPUP_HEIGHT: u16 = 18;

    let width = scaled(area.width, percent_x)
        .max(MIN_POPUP_WIDTH)
        .min(area.width);
    let height = scaled(area.height, percent_y)
        .max(MIN_POPUP_HEIGHT)
        .min(area.height);

    let [band] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(band);
    popup
}

fn scaled(dim: u16, percent: u16) -> u16 {
    (u32::from(dim) * u32::from(percent.min(100)) / 100) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_pack_until_the_width_runs_out() {
        let hints = ["[a] One", "[b] Two", "[c] Three"];
        let rows = pack_hint_lines(&hints, 22);
        assert_eq!(rows, vec!["  [a] One  [b] Two".to_string(), "  [c] Three".to_string()]);
    }

    #[test]
    fn test_overlong_hint_still_gets_a_row() {
        let rows = pack_hint_lines(&["[Enter] Do the thing"], 10);
        assert_eq!(rows, vec!["  [Enter] Do the thing".to_string()]);
    }

    #[test]
    fn test_centered_rect_enforces_the_popup_floor() {
        let area = Rect::new(0, 0, 200, 50);
        let popup = centered_rect(10, 10, area);
        assert_eq!(popup.width, 72);
        assert_eq!(popup.height, 18);
        assert_eq!(popup.x, (200 - 72) / 2);
    }

    #[test]
    fn test_sidebar_only_on_wide_terminals() {
        assert!(AppLayout::new(Rect::new(0, 0, 120, 40)).sidebar.is_some());
        assert!(AppLayout::new(Rect::new(0, 0, 80, 40)).sidebar.is_none());
    }
}
