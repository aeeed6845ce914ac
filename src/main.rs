mod app;
mod config;
mod engine;
mod event;
mod store;
mod ui;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use app::{App, AppScreen};
use event::{AppEvent, EventHandler};
use store::JsonStore;
use ui::components::{LibraryList, StatsSidebar, SummaryPanel, TypingArea};
use ui::layout::AppLayout;
use ui::theme::ThemeColors;

#[derive(Parser)]
#[command(
    name = "copytype",
    version,
    about = "Terminal typing practice over your own texts"
)]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Import a text file into the library
    Add {
        path: PathBuf,

        #[arg(short, long, help = "Library title (defaults to the file name)")]
        title: Option<String>,
    },
    /// List library texts and their progress
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Add { path, title }) => return run_add(&path, title.as_deref()),
        Some(Command::List) => return run_list(),
        None => {}
    }

    let mut app = App::new()?;

    if let Some(theme_name) = cli.theme {
        match ui::theme::Theme::load(&theme_name) {
            Some(theme) => app.theme = Box::leak(Box::new(theme)),
            None => anyhow::bail!(
                "unknown theme '{theme_name}' (bundled: {})",
                ui::theme::Theme::available_themes().join(", ")
            ),
        }
    }

    let (mut terminal, keyboard_enhanced) = setup_terminal()?;
    if let Ok(size) = terminal.size() {
        app.handle_resize(size.width, size.height);
    }

    let events = EventHandler::new(Duration::from_millis(500));
    let result = run_app(&mut terminal, &mut app, &events);

    restore_terminal(&mut terminal, keyboard_enhanced)?;
    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }
    Ok(())
}

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

fn setup_terminal() -> Result<(Tui, bool)> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Try to enable keyboard enhancement so key auto-repeat can be ignored
    let keyboard_enhanced = execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok();

    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut Tui, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_add(path: &Path, title: Option<&str>) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let fallback = path.file_stem().and_then(|s| s.to_str()).unwrap_or("text");
    let title = title.unwrap_or(fallback);

    let store = JsonStore::new()?;
    let record = store.add_text(title, &content)?;
    println!("added '{}' as {}", record.title, record.id);
    Ok(())
}

fn run_list() -> Result<()> {
    let store = JsonStore::new()?;
    let texts = store.list_texts()?;
    if texts.is_empty() {
        println!("library is empty; add a text with: copytype add <file>");
        return Ok(());
    }
    for record in texts {
        let status = if record.times_completed > 0 {
            format!("finished {}x", record.times_completed)
        } else if record.progress_index > 0 {
            format!("in progress ({})", record.progress_index)
        } else {
            "not started".to_string()
        };
        println!("{}  {}  [{}]", record.id, record.title, status);
    }
    Ok(())
}

fn run_app(terminal: &mut Tui, app: &mut App, events: &EventHandler) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.tick(),
            AppEvent::Resize(width, height) => app.handle_resize(width, height),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Only process Press events; Repeat would inflate typed input
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Library => handle_library_key(app, key),
        AppScreen::Practice => handle_practice_key(app, key),
        AppScreen::Summary => handle_summary_key(app, key),
    }
}

fn handle_library_key(app: &mut App, key: KeyEvent) {
    // Confirmation prompt takes priority
    if app.confirm_delete {
        match key.code {
            KeyCode::Char('y') => app.confirm_delete_selected(),
            KeyCode::Char('n') | KeyCode::Esc => app.cancel_delete(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Enter => app.open_selected(),
        KeyCode::Char('x') | KeyCode::Delete => app.request_delete(),
        KeyCode::Char('r') => app.refresh_library(),
        _ => {}
    }
}

fn handle_practice_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('s') => app.manual_save(),
            KeyCode::Char('k') => app.skip_block(),
            KeyCode::Char('r') => app.restart_text(),
            KeyCode::Up => app.adjust_lines_per_block(1),
            KeyCode::Down => app.adjust_lines_per_block(-1),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.close_practice(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Enter => app.commit_line(),
        KeyCode::Char(ch) => app.type_char(ch),
        _ => {}
    }
}

fn handle_summary_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.restart_text(),
        KeyCode::Enter | KeyCode::Esc => app.leave_summary(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let fill = Block::default().style(Style::default().bg(app.theme.colors.bg()));
    frame.render_widget(fill, frame.area());

    match app.screen {
        AppScreen::Library => render_library(frame, app),
        AppScreen::Practice => render_practice(frame, app),
        AppScreen::Summary => render_summary(frame, app),
    }
}

fn render_library(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let app_layout = AppLayout::new(area);

    let header_info = format!(" {} texts | {} coins", app.texts.len(), app.coins);
    render_header(frame, app_layout.header, colors, " copytype ", &header_info);

    let list = LibraryList {
        entries: &app.entries,
        selected: app.selected,
        theme: app.theme,
    };
    frame.render_widget(&list, app_layout.main);

    if let Some(sidebar) = app_layout.sidebar {
        render_profile_panel(frame, app, sidebar);
    }

    render_footer(
        frame,
        app,
        app_layout.footer,
        &[
            "[Enter] Open",
            "[j/k] Select",
            "[x] Delete",
            "[r] Refresh",
            "[q] Quit",
        ],
    );
}

fn render_profile_panel(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let profile = &app.profile;

    let accuracy_str = format!("{:.1}%", profile.mean_line_accuracy());
    let lines = vec![
        Line::from(vec![
            Span::styled("Lines typed: ", Style::default().fg(colors.fg())),
            Span::styled(
                format!("{}", profile.lines_completed),
                Style::default().fg(colors.accent()),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Avg accuracy: ", Style::default().fg(colors.fg())),
            Span::styled(accuracy_str, Style::default().fg(colors.accent())),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Texts finished: ", Style::default().fg(colors.fg())),
            Span::styled(
                format!("{}", profile.texts_completed),
                Style::default().fg(colors.accent()),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Coins: ", Style::default().fg(colors.fg())),
            Span::styled(
                format!("{}", app.coins),
                Style::default().fg(colors.warning()),
            ),
        ]),
    ];

    let block = Block::bordered()
        .title(" Profile ")
        .border_style(Style::default().fg(colors.border()))
        .style(Style::default().bg(colors.bg()));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_practice(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let Some(ref session) = app.session else {
        return;
    };
    let app_layout = AppLayout::new(area);
    let title = app
        .active_text
        .as_ref()
        .map(|(_, t)| t.as_str())
        .unwrap_or("");

    // For medium/narrow: show compact stats in the header
    if !app_layout.tier.show_sidebar() {
        let header_text = format!(
            " {title} | WPM: {} | Acc: {}% | {}%",
            session.wpm(),
            session.accuracy(),
            session.completion_percent()
        );
        render_header(frame, app_layout.header, colors, &header_text, "");
    } else {
        let padded_title = format!(" {title} ");
        let block_info = format!(" | block of {}", session.lines_per_block());
        render_header(frame, app_layout.header, colors, &padded_title, &block_info);
    }

    let typing = TypingArea::new(session, app.theme);
    frame.render_widget(typing, app_layout.main);

    if let Some(sidebar_area) = app_layout.sidebar {
        let sidebar = StatsSidebar::new(session, app.coins, app.theme);
        frame.render_widget(sidebar, sidebar_area);
    }

    render_footer(
        frame,
        app,
        app_layout.footer,
        &[
            "[Enter] Commit line",
            "[Ctrl+K] Skip block",
            "[Ctrl+S] Save",
            "[Ctrl+↑/↓] Block size",
            "[Esc] Back",
        ],
    );
}

fn render_summary(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();

    if let Some(ref summary) = app.last_summary {
        let centered = ui::layout::centered_rect(60, 70, area);
        let panel = SummaryPanel {
            summary,
            theme: app.theme,
        };
        frame.render_widget(panel, centered);
    }
}

/// Screen header: a bold title span and a dimmer info tail, both over the
/// header background.
fn render_header(
    frame: &mut ratatui::Frame,
    area: Rect,
    colors: &ThemeColors,
    title: &str,
    info: &str,
) {
    let base = Style::default().bg(colors.header_bg());
    let line = Line::from(vec![
        Span::styled(title, base.fg(colors.header_fg()).add_modifier(Modifier::BOLD)),
        Span::styled(info, base.fg(colors.text_pending())),
    ]);
    frame.render_widget(Paragraph::new(line).style(base), area);
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: Rect, hints: &[&str]) {
    let colors = &app.theme.colors;

    if app.confirm_delete {
        let title = app.selected_title().unwrap_or("");
        let prompt = format!("  delete '{title}'? [y/n]");
        let paragraph = Paragraph::new(Line::from(Span::styled(
            &*prompt,
            Style::default()
                .fg(colors.warning())
                .add_modifier(Modifier::BOLD),
        )));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some((message, _)) = &app.notice {
        let text = format!("  {message}");
        let paragraph = Paragraph::new(Line::from(Span::styled(
            &*text,
            Style::default().fg(colors.warning()),
        )));
        frame.render_widget(paragraph, area);
        return;
    }

    let lines: Vec<Line> = ui::layout::pack_hint_lines(hints, area.width as usize)
        .into_iter()
        .map(|line| Line::from(Span::styled(line, Style::default().fg(colors.accent_dim()))))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}
