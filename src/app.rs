use std::time::{Duration, Instant};

use anyhow::Result;
use ratatui::layout::Rect;

use crate::config::Config;
use crate::engine::{self, PracticeSession, SessionEffect, estimate_columns};
use crate::store::{
    JsonStore, ProfileData, ProgressStore, RewardDebit, StoreError, TextId, TextRecord,
};
use crate::ui::components::{LibraryEntry, TextSummary};
use crate::ui::layout::{self, AppLayout};
use crate::ui::theme::Theme;

const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Library,
    Practice,
    Summary,
}

pub struct App {
    pub screen: AppScreen,
    pub config: Config,
    pub theme: &'static Theme,
    pub store: JsonStore,
    pub texts: Vec<TextRecord>,
    pub entries: Vec<LibraryEntry>,
    pub selected: usize,
    pub confirm_delete: bool,
    pub session: Option<PracticeSession>,
    pub active_text: Option<(TextId, String)>,
    pub profile: ProfileData,
    pub coins: u64,
    pub session_coins_earned: u64,
    pub last_summary: Option<TextSummary>,
    pub notice: Option<(String, Instant)>,
    pub should_quit: bool,
    typing_width: usize,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = Config::load().unwrap_or_default();
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));

        let store = JsonStore::new()?;
        let profile = store.load_profile()?;
        let coins = profile.coins;

        let mut app = Self {
            screen: AppScreen::Library,
            config,
            theme,
            store,
            texts: Vec::new(),
            entries: Vec::new(),
            selected: 0,
            confirm_delete: false,
            session: None,
            active_text: None,
            profile,
            coins,
            session_coins_earned: 0,
            last_summary: None,
            notice: None,
            should_quit: false,
            typing_width: 0,
        };
        app.handle_resize(80, 24);
        app.refresh_library();
        Ok(app)
    }

    pub fn typing_width(&self) -> usize {
        self.typing_width
    }

    /// Re-estimate the typing column budget from the terminal size and
    /// reflow the running session if the budget changed.
    pub fn handle_resize(&mut self, width: u16, height: u16) {
        let area = Rect::new(0, 0, width, height);
        let app_layout = AppLayout::new(area);
        let cells = layout::typing_cells(app_layout.main);
        let columns = estimate_columns(cells, self.config.width_policy());
        if columns == self.typing_width {
            return;
        }
        self.typing_width = columns;
        if let Some(session) = self.session.as_mut() {
            session.resize(columns);
        }
    }

    pub fn refresh_library(&mut self) {
        // Best-effort reload; errors keep the cached profile
        if let Ok(profile) = self.store.load_profile() {
            self.coins = profile.coins;
            self.profile = profile;
        }
        match self.store.list_texts() {
            Ok(texts) => {
                let entries: Vec<LibraryEntry> =
                    texts.iter().map(|r| self.library_entry(r)).collect();
                self.texts = texts;
                self.entries = entries;
                if self.selected >= self.texts.len() {
                    self.selected = self.texts.len().saturating_sub(1);
                }
            }
            Err(err) => self.set_notice(format!("library load failed: {err}")),
        }
    }

    fn library_entry(&self, record: &TextRecord) -> LibraryEntry {
        let percent = match self.store.load_text(&record.id) {
            Ok(stored) => {
                let lines = engine::reflow(&stored.content, self.typing_width);
                let total = engine::total_display_length(&lines);
                engine::stats::completion_percent(record.progress_index, total, &stored.content)
            }
            Err(_) => 0,
        };
        LibraryEntry {
            title: record.title.clone(),
            completion_percent: percent,
            times_completed: record.times_completed,
        }
    }

    pub fn select_next(&mut self) {
        if !self.texts.is_empty() {
            self.selected = (self.selected + 1) % self.texts.len();
        }
    }

    pub fn select_prev(&mut self) {
        if self.texts.is_empty() {
            return;
        }
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.texts.len() - 1;
        }
    }

    pub fn open_selected(&mut self) {
        let Some(record) = self.texts.get(self.selected) else {
            return;
        };
        let id = record.id.clone();
        self.open_text(&id);
    }

    fn open_text(&mut self, id: &TextId) {
        match self.store.load_text(id) {
            Ok(stored) => {
                let session = PracticeSession::new(
                    &stored.content,
                    stored.progress_index,
                    self.typing_width,
                    self.config.lines_per_block,
                    self.config.reward_policy(),
                );
                self.session = Some(session);
                self.active_text = Some((stored.id, stored.title));
                self.session_coins_earned = 0;
                self.last_summary = None;
                self.screen = AppScreen::Practice;
            }
            Err(err) => self.set_notice(format!("open failed: {err}")),
        }
    }

    pub fn type_char(&mut self, ch: char) {
        if let Some(session) = self.session.as_mut() {
            session.type_char(ch);
            self.dispatch_effects();
        }
    }

    pub fn backspace(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.backspace();
            self.dispatch_effects();
        }
    }

    pub fn commit_line(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.commit();
            self.dispatch_effects();
        }
    }

    pub fn skip_block(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.skip();
            self.dispatch_effects();
        }
    }

    pub fn adjust_lines_per_block(&mut self, delta: i32) {
        let current = self.config.lines_per_block as i32;
        let next = (current + delta).clamp(1, 10) as usize;
        if next == self.config.lines_per_block {
            return;
        }
        self.config.lines_per_block = next;
        if let Some(session) = self.session.as_mut() {
            session.set_lines_per_block(next);
        }
        if let Err(err) = self.config.save() {
            self.set_notice(format!("config save failed: {err}"));
        }
    }

    pub fn manual_save(&mut self) {
        let index = self.session.as_ref().map(PracticeSession::flat_index);
        let id = self.active_text.as_ref().map(|(id, _)| id.clone());
        if let (Some(index), Some(id)) = (index, id) {
            match self.store.save_progress(&id, index) {
                Ok(()) => self.set_notice("progress saved".to_string()),
                Err(err) => self.set_notice(format!("save failed: {err}")),
            }
        }
    }

    /// Leave the practice screen, persisting the anchor of an unfinished
    /// run. A finished run was already saved by its completion effects.
    pub fn close_practice(&mut self) {
        let mut save_err = None;
        if let (Some(session), Some((id, _))) =
            (self.session.as_ref(), self.active_text.as_ref())
        {
            if !session.is_finished() {
                save_err = self.store.save_progress(id, session.flat_index()).err();
            }
        }
        if let Some(err) = save_err {
            self.set_notice(format!("save failed: {err}"));
        }
        self.session = None;
        self.active_text = None;
        self.refresh_library();
        self.screen = AppScreen::Library;
    }

    /// Reset the active text to the beginning and reopen it.
    pub fn restart_text(&mut self) {
        let Some((id, _)) = self.active_text.clone() else {
            self.close_practice();
            return;
        };
        if let Err(err) = self.store.save_progress(&id, 0) {
            self.set_notice(format!("reset failed: {err}"));
            return;
        }
        self.open_text(&id);
    }

    pub fn request_delete(&mut self) {
        if !self.texts.is_empty() {
            self.confirm_delete = true;
        }
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = false;
    }

    pub fn confirm_delete_selected(&mut self) {
        self.confirm_delete = false;
        let Some(record) = self.texts.get(self.selected) else {
            return;
        };
        let id = record.id.clone();
        match self.store.remove_text(&id) {
            Ok(()) => {
                self.set_notice("text removed".to_string());
                self.refresh_library();
            }
            Err(err) => self.set_notice(format!("remove failed: {err}")),
        }
    }

    pub fn selected_title(&self) -> Option<&str> {
        self.texts.get(self.selected).map(|r| r.title.as_str())
    }

    pub fn set_notice(&mut self, message: String) {
        self.notice = Some((message, Instant::now()));
    }

    pub fn tick(&mut self) {
        if let Some((_, at)) = &self.notice {
            if at.elapsed() >= NOTICE_TTL {
                self.notice = None;
            }
        }
    }

    /// Drain queued session effects and fire each against the store.
    /// Store failures surface as notices; typing is never blocked on them.
    fn dispatch_effects(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let effects = session.take_effects();
        if effects.is_empty() {
            return;
        }
        let Some((id, _)) = self.active_text.clone() else {
            return;
        };
        for effect in effects {
            if let Err(err) = self.apply_effect(&id, effect) {
                self.set_notice(format!("store error: {err}"));
            }
        }
    }

    fn apply_effect(&mut self, id: &TextId, effect: SessionEffect) -> Result<(), StoreError> {
        match effect {
            SessionEffect::SaveProgress { flat_index } => {
                self.store.save_progress(id, flat_index)
            }
            SessionEffect::LineCompleted {
                seconds,
                accuracy_percent,
            } => self.store.record_line_completion(seconds, accuracy_percent),
            SessionEffect::AwardCoins { amount } => {
                let balance = self.store.increment_reward(amount)?;
                self.coins = balance;
                self.session_coins_earned += u64::from(amount);
                Ok(())
            }
            SessionEffect::PenalizeCoins { amount } => {
                // Nothing to debit; the penalty counter stays reset
                if self.coins == 0 {
                    return Ok(());
                }
                match self.store.decrement_reward(amount) {
                    Ok(RewardDebit::Applied(balance)) => {
                        self.coins = balance;
                        Ok(())
                    }
                    Ok(RewardDebit::AlreadyZero) => Ok(()),
                    Err(err) => {
                        // Debit never happened, so arm the penalty again
                        if let Some(session) = self.session.as_mut() {
                            session.restore_penalty_counter();
                        }
                        Err(err)
                    }
                }
            }
            SessionEffect::TextCompleted { final_index: _ } => {
                self.capture_summary();
                self.screen = AppScreen::Summary;
                self.store.record_text_completion(id)
            }
        }
    }

    fn capture_summary(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some((_, title)) = self.active_text.as_ref() else {
            return;
        };
        self.last_summary = Some(TextSummary {
            title: title.clone(),
            wpm: session.wpm(),
            accuracy: session.accuracy(),
            entries: session.entries(),
            errors: session.errors(),
            elapsed_secs: session.elapsed_secs(),
            coins_earned: self.session_coins_earned,
        });
    }

    /// Back to the library from the summary screen.
    pub fn leave_summary(&mut self) {
        self.session = None;
        self.active_text = None;
        self.refresh_library();
        self.screen = AppScreen::Library;
    }
}
