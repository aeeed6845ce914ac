use std::time::{Duration, Instant};

use super::position::{start_of_line, to_position};
use super::reflow::{char_len, reflow, total_display_length};
use super::scorer::{CharMark, LineScorer, ScoreDelta};
use super::stats;

/// Where the session currently sits in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Open but untouched: no keystroke yet on the current line.
    Idle,
    /// Input buffer active or the clock running.
    Typing,
    /// A line was just committed; the next keystroke resumes typing.
    LineComplete,
    /// A block boundary was just crossed and progress persisted.
    BlockComplete,
    /// The whole text is done; input is ignored.
    Finished,
}

/// Coin amounts and the error threshold that triggers a deduction.
#[derive(Clone, Copy, Debug)]
pub struct RewardPolicy {
    pub coins_per_line: u32,
    pub coins_per_penalty: u32,
    pub penalty_threshold: u32,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            coins_per_line: 1,
            coins_per_penalty: 1,
            penalty_threshold: 10,
        }
    }
}

/// Side effects a transition wants performed. The session never talks to
/// storage itself; the host drains these after every input event and fires
/// them without blocking further typing.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEffect {
    SaveProgress { flat_index: usize },
    LineCompleted { seconds: f64, accuracy_percent: u8 },
    AwardCoins { amount: u32 },
    PenalizeCoins { amount: u32 },
    TextCompleted { final_index: usize },
}

/// Wall-clock of active practice. Starting an already-running clock is a
/// no-op, so resuming after a pause keeps the original start.
#[derive(Debug, Default)]
struct SessionClock {
    started_at: Option<Instant>,
    banked: Duration,
}

impl SessionClock {
    fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.banked += started.elapsed();
        }
    }

    fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    fn elapsed_secs(&self) -> f64 {
        let live = self.started_at.map(|s| s.elapsed()).unwrap_or_default();
        (self.banked + live).as_secs_f64()
    }
}

/// One practice run over one text.
///
/// Holds the reflowed display structure, the flat progress index anchored
/// at the start of the line being typed, the visible block window, and the
/// running totals. All mutation goes through the input methods; rendering
/// reads through the accessors.
pub struct PracticeSession {
    source: String,
    lines: Vec<String>,
    width: usize,
    lines_per_block: usize,
    block_start: usize,
    line_in_block: usize,
    flat_index: usize,
    buffer: String,
    scorer: LineScorer,
    phase: Phase,
    clock: SessionClock,
    line_started: Option<Instant>,
    total_entries: usize,
    total_errors: usize,
    total_correct: usize,
    errors_since_penalty: u32,
    rewards: RewardPolicy,
    effects: Vec<SessionEffect>,
}

impl PracticeSession {
    /// Build a session over `source`, resuming at `resume_index`. An index
    /// at or past the end of the recomputed structure opens the session
    /// already finished rather than failing.
    pub fn new(
        source: &str,
        resume_index: usize,
        width: usize,
        lines_per_block: usize,
        rewards: RewardPolicy,
    ) -> Self {
        let width = width.max(1);
        let lines = reflow(source, width);
        let mut session = Self {
            source: source.to_string(),
            lines,
            width,
            lines_per_block: lines_per_block.max(1),
            block_start: 0,
            line_in_block: 0,
            flat_index: 0,
            buffer: String::new(),
            scorer: LineScorer::new(""),
            phase: Phase::Idle,
            clock: SessionClock::default(),
            line_started: None,
            total_entries: 0,
            total_errors: 0,
            total_correct: 0,
            errors_since_penalty: 0,
            rewards,
            effects: Vec::new(),
        };
        session.anchor(resume_index);
        session
    }

    /// Feed one printable character into the buffer.
    pub fn type_char(&mut self, c: char) {
        if self.phase == Phase::Finished || c == '\n' || c == '\r' {
            return;
        }
        self.clock.start();
        if self.line_started.is_none() {
            self.line_started = Some(Instant::now());
        }
        self.buffer.push(c);
        let delta = self.scorer.evaluate(&self.buffer);
        self.apply_delta(delta);
        self.phase = Phase::Typing;
    }

    /// Delete the last buffered character. Totals are untouched.
    pub fn backspace(&mut self) {
        if self.phase == Phase::Finished || self.buffer.is_empty() {
            return;
        }
        self.buffer.pop();
        self.scorer.evaluate(&self.buffer);
    }

    /// Explicit line submission. Succeeds only when the buffer matches the
    /// current line exactly; any mismatch leaves the session untouched.
    pub fn commit(&mut self) -> bool {
        if self.phase == Phase::Finished || !self.scorer.is_complete() {
            return false;
        }
        let seconds = self
            .line_started
            .take()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.effects.push(SessionEffect::LineCompleted {
            seconds,
            accuracy_percent: self.scorer.accuracy(),
        });
        self.effects.push(SessionEffect::AwardCoins {
            amount: self.rewards.coins_per_line,
        });
        if self.line_in_block + 1 < self.block_len() {
            self.line_in_block += 1;
            self.flat_index = start_of_line(self.block_start + self.line_in_block, &self.lines);
            self.load_current_line();
            self.phase = Phase::LineComplete;
        } else {
            self.advance_block();
        }
        true
    }

    /// Jump to the start of the next block without scoring the current one.
    pub fn skip(&mut self) {
        if self.phase == Phase::Finished {
            return;
        }
        self.block_start += self.block_len().max(1);
        self.line_in_block = 0;
        if self.block_start >= self.lines.len() {
            self.finish();
            return;
        }
        self.flat_index = start_of_line(self.block_start, &self.lines);
        self.load_current_line();
        self.phase = if self.clock.is_running() {
            Phase::Typing
        } else {
            Phase::Idle
        };
        self.effects.push(SessionEffect::SaveProgress {
            flat_index: self.flat_index,
        });
    }

    /// Re-derive the display structure for a new target width. The flat
    /// index keeps its value; only its (line, offset) reading changes.
    pub fn resize(&mut self, new_width: usize) {
        let new_width = new_width.max(1);
        if new_width == self.width {
            return;
        }
        self.width = new_width;
        self.reanchor();
    }

    /// Change how many lines are shown per block, re-anchoring the visible
    /// window at the line containing the current index.
    pub fn set_lines_per_block(&mut self, lines_per_block: usize) {
        let clamped = lines_per_block.max(1);
        if clamped == self.lines_per_block {
            return;
        }
        self.lines_per_block = clamped;
        self.reanchor();
    }

    /// Called when a coin deduction failed downstream, so the threshold
    /// fires again on the next error instead of being silently swallowed.
    pub fn restore_penalty_counter(&mut self) {
        self.errors_since_penalty = self.rewards.penalty_threshold;
    }

    /// Effects accumulated since the last drain, in the order they arose.
    pub fn take_effects(&mut self) -> Vec<SessionEffect> {
        std::mem::take(&mut self.effects)
    }

    fn apply_delta(&mut self, delta: ScoreDelta) {
        self.total_entries += delta.new_entries;
        self.total_errors += delta.new_errors;
        self.total_correct += delta.new_entries - delta.new_errors;
        if delta.new_errors > 0 {
            self.errors_since_penalty += delta.new_errors as u32;
            if self.errors_since_penalty >= self.rewards.penalty_threshold.max(1) {
                self.effects.push(SessionEffect::PenalizeCoins {
                    amount: self.rewards.coins_per_penalty,
                });
                self.errors_since_penalty = 0;
            }
        }
    }

    /// Position the session at `flat`, or open it finished when the index
    /// is at or past the end of the structure.
    fn anchor(&mut self, flat: usize) {
        let total = total_display_length(&self.lines);
        if flat >= total {
            self.enter_finished();
            return;
        }
        self.flat_index = flat;
        self.block_start = to_position(flat, &self.lines).line;
        self.line_in_block = 0;
        self.load_current_line();
    }

    fn reanchor(&mut self) {
        self.lines = reflow(&self.source, self.width);
        if self.phase == Phase::Finished {
            self.enter_finished();
            return;
        }
        let total = total_display_length(&self.lines);
        if self.flat_index >= total {
            // The new structure is shorter than the saved point.
            self.enter_finished();
            return;
        }
        self.block_start = to_position(self.flat_index, &self.lines).line;
        self.line_in_block = 0;
        self.load_current_line();
        self.phase = if self.clock.is_running() {
            Phase::Typing
        } else {
            Phase::Idle
        };
    }

    fn advance_block(&mut self) {
        self.block_start += self.block_len().max(1);
        self.line_in_block = 0;
        if self.block_start >= self.lines.len() {
            self.finish();
            return;
        }
        self.flat_index = start_of_line(self.block_start, &self.lines);
        self.load_current_line();
        self.phase = Phase::BlockComplete;
        self.effects.push(SessionEffect::SaveProgress {
            flat_index: self.flat_index,
        });
    }

    /// Completion reached through play: persist and announce.
    fn finish(&mut self) {
        self.enter_finished();
        self.effects.push(SessionEffect::SaveProgress {
            flat_index: self.flat_index,
        });
        self.effects.push(SessionEffect::TextCompleted {
            final_index: self.flat_index,
        });
    }

    /// Terminal state without the completion effects, for sessions that
    /// open already at the end.
    fn enter_finished(&mut self) {
        self.block_start = self.lines.len();
        self.line_in_block = 0;
        self.flat_index = total_display_length(&self.lines);
        self.buffer.clear();
        self.scorer.reset("");
        self.line_started = None;
        self.clock.stop();
        self.phase = Phase::Finished;
    }

    fn load_current_line(&mut self) {
        let idx = self.block_start + self.line_in_block;
        let target = self.lines.get(idx).cloned().unwrap_or_default();
        self.scorer.reset(&target);
        self.buffer.clear();
        self.line_started = None;
    }

    fn block_len(&self) -> usize {
        self.lines
            .len()
            .saturating_sub(self.block_start)
            .min(self.lines_per_block)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn flat_index(&self) -> usize {
        self.flat_index
    }

    pub fn total_len(&self) -> usize {
        total_display_length(&self.lines)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn lines_per_block(&self) -> usize {
        self.lines_per_block
    }

    /// The lines of the visible block, empty once finished.
    pub fn block_lines(&self) -> &[String] {
        let end = self.block_start + self.block_len();
        &self.lines[self.block_start..end]
    }

    /// Index of the active line within the visible block.
    pub fn active_line_in_block(&self) -> usize {
        self.line_in_block
    }

    pub fn current_line(&self) -> &str {
        self.lines
            .get(self.block_start + self.line_in_block)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Marks for the active line, one per target character.
    pub fn marks(&self) -> &[CharMark] {
        self.scorer.marks()
    }

    /// Cursor slot within the active line, clamped to its length.
    pub fn cursor_in_line(&self) -> usize {
        char_len(&self.buffer).min(self.scorer.comparable_len())
    }

    /// Characters typed past the end of the active line.
    pub fn overflow_text(&self) -> String {
        self.buffer
            .chars()
            .skip(self.scorer.comparable_len())
            .collect()
    }

    /// Whether the active line's buffer fully matches its target.
    pub fn line_ready(&self) -> bool {
        self.scorer.is_complete()
    }

    /// Whether the visible block contains the last line of the text.
    pub fn is_last_block(&self) -> bool {
        self.block_start + self.block_len() >= self.lines.len()
    }

    pub fn line_accuracy(&self) -> u8 {
        self.scorer.accuracy()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.clock.elapsed_secs()
    }

    pub fn entries(&self) -> usize {
        self.total_entries
    }

    pub fn errors(&self) -> usize {
        self.total_errors
    }

    pub fn wpm(&self) -> u32 {
        stats::wpm(self.total_correct, self.elapsed_secs())
    }

    pub fn accuracy(&self) -> u8 {
        stats::accuracy(self.total_entries, self.total_errors)
    }

    pub fn completion_percent(&self) -> u8 {
        stats::completion_percent(self.flat_index, self.total_len(), &self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOX: &str = "The quick brown fox";

    fn session(source: &str, resume: usize, width: usize, lines_per_block: usize) -> PracticeSession {
        PracticeSession::new(source, resume, width, lines_per_block, RewardPolicy::default())
    }

    fn type_str(s: &mut PracticeSession, text: &str) {
        for c in text.chars() {
            s.type_char(c);
        }
    }

    #[test]
    fn test_new_session_layout() {
        let s = session(FOX, 0, 10, 2);
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.flat_index(), 0);
        assert_eq!(s.total_len(), 19);
        assert_eq!(s.block_lines(), &["The quick", "brown fox"]);
        assert_eq!(s.current_line(), "The quick");
        assert_eq!(s.completion_percent(), 0);
    }

    #[test]
    fn test_commit_rejects_incomplete_buffer() {
        let mut s = session(FOX, 0, 10, 2);
        type_str(&mut s, "The");
        assert!(!s.commit());
        assert_eq!(s.buffer(), "The");
        assert_eq!(s.flat_index(), 0);
        assert!(s.take_effects().is_empty());
    }

    #[test]
    fn test_commit_advances_line_and_index() {
        let mut s = session(FOX, 0, 10, 2);
        type_str(&mut s, "The quick");
        assert!(s.commit());
        assert_eq!(s.phase(), Phase::LineComplete);
        assert_eq!(s.flat_index(), 10);
        assert_eq!(s.current_line(), "brown fox");
        assert_eq!(s.buffer(), "");

        let effects = s.take_effects();
        assert_eq!(effects.len(), 2);
        assert!(matches!(
            effects[0],
            SessionEffect::LineCompleted {
                accuracy_percent: 100,
                ..
            }
        ));
        assert_eq!(effects[1], SessionEffect::AwardCoins { amount: 1 });
    }

    #[test]
    fn test_finishing_the_text() {
        let mut s = session(FOX, 0, 10, 2);
        type_str(&mut s, "The quick");
        s.commit();
        s.take_effects();
        type_str(&mut s, "brown fox");
        assert!(s.commit());
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.flat_index(), 19);
        assert_eq!(s.completion_percent(), 100);

        let effects = s.take_effects();
        assert_eq!(effects.len(), 4);
        assert_eq!(effects[2], SessionEffect::SaveProgress { flat_index: 19 });
        assert_eq!(effects[3], SessionEffect::TextCompleted { final_index: 19 });

        // Input after the end changes nothing.
        s.type_char('x');
        assert_eq!(s.buffer(), "");
        assert_eq!(s.phase(), Phase::Finished);
    }

    #[test]
    fn test_block_advance_persists_progress() {
        // Five lines of one word each at width 5, two per block.
        let mut s = session("aa bb cc dd ee", 0, 5, 2);
        assert_eq!(s.block_lines(), &["aa bb", "cc dd"]);
        type_str(&mut s, "aa bb");
        s.commit();
        type_str(&mut s, "cc dd");
        s.commit();
        assert_eq!(s.phase(), Phase::BlockComplete);
        assert_eq!(s.block_lines(), &["ee"]);
        assert_eq!(s.flat_index(), 12);
        let effects = s.take_effects();
        assert!(effects.contains(&SessionEffect::SaveProgress { flat_index: 12 }));
    }

    #[test]
    fn test_skip_advances_without_scoring() {
        let mut s = session("aa bb cc dd ee", 0, 5, 2);
        type_str(&mut s, "aa");
        s.take_effects();
        s.skip();
        assert_eq!(s.block_lines(), &["ee"]);
        assert_eq!(s.flat_index(), 12);
        assert_eq!(s.buffer(), "");
        let effects = s.take_effects();
        assert_eq!(effects, vec![SessionEffect::SaveProgress { flat_index: 12 }]);

        // Skipping the last block ends the text.
        s.skip();
        assert_eq!(s.phase(), Phase::Finished);
        let effects = s.take_effects();
        assert!(matches!(effects.last(), Some(SessionEffect::TextCompleted { .. })));
    }

    #[test]
    fn test_penalty_fires_at_threshold() {
        let rewards = RewardPolicy {
            penalty_threshold: 3,
            ..RewardPolicy::default()
        };
        let mut s = PracticeSession::new(FOX, 0, 10, 2, rewards);
        type_str(&mut s, "xxx");
        let effects = s.take_effects();
        assert_eq!(effects, vec![SessionEffect::PenalizeCoins { amount: 1 }]);

        // Counter restarted: two more errors stay under the threshold.
        type_str(&mut s, "xx");
        assert!(s.take_effects().is_empty());
    }

    #[test]
    fn test_penalty_rollback_refires_on_next_error() {
        let rewards = RewardPolicy {
            penalty_threshold: 2,
            ..RewardPolicy::default()
        };
        let mut s = PracticeSession::new(FOX, 0, 10, 2, rewards);
        type_str(&mut s, "xx");
        assert_eq!(
            s.take_effects(),
            vec![SessionEffect::PenalizeCoins { amount: 1 }]
        );
        s.restore_penalty_counter();
        s.type_char('x');
        assert_eq!(
            s.take_effects(),
            vec![SessionEffect::PenalizeCoins { amount: 1 }]
        );
    }

    #[test]
    fn test_resume_mid_text() {
        let s = session(FOX, 10, 10, 2);
        assert_eq!(s.flat_index(), 10);
        assert_eq!(s.current_line(), "brown fox");
        assert_eq!(s.completion_percent(), 53);
    }

    #[test]
    fn test_resume_past_end_clamps_to_finished() {
        let mut s = session(FOX, 99, 10, 2);
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.flat_index(), 19);
        assert_eq!(s.completion_percent(), 100);
        // Opening at the end is not a fresh completion.
        assert!(s.take_effects().is_empty());
    }

    #[test]
    fn test_resize_preserves_flat_index() {
        let mut s = session(FOX, 0, 10, 2);
        type_str(&mut s, "The quick");
        s.commit();
        assert_eq!(s.flat_index(), 10);

        s.resize(40);
        assert_eq!(s.flat_index(), 10);
        assert_eq!(s.block_lines(), &[FOX]);
        assert_eq!(s.buffer(), "");
        assert_eq!(s.completion_percent(), 53);
    }

    #[test]
    fn test_lines_per_block_change_reanchors() {
        let mut s = session("aa bb cc dd ee", 0, 5, 2);
        type_str(&mut s, "aa bb");
        s.commit();
        assert_eq!(s.current_line(), "cc dd");
        s.set_lines_per_block(1);
        assert_eq!(s.block_lines(), &["cc dd"]);
        assert_eq!(s.flat_index(), 6);
    }

    #[test]
    fn test_empty_line_commits_with_empty_buffer() {
        let mut s = session("a\n\nb", 0, 5, 3);
        assert_eq!(s.block_lines(), &["a", "", "b"]);
        s.type_char('a');
        assert!(s.commit());
        // The blank middle line needs no keystrokes.
        assert!(s.commit());
        s.type_char('b');
        assert!(s.commit());
        assert_eq!(s.phase(), Phase::Finished);

        let lines_done = s
            .take_effects()
            .iter()
            .filter(|e| matches!(e, SessionEffect::LineCompleted { .. }))
            .count();
        assert_eq!(lines_done, 3);
    }

    #[test]
    fn test_whitespace_only_source_opens_finished() {
        let s = session("   \n ", 0, 10, 3);
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.completion_percent(), 100);
    }

    #[test]
    fn test_global_counters_accumulate_across_lines() {
        let mut s = session(FOX, 0, 10, 2);
        type_str(&mut s, "Thx");
        s.backspace();
        type_str(&mut s, "e quick");
        s.commit();
        // 10 entries total (3 + 7), one of them wrong.
        assert_eq!(s.accuracy(), 90);
        assert!(s.elapsed_secs() >= 0.0);
    }

    #[test]
    fn test_newline_input_ignored() {
        let mut s = session(FOX, 0, 10, 2);
        s.type_char('\n');
        assert_eq!(s.buffer(), "");
        assert_eq!(s.phase(), Phase::Idle);
    }
}
