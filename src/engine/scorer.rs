use std::collections::HashSet;

use super::stats;

/// Per-slot verdict after comparing the input buffer against the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharMark {
    /// Not reached by the input yet.
    Pending,
    /// Typed and matching.
    Correct,
    /// Typed and wrong.
    Incorrect,
    /// Newline slot in a multi-line target. Zero width: consumes no input
    /// and is never compared, so it cannot be an error.
    Placeholder,
}

/// What one evaluation added to the running totals. Only characters typed
/// since the previous evaluation are counted; deleting never subtracts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreDelta {
    pub new_entries: usize,
    pub new_errors: usize,
}

/// Scores an input buffer against one target line (or a whole block when
/// the target carries newline placeholders).
///
/// Every evaluation re-derives all marks from the full buffer, so state
/// can never drift from what is on screen. Error positions are sticky: a
/// slot that was ever mistyped stays in the error set even after the
/// mistake is erased, which is what per-line accuracy is charged against.
pub struct LineScorer {
    target: Vec<char>,
    /// Target minus placeholder slots; input position j lines up with
    /// `comparable[j]`.
    comparable: Vec<char>,
    typed: Vec<char>,
    marks: Vec<CharMark>,
    ever_wrong: HashSet<usize>,
    entries: usize,
}

impl LineScorer {
    pub fn new(target: &str) -> Self {
        let target: Vec<char> = target.chars().collect();
        let comparable: Vec<char> = target.iter().copied().filter(|&c| c != '\n').collect();
        let marks = target
            .iter()
            .map(|&c| {
                if c == '\n' {
                    CharMark::Placeholder
                } else {
                    CharMark::Pending
                }
            })
            .collect();
        Self {
            target,
            comparable,
            typed: Vec::new(),
            marks,
            ever_wrong: HashSet::new(),
            entries: 0,
        }
    }

    /// Swap in a new target and drop all per-line scoring state.
    pub fn reset(&mut self, target: &str) {
        *self = Self::new(target);
    }

    /// Re-evaluate the whole buffer after an input event.
    pub fn evaluate(&mut self, input: &str) -> ScoreDelta {
        let prev_len = self.typed.len();
        self.typed = input.chars().collect();

        let mut cursor = 0usize;
        for (slot, &expected) in self.target.iter().enumerate() {
            if expected == '\n' {
                self.marks[slot] = CharMark::Placeholder;
                continue;
            }
            self.marks[slot] = match self.typed.get(cursor) {
                None => CharMark::Pending,
                Some(&c) if c == expected => CharMark::Correct,
                Some(_) => CharMark::Incorrect,
            };
            cursor += 1;
        }

        for position in 0..self.typed.len() {
            if self.is_wrong_at(position) {
                self.ever_wrong.insert(position);
            }
        }

        let mut delta = ScoreDelta::default();
        if self.typed.len() > prev_len {
            delta.new_entries = self.typed.len() - prev_len;
            delta.new_errors = (prev_len..self.typed.len())
                .filter(|&position| self.is_wrong_at(position))
                .count();
            self.entries += delta.new_entries;
        }
        delta
    }

    /// An input position is wrong when it overruns the target or mismatches
    /// the character expected there.
    fn is_wrong_at(&self, position: usize) -> bool {
        match self.comparable.get(position) {
            None => true,
            Some(&expected) => self.typed[position] != expected,
        }
    }

    /// Length of the uninterrupted correct prefix of the buffer.
    /// Placeholder slots neither extend nor break it.
    pub fn correct_len(&self) -> usize {
        self.typed
            .iter()
            .zip(self.comparable.iter())
            .take_while(|(typed, expected)| typed == expected)
            .count()
    }

    /// The buffer matches the target exactly, no more and no less.
    pub fn is_complete(&self) -> bool {
        self.typed == self.comparable
    }

    /// Characters typed past the end of the target, always errors.
    pub fn overflow_len(&self) -> usize {
        self.typed.len().saturating_sub(self.comparable.len())
    }

    /// One mark per target slot, in display order.
    pub fn marks(&self) -> &[CharMark] {
        &self.marks
    }

    /// Count of positions that were ever mistyped.
    pub fn error_count(&self) -> usize {
        self.ever_wrong.len()
    }

    /// Keystrokes charged against this target so far.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Accuracy for this line alone, from sticky error positions.
    pub fn accuracy(&self) -> u8 {
        stats::accuracy(self.entries, self.ever_wrong.len())
    }

    /// Number of comparable (typeable) characters in the target.
    pub fn comparable_len(&self) -> usize {
        self.comparable.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_target_all_pending() {
        let scorer = LineScorer::new("abc");
        assert_eq!(
            scorer.marks(),
            &[CharMark::Pending, CharMark::Pending, CharMark::Pending]
        );
        assert_eq!(scorer.correct_len(), 0);
        assert!(!scorer.is_complete());
        assert_eq!(scorer.accuracy(), 100);
    }

    #[test]
    fn test_correct_typing_accumulates() {
        let mut scorer = LineScorer::new("abc");
        assert_eq!(
            scorer.evaluate("a"),
            ScoreDelta {
                new_entries: 1,
                new_errors: 0
            }
        );
        assert_eq!(
            scorer.evaluate("ab"),
            ScoreDelta {
                new_entries: 1,
                new_errors: 0
            }
        );
        assert_eq!(scorer.correct_len(), 2);
        scorer.evaluate("abc");
        assert!(scorer.is_complete());
        assert_eq!(scorer.entries(), 3);
        assert_eq!(scorer.error_count(), 0);
        assert_eq!(scorer.accuracy(), 100);
    }

    #[test]
    fn test_wrong_char_breaks_prefix_and_sticks() {
        let mut scorer = LineScorer::new("abc");
        scorer.evaluate("a");
        let delta = scorer.evaluate("ax");
        assert_eq!(delta.new_errors, 1);
        assert_eq!(scorer.marks()[1], CharMark::Incorrect);
        assert_eq!(scorer.correct_len(), 1);

        // Erasing the mistake recomputes the mark but not the error set.
        scorer.evaluate("a");
        assert_eq!(scorer.marks()[1], CharMark::Pending);
        assert_eq!(scorer.error_count(), 1);

        // Retyping it correctly is a fresh entry; the old error remains.
        let delta = scorer.evaluate("ab");
        assert_eq!(delta.new_entries, 1);
        assert_eq!(delta.new_errors, 0);
        assert_eq!(scorer.marks()[1], CharMark::Correct);
        assert_eq!(scorer.error_count(), 1);
        assert_eq!(scorer.entries(), 3);
        // 3 entries, 1 sticky error: 67 percent.
        assert_eq!(scorer.accuracy(), 67);
    }

    #[test]
    fn test_same_position_mistyped_twice() {
        let mut scorer = LineScorer::new("ab");
        scorer.evaluate("a");
        assert_eq!(scorer.evaluate("ax").new_errors, 1);
        scorer.evaluate("a");
        // A second miss at the same slot is a new entry and a new error
        // for the running totals, but only one sticky position.
        let delta = scorer.evaluate("ay");
        assert_eq!(delta.new_entries, 1);
        assert_eq!(delta.new_errors, 1);
        assert_eq!(scorer.error_count(), 1);
        assert_eq!(scorer.entries(), 3);
    }

    #[test]
    fn test_backspace_adds_nothing() {
        let mut scorer = LineScorer::new("abc");
        scorer.evaluate("ab");
        let delta = scorer.evaluate("a");
        assert_eq!(delta, ScoreDelta::default());
        assert_eq!(scorer.entries(), 2);
    }

    #[test]
    fn test_overflow_is_error() {
        let mut scorer = LineScorer::new("ab");
        scorer.evaluate("ab");
        assert!(scorer.is_complete());
        let delta = scorer.evaluate("abz");
        assert_eq!(delta.new_errors, 1);
        assert_eq!(scorer.overflow_len(), 1);
        assert!(!scorer.is_complete());
        assert_eq!(scorer.error_count(), 1);

        // Deleting the overflow restores completion; the error stays.
        scorer.evaluate("ab");
        assert!(scorer.is_complete());
        assert_eq!(scorer.error_count(), 1);
    }

    #[test]
    fn test_empty_target_only_completes_empty() {
        let mut scorer = LineScorer::new("");
        assert!(scorer.is_complete());
        let delta = scorer.evaluate("x");
        assert_eq!(delta.new_errors, 1);
        assert!(!scorer.is_complete());
        scorer.evaluate("");
        assert!(scorer.is_complete());
    }

    #[test]
    fn test_placeholder_slots_are_skipped() {
        let mut scorer = LineScorer::new("ab\ncd");
        assert_eq!(scorer.comparable_len(), 4);
        assert_eq!(scorer.marks()[2], CharMark::Placeholder);

        scorer.evaluate("abc");
        assert_eq!(
            scorer.marks(),
            &[
                CharMark::Correct,
                CharMark::Correct,
                CharMark::Placeholder,
                CharMark::Correct,
                CharMark::Pending,
            ]
        );
        // Placeholders do not count toward the prefix length.
        assert_eq!(scorer.correct_len(), 3);

        scorer.evaluate("abcd");
        assert!(scorer.is_complete());
        assert_eq!(scorer.error_count(), 0);
    }

    #[test]
    fn test_multibyte_characters_compare_by_char() {
        let mut scorer = LineScorer::new("café");
        scorer.evaluate("café");
        assert!(scorer.is_complete());
        assert_eq!(scorer.entries(), 4);
    }

    #[test]
    fn test_reset_clears_per_line_state() {
        let mut scorer = LineScorer::new("ab");
        scorer.evaluate("ax");
        assert_eq!(scorer.error_count(), 1);
        scorer.reset("xy");
        assert_eq!(scorer.error_count(), 0);
        assert_eq!(scorer.entries(), 0);
        assert_eq!(scorer.marks(), &[CharMark::Pending, CharMark::Pending]);
    }
}
