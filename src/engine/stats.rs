/// One "word" is five characters, the convention every typing tool shares.
pub const CHARS_PER_WORD: usize = 5;

/// Words per minute from correctly typed characters and elapsed wall time.
/// Integer result, rounded half-up, so displayed and persisted values agree.
pub fn wpm(correct_chars: usize, elapsed_secs: f64) -> u32 {
    if elapsed_secs <= 0.0 || correct_chars == 0 {
        return 0;
    }
    let words = correct_chars as f64 / CHARS_PER_WORD as f64;
    (words / (elapsed_secs / 60.0)).round() as u32
}

/// Accuracy percent from total keystroke entries and accumulated errors.
/// No entries yet means a clean slate, reported as 100.
pub fn accuracy(entries: usize, errors: usize) -> u8 {
    if entries == 0 {
        return 100;
    }
    let correct = entries.saturating_sub(errors);
    (100.0 * correct as f64 / entries as f64).round() as u8
}

/// Percent of the display structure covered by `flat_index`.
///
/// A zero-length structure is fully complete when the source never had
/// typeable content (all whitespace), and untouched otherwise.
pub fn completion_percent(flat_index: usize, total_len: usize, source: &str) -> u8 {
    if total_len == 0 {
        return if source.trim().is_empty() { 100 } else { 0 };
    }
    let capped = flat_index.min(total_len);
    (100.0 * capped as f64 / total_len as f64).round().min(100.0) as u8
}
