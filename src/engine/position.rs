use super::reflow::{char_len, total_display_length};

/// A location in the display structure: which line, and how many characters
/// into it. `offset` may equal the line length, meaning "just past the end".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub offset: usize,
}

/// Map a flat index into (line, offset) by walking line spans.
///
/// Each line occupies `len` slots followed by one separator slot, except
/// the last. An index landing on a line's separator resolves to that line
/// with `offset == len`, so `start_of_line(pos.line) + pos.offset`
/// reconstructs every in-range index exactly; the next line begins one
/// slot later. Out-of-range indexes clamp to the end of the last line,
/// and an empty structure always maps to the origin.
pub fn to_position(flat_index: usize, lines: &[String]) -> Position {
    let mut start = 0usize;
    for (line, text) in lines.iter().enumerate() {
        let span = char_len(text);
        if flat_index <= start + span {
            return Position {
                line,
                offset: flat_index - start,
            };
        }
        start += span + 1;
    }
    match lines.last() {
        Some(last) => Position {
            line: lines.len() - 1,
            offset: char_len(last),
        },
        None => Position { line: 0, offset: 0 },
    }
}

/// Flat index of the first character of `line`. Indexes past the last line
/// clamp to the total display length.
pub fn start_of_line(line: usize, lines: &[String]) -> usize {
    let mut start = 0usize;
    for text in lines.iter().take(line) {
        start += char_len(text) + 1;
    }
    start.min(total_display_length(lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reflow::reflow;

    fn lines(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_structure_maps_to_origin() {
        assert_eq!(to_position(0, &[]), Position { line: 0, offset: 0 });
        assert_eq!(to_position(42, &[]), Position { line: 0, offset: 0 });
    }

    #[test]
    fn test_within_first_line() {
        let l = lines(&["abc", "def"]);
        assert_eq!(to_position(0, &l), Position { line: 0, offset: 0 });
        assert_eq!(to_position(2, &l), Position { line: 0, offset: 2 });
    }

    #[test]
    fn test_separator_slot_stays_on_its_line() {
        let l = lines(&["abc", "def"]);
        // Index 3 is the separator after "abc"; 4 is the true line start.
        assert_eq!(to_position(3, &l), Position { line: 0, offset: 3 });
        assert_eq!(to_position(4, &l), Position { line: 1, offset: 0 });
        assert_eq!(to_position(5, &l), Position { line: 1, offset: 1 });
    }

    #[test]
    fn test_quick_brown_fox_scenario() {
        let l = reflow("The quick brown fox", 10);
        assert_eq!(to_position(9, &l), Position { line: 0, offset: 9 });
        assert_eq!(to_position(10, &l), Position { line: 1, offset: 0 });
    }

    #[test]
    fn test_end_of_last_line_is_valid() {
        let l = lines(&["abc", "def"]);
        // Total length is 7; index 7 sits just past "def".
        assert_eq!(to_position(7, &l), Position { line: 1, offset: 3 });
    }

    #[test]
    fn test_out_of_range_clamps_to_end() {
        let l = lines(&["abc", "def"]);
        assert_eq!(to_position(100, &l), Position { line: 1, offset: 3 });
    }

    #[test]
    fn test_empty_lines_in_structure() {
        let l = lines(&["ab", "", "cd"]);
        // Chars sit at 0,1 ("ab") and 4,5 ("cd"); separators at 2 and 3.
        assert_eq!(to_position(2, &l), Position { line: 0, offset: 2 });
        assert_eq!(to_position(3, &l), Position { line: 1, offset: 0 });
        assert_eq!(to_position(4, &l), Position { line: 2, offset: 0 });
        assert_eq!(to_position(5, &l), Position { line: 2, offset: 1 });
        assert_eq!(to_position(6, &l), Position { line: 2, offset: 2 });
    }

    #[test]
    fn test_start_of_line() {
        let l = lines(&["abc", "", "de"]);
        assert_eq!(start_of_line(0, &l), 0);
        assert_eq!(start_of_line(1, &l), 4);
        assert_eq!(start_of_line(2, &l), 5);
        // Past the end clamps to total length.
        assert_eq!(start_of_line(3, &l), 7);
        assert_eq!(start_of_line(99, &l), 7);
    }

    #[test]
    fn test_round_trip_over_every_index() {
        for (text, width) in [
            ("The quick brown fox", 10),
            ("one two three\n\nfour five six seven", 9),
        ] {
            let l = reflow(text, width);
            let total = total_display_length(&l);
            for flat in 0..=total {
                let pos = to_position(flat, &l);
                assert!(pos.line < l.len());
                assert!(pos.offset <= char_len(&l[pos.line]));
                let back = start_of_line(pos.line, &l) + pos.offset;
                assert_eq!(back, flat, "round trip failed at {flat}");
            }
        }
    }
}
