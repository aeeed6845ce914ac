/// Reflow source text into display lines no wider than `width` characters.
///
/// Paragraphs (split on `'\n'`) that fit after trimming are kept verbatim.
/// Longer paragraphs are greedily packed word by word, and a single word
/// wider than the target is hard-split into width-sized chunks. Blank
/// paragraphs become blank display lines, except at the very start of the
/// text where they are dropped. Pure function of its inputs: the same text
/// and width always produce the same lines.
pub fn reflow(text: &str, width: usize) -> Vec<String> {
    // Width zero would spin the packing loop forever.
    debug_assert!(width > 0, "reflow width must be positive");
    let width = width.max(1);

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let trimmed = paragraph.trim();
        if trimmed.is_empty() {
            // Blank paragraph. Skip until the first real content so the
            // display never opens with an empty line.
            if !lines.is_empty() {
                lines.push(String::new());
            }
            continue;
        }
        if char_len(trimmed) <= width {
            lines.push(trimmed.to_string());
            continue;
        }
        pack_paragraph(trimmed, width, &mut lines);
    }

    if lines.is_empty() && !text.is_empty() {
        // All-whitespace source still yields one typeable (empty) line.
        lines.push(String::new());
    }
    lines
}

/// Greedy word packing: a word joins the current line while
/// `current + space + word` still fits, otherwise it starts the next line.
fn pack_paragraph(paragraph: &str, width: usize, lines: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in paragraph.split_whitespace() {
        let word_len = char_len(word);
        if word_len > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            hard_split(word, width, lines);
            continue;
        }
        if current_len == 0 {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }
    if current_len > 0 {
        lines.push(current);
    }
}

/// Break an oversize word into chunks of exactly `width` characters, each
/// emitted as its own line. The final chunk may be shorter.
fn hard_split(word: &str, width: usize, lines: &mut Vec<String>) {
    let chars: Vec<char> = word.chars().collect();
    for chunk in chars.chunks(width) {
        lines.push(chunk.iter().collect());
    }
}

/// Character count of `s`, the unit every reflow decision is made in.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Total length of the display structure: the sum of line lengths plus one
/// virtual separator slot between each adjacent pair of lines.
pub fn total_display_length(lines: &[String]) -> usize {
    let chars: usize = lines.iter().map(|l| char_len(l)).sum();
    chars + lines.len().saturating_sub(1)
}
