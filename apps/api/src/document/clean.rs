//! Text normalisation applied before segmentation.
//!
//! Line breaks are kept so headings stay whole lines; everything else collapses to single spaces.

/// Normalises whitespace within each line, drops NUL bytes and blank-line runs.
pub fn clean_text(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut previous_blank = true;

    for line in text.replace('\0', " ").lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if !previous_blank {
                lines.push(String::new());
            }
            previous_blank = true;
        } else {
            lines.push(collapsed);
            previous_blank = false;
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// Caps `text` at `max_chars` characters. Returns the (possibly shortened) text and
/// whether truncation happened.
pub fn cap_text(text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (text[..byte_idx].to_string(), true),
        None => (text, false),
    }
}
