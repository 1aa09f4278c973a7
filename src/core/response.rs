//! Outgoing message splitting
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Count characters instead of bytes, drop embed helpers
//! - 1.0.0: Initial creation

/// Discord message content limit, in characters
pub const MESSAGE_LIMIT: usize = 2000;

/// Split text into messages of at most `limit` characters
///
/// Prefers line breaks, falls back to hard splits for long lines. Never
/// splits inside a character. Empty input yields no messages.
pub fn split_text(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if text.chars().count() <= limit {
        return if text.is_empty() {
            Vec::new()
        } else {
            vec![text.to_string()]
        };
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();
        // +1 for the newline that joins it to `current`
        let needed = if current.is_empty() { line_len } else { line_len + 1 };

        if current_len + needed <= limit {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            current_len += needed;
            continue;
        }

        if !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
        } else {
            let mut pieces = hard_split(line, limit);
            if let Some(last) = pieces.pop() {
                parts.extend(pieces);
                current_len = last.chars().count();
                current = last;
            }
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn hard_split(line: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(limit)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Split text for regular message content
pub fn split_for_message(text: &str) -> Vec<String> {
    split_text(text, MESSAGE_LIMIT)
}
