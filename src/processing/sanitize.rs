//! Best-effort salvage of text that may contain raw container structure or binary noise.
//!
//! Extraction can hand back undecoded PDF bytes when format detection fails. This is not a
//! parser: it drops the obvious structural lines and any character outside the printable set.

use regex::Regex;
use std::sync::LazyLock;

static OBJECT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\s+\d+\s+obj$").expect("object header pattern"));

const CONTAINER_KEYWORDS: [&str; 3] = ["endobj", "stream", "endstream"];

/// Strip structural markers and control characters from raw extracted text.
///
/// Lines break on `\n`, `\r\n`, a bare `\r`, and the other Unicode line separators. Blank
/// lines survive as empty lines so paragraph breaks are kept. Other lines are trimmed and
/// dropped when they look like PDF structure. Only newline, tab, printable ASCII, and code points
/// from U+00A0 upward remain in the output.
pub fn sanitize(raw: &str) -> String {
    let kept: Vec<&str> = split_lines(raw)
        .into_iter()
        .filter_map(|line| {
            let stripped = line.trim();
            if stripped.is_empty() {
                Some("")
            } else if is_structural_line(stripped) {
                None
            } else {
                Some(stripped)
            }
        })
        .collect();

    kept.join("\n").chars().filter(|ch| is_kept_char(*ch)).collect()
}

/// Split on every line boundary, treating `\r\n` as one break. A trailing break does not
/// produce a final empty line.
fn split_lines(raw: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = raw.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        if !is_line_break(ch) {
            continue;
        }
        lines.push(&raw[start..index]);
        start = index + ch.len_utf8();
        if ch == '\r'
            && let Some(&(next, '\n')) = chars.peek()
        {
            chars.next();
            start = next + 1;
        }
    }
    if start < raw.len() {
        lines.push(&raw[start..]);
    }
    lines
}

fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r'
            | '\u{0b}'
            | '\u{0c}'
            | '\u{1c}'..='\u{1e}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

fn is_structural_line(stripped: &str) -> bool {
    let lower = stripped.to_lowercase();
    lower.starts_with("%pdf")
        || lower.starts_with("%%eof")
        || OBJECT_HEADER.is_match(stripped)
        || CONTAINER_KEYWORDS.contains(&lower.as_str())
}

fn is_kept_char(ch: char) -> bool {
    matches!(ch, '\n' | '\t' | ' '..='~') || u32::from(ch) >= 160
}
