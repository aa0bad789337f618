//! ANSI escape helpers shared by the entry classifier and the detail pane.
//!
//! Only SGR sequences (`ESC [ ... m`) are recognised; Rails logs use them for
//! colorized SQL and nothing else.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

static ANSI_SGR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("SGR pattern is valid"));

pub const RESET: &str = "\x1b[0m";

pub fn has_ansi_codes(text: &str) -> bool {
    ANSI_SGR.is_match(text)
}

pub fn strip_ansi(text: &str) -> String {
    ANSI_SGR.replace_all(text, "").into_owned()
}

/// Terminal columns occupied by `text` once escape sequences are removed.
pub fn visible_width(text: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(text).as_str())
}

/// Split `text` into SGR sequences and the plain runs between them.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut pos = 0;
    for m in ANSI_SGR.find_iter(text) {
        if m.start() > pos {
            out.push(Segment::Text(&text[pos..m.start()]));
        }
        out.push(Segment::Sgr(m.as_str()));
        pos = m.end();
    }
    if pos < text.len() {
        out.push(Segment::Text(&text[pos..]));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Sgr(&'a str),
    Text(&'a str),
}

/// Numeric parameters of an SGR sequence; `ESC[m` yields `[0]`.
pub fn sgr_params(seq: &str) -> Vec<u16> {
    let inner = seq
        .strip_prefix("\x1b[")
        .and_then(|s| s.strip_suffix('m'))
        .unwrap_or("");
    if inner.is_empty() {
        return vec![0];
    }
    inner
        .split(';')
        .map(|p| if p.is_empty() { 0 } else { p.parse().unwrap_or(0) })
        .collect()
}

/// Color state that is set and not yet reset while scanning a fragment.
#[derive(Debug, Default, Clone)]
struct ActiveSgr {
    sequences: Vec<String>,
}

impl ActiveSgr {
    fn apply(&mut self, seq: &str) {
        let params = sgr_params(seq);
        if params.first() == Some(&0) {
            self.sequences.clear();
            if params.len() == 1 {
                return;
            }
        }
        if !self.sequences.iter().any(|s| s == seq) {
            self.sequences.push(seq.to_string());
        }
    }

    fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    fn prefix(&self) -> String {
        self.sequences.concat()
    }
}

/// Byte index at which `text` stops fitting into `max_width` columns.
/// Always advances past at least one character.
fn fit_index(text: &str, max_width: usize) -> usize {
    let mut width = 0;
    for (idx, ch) in text.char_indices() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width {
            return if idx == 0 { ch.len_utf8() } else { idx };
        }
        width += w;
    }
    text.len()
}

/// Wrap text without escape sequences, preferring the last whitespace at or
/// before the limit and falling back to a hard break.
pub fn wrap_plain_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    if UnicodeWidthStr::width(text) <= max_width {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if UnicodeWidthStr::width(remaining) <= max_width {
            chunks.push(remaining.to_string());
            break;
        }

        let hard = fit_index(remaining, max_width);
        let soft = remaining
            .char_indices()
            .take_while(|(idx, _)| *idx <= hard)
            .filter(|(idx, ch)| *idx > 0 && ch.is_whitespace())
            .map(|(idx, _)| idx)
            .last();

        match soft {
            Some(idx) => {
                chunks.push(remaining[..idx].to_string());
                remaining = remaining[idx..].trim_start();
            }
            None => {
                chunks.push(remaining[..hard].to_string());
                remaining = &remaining[hard..];
            }
        }
    }
    chunks
}

/// Wrap colored text by visible width.
///
/// Every continuation chunk starts with the color sequences still active at
/// the break, and a chunk that ends while a color is active is closed with a
/// reset, so each chunk renders the same on its own line as it did inline.
pub fn wrap_ansi_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    if visible_width(text) <= max_width {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut active = ActiveSgr::default();
    let mut current = String::new();
    let mut current_width = 0usize;

    for segment in segments(text) {
        match segment {
            Segment::Sgr(seq) => {
                current.push_str(seq);
                active.apply(seq);
            }
            Segment::Text(run) => {
                for ch in run.chars() {
                    let w = ch.width().unwrap_or(0);
                    if current_width > 0 && current_width + w > max_width {
                        if !active.is_empty() {
                            current.push_str(RESET);
                        }
                        chunks.push(std::mem::take(&mut current));
                        current.push_str(&active.prefix());
                        current_width = 0;
                    }
                    current.push(ch);
                    current_width += w;
                }
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Pick the wrapping strategy based on whether `text` carries colors.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if has_ansi_codes(text) {
        wrap_ansi_text(text, max_width)
    } else {
        wrap_plain_text(text, max_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQL: &str = "  \u{1b}[1m\u{1b}[36mUser Load (1.2ms)\u{1b}[0m  \u{1b}[1m\u{1b}[34mSELECT `users`.* FROM `users` WHERE `users`.`id` = 1 LIMIT 1\u{1b}[0m";

    #[test]
    fn test_strip_and_detect() {
        assert!(has_ansi_codes(SQL));
        assert!(!has_ansi_codes("plain"));
        assert_eq!(strip_ansi("\u{1b}[31mred\u{1b}[0m text"), "red text");
    }

    #[test]
    fn test_plain_wrap_breaks_on_whitespace() {
        let chunks = wrap_plain_text("hello world again", 11);
        assert_eq!(chunks, vec!["hello world", "again"]);
    }

    #[test]
    fn test_plain_wrap_hard_break() {
        let chunks = wrap_plain_text("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_plain_wrap_short_text_untouched() {
        assert_eq!(wrap_plain_text("short", 40), vec!["short"]);
    }

    #[test]
    fn test_ansi_wrap_preserves_visual_text_and_width() {
        for width in [5usize, 8, 13, 20, 33] {
            let chunks = wrap_ansi_text(SQL, width);
            let joined: String = chunks.iter().map(|c| strip_ansi(c)).collect();
            assert_eq!(joined, strip_ansi(SQL), "width {width}");
            for chunk in &chunks {
                assert!(visible_width(chunk) <= width, "chunk {chunk:?} exceeds {width}");
            }
        }
    }

    #[test]
    fn test_ansi_wrap_prefixes_active_color() {
        let text = "\u{1b}[31mabcdef\u{1b}[0mgh";
        let chunks = wrap_ansi_text(text, 4);
        assert_eq!(chunks[0], "\u{1b}[31mabcd\u{1b}[0m");
        assert!(chunks[1].starts_with("\u{1b}[31mef"));
        // after the reset no color is carried into the tail
        assert!(chunks[1].ends_with("\u{1b}[0mgh"));
    }

    #[test]
    fn test_ansi_wrap_no_prefix_after_reset() {
        let text = "\u{1b}[32mok\u{1b}[0m plain text here";
        let chunks = wrap_ansi_text(text, 6);
        for chunk in chunks.iter().skip(1) {
            assert!(!chunk.starts_with("\u{1b}[32m"), "{chunk:?}");
        }
    }

    #[test]
    fn test_sgr_params() {
        assert_eq!(sgr_params("\u{1b}[m"), vec![0]);
        assert_eq!(sgr_params("\u{1b}[1;36m"), vec![1, 36]);
    }
}
