//! Error reporter (C6): turns a failed parse's furthest extent into a
//! framed, human-readable message.

/// Build the framed failure message described in spec §4.6: the line
/// containing `extent`, its neighbors, a caret under the failing column, and
/// a trailing `ParseError: failed after line=L char=C` annotation.
pub(crate) fn frame_failure(text: &str, extent: usize) -> String {
    let (line_no, col, line_start) = locate(text, extent);
    let lines: Vec<&str> = text.split('\n').collect();
    // `split('\n')` drops the `\r` of a `\r\n` ending; trim it back off so
    // the caret lines up under the reported column either way.
    let current = lines.get(line_no.saturating_sub(1)).copied().unwrap_or("").trim_end_matches('\r');

    let mut out = String::new();
    if line_no >= 2 {
        if let Some(prev) = lines.get(line_no - 2) {
            out.push_str(prev.trim_end_matches('\r'));
            out.push('\n');
        }
    }
    out.push_str(current);
    out.push('\n');
    out.push_str(&" ".repeat(col.saturating_sub(1)));
    out.push('^');
    out.push('\n');
    if let Some(next) = lines.get(line_no) {
        out.push_str(next.trim_end_matches('\r'));
        out.push('\n');
    }
    out.push_str(&format!("ParseError: failed after line={line_no} char={col}"));
    let _ = line_start;
    out
}

/// 1-based `(line, column)` of byte offset `extent` within `text`, plus the
/// byte offset where that line begins.
fn locate(text: &str, extent: usize) -> (usize, usize, usize) {
    let clamped = extent.min(text.len());
    let mut line = 1usize;
    let mut line_start = 0usize;
    for (i, c) in text.char_indices() {
        if i >= clamped {
            break;
        }
        if c == '\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    let col = text[line_start..clamped].chars().count() + 1;
    (line, col, line_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locates_first_line_first_column() {
        assert_eq!(locate("abc", 0), (1, 1, 0));
    }

    #[test]
    fn locates_second_line() {
        let text = "abc\ndef";
        assert_eq!(locate(text, 4), (2, 1, 4));
    }

    #[test]
    fn frame_includes_line_and_caret() {
        let text = "a <-\n#oops\n@";
        let msg = frame_failure(text, text.len() - 1);
        assert!(msg.contains('@'));
        assert!(msg.contains('^'));
        assert!(msg.contains("ParseError: failed after line=3 char=1"));
    }
}
