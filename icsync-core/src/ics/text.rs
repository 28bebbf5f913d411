//! RFC 5545 content-line helpers: TEXT escaping and line folding.

/// Maximum octets per physical content line, excluding the CRLF.
pub const FOLD_WIDTH: usize = 75;

/// Escape a TEXT value (backslash, comma, semicolon, newline).
///
/// CRLF and bare CR are normalised to a single newline before escaping.
pub fn escape_text(value: &str) -> String {
    let normalized = value.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(normalized.len());

    for c in normalized.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }

    out
}

/// Fold a content line so no physical line exceeds [`FOLD_WIDTH`] octets.
///
/// Breaks happen by byte count, never inside a UTF-8 character and never
/// between a backslash and the character it escapes. Continuation lines
/// start with a single space, which counts toward the width.
pub fn fold_line(line: &str) -> String {
    if line.len() <= FOLD_WIDTH {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / FOLD_WIDTH * 3);
    let mut current = 0;

    for unit in units(line) {
        if current + unit.len() > FOLD_WIDTH {
            out.push_str("\r\n ");
            current = 1;
        }
        out.push_str(unit);
        current += unit.len();
    }

    out
}

/// Split a line into unbreakable units: escape pairs and single characters.
fn units(line: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut iter = line.char_indices().peekable();

    while let Some((start, c)) = iter.next() {
        let mut end = start + c.len_utf8();
        if c == '\\' {
            if let Some(&(next_start, next)) = iter.peek() {
                end = next_start + next.len_utf8();
                iter.next();
            }
        }
        units.push(&line[start..end]);
    }

    units
}
