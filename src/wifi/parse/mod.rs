//! Text parsers for daemon CLI output.
//!
//! Everything that depends on the shape of `nmcli`/`iwctl` output lives here,
//! so moving a backend to a structured output mode only touches this module.

pub mod iwctl;
pub mod nmcli;

/// Split a fixed-width row on runs of two or more spaces.
///
/// Known limitation: a value that itself contains two consecutive spaces
/// (for example an SSID like `"My  Net"`) is split into two columns. The
/// daemons pad with spaces, so there is no unambiguous way to recover it.
pub fn split_columns(line: &str) -> Vec<&str> {
    let line = line.trim();
    let mut columns = Vec::new();
    let mut start = 0;
    let bytes = line.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b' ' && bytes.get(i + 1) == Some(&b' ') {
            columns.push(&line[start..i]);
            while i < bytes.len() && bytes[i] == b' ' {
                i += 1;
            }
            start = i;
        } else {
            i += 1;
        }
    }
    if start < line.len() {
        columns.push(&line[start..]);
    }
    columns
}

/// Remove ANSI SGR escapes (`ESC [ ... m`), which iwctl emits for colour
pub fn strip_ansi(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Strip the current-network sentinel. Returns the rest of the row and
/// whether the sentinel was present.
pub fn strip_marker(line: &str, marker: char) -> (&str, bool) {
    let trimmed = line.trim();
    match trimmed.strip_prefix(marker) {
        Some(rest) => (rest.trim_start(), true),
        None => (trimmed, false),
    }
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == '-')
}

/// Data rows of an iwctl table: everything after the separator that closes
/// the column header, ANSI-stripped and without blank lines.
///
/// iwctl prints `title`, `----`, `column header`, `----`, rows.
pub fn table_rows(output: &str) -> Vec<String> {
    let lines: Vec<String> = output.lines().map(strip_ansi).collect();
    let separators: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| is_separator(l))
        .map(|(i, _)| i)
        .collect();

    let body_start = match separators.as_slice() {
        [_, second, ..] => second + 1,
        [only] => only + 2,
        [] => 0,
    };

    lines
        .into_iter()
        .skip(body_start)
        .filter(|l| !l.trim().is_empty() && !is_separator(l))
        .collect()
}
