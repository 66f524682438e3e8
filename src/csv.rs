// src/csv.rs
use std::mem::take;

/* ---------------- Parsing ---------------- */

/// Minimal CSV parser (quotes + CRLF tolerant).
///
/// - quoted cells may hold separators and newlines; `""` is a literal quote
/// - unquoted cells are trimmed, quoted cells are kept as written
/// - rows without a single non-empty cell are dropped
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = s!();
    let mut in_quotes = false;
    let mut quoted = false; // current cell opened with a quote
    let mut closed = false; // quote closed; ignore until separator
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if matches!(chars.peek(), Some('"')) {
                    chars.next(); // double-quote escape
                    field.push('"');
                } else {
                    in_quotes = false;
                    closed = true;
                }
            }
            '"' if !quoted && field.trim().is_empty() => {
                // leading whitespace before an opening quote is noise
                field.clear();
                in_quotes = true;
                quoted = true;
            }
            c if c == sep && !in_quotes => {
                end_field(&mut row, &mut field, quoted);
                quoted = false;
                closed = false;
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) { chars.next(); }
                end_field(&mut row, &mut field, quoted);
                quoted = false;
                closed = false;
                push_row(&mut rows, take(&mut row));
            }
            _ if closed => {} // junk after a closing quote
            _ => field.push(ch),
        }
    }

    // Flush any trailing field/row even if quotes were unterminated.
    if !field.is_empty() || !row.is_empty() {
        end_field(&mut row, &mut field, quoted);
        push_row(&mut rows, row);
    }

    rows
}

fn end_field(row: &mut Vec<String>, field: &mut String, quoted: bool) {
    let cell = take(field);
    row.push(if quoted { cell } else { cell.trim().to_string() });
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    if row.iter().any(|c| !c.is_empty()) {
        rows.push(row);
    }
}

/// Lower-cased, trimmed header cells for name lookups.
pub fn normalize_header(row: &[String]) -> Vec<String> {
    row.iter().map(|h| h.trim().to_lowercase()).collect()
}
