use std::fs;
use std::io;
use std::path::Path;

/// A single parsed CSV line: an ordered list of string fields.
pub type Row = Vec<String>;

/// Parsed CSV content. Row 0 is the header row, rows 1..N are data rows.
///
/// Rows are kept exactly as parsed; nothing validates that every row has the
/// same field count. Column-index logic downstream assumes it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    /// The header row, if the table has any rows at all.
    pub fn headers(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// All rows after the header row.
    pub fn data_rows(&self) -> &[Row] {
        if self.rows.is_empty() {
            &[]
        } else {
            &self.rows[1..]
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse raw CSV text into a [`Table`].
///
/// The whole input is trimmed first, so trailing newlines or blank lines at
/// either end never become rows; an all-whitespace input gives an empty table.
/// Within a line, a comma splits fields only outside quotes. A `"` flips the
/// quote state unless the preceding character is a backslash, and is kept
/// literally in the field value either way. This is deliberately not RFC 4180
/// (no dequoting, no doubled-quote escapes); malformed quoting just shifts
/// field boundaries instead of failing.
///
/// # Arguments
/// * `text` - Raw CSV content, comma-delimited, first line treated as headers
///
/// # Returns
/// * `Table` - One row per non-empty line; this function never fails
pub fn parse_csv(text: &str) -> Table {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Table::default();
    }

    let rows = trimmed.lines().map(parse_line).collect();
    Table { rows }
}

/// Read a CSV file from disk and parse it.
///
/// # Arguments
/// * `filepath` - Path to the CSV file to load
///
/// # Returns
/// * `io::Result<Table>` - The parsed table, or the underlying read error
pub fn parse_csv_file(filepath: impl AsRef<Path>) -> io::Result<Table> {
    let text = fs::read_to_string(filepath)?;
    Ok(parse_csv(&text))
}

// Split one line into fields, tracking quote state character by character.
fn parse_line(line: &str) -> Row {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut prev: Option<char> = None;

    for c in line.chars() {
        if c == '"' && prev != Some('\\') {
            in_quotes = !in_quotes;
            current.push(c);
        } else if c == ',' && !in_quotes {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
        prev = Some(c);
    }

    // The last field has no trailing comma
    fields.push(current);
    fields
}
