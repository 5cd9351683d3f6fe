use std::collections::HashMap;

use crate::parser::{Row, Table};
use crate::state::{CheckboxView, TrackedColumns};

/// Server-side rendering of a parsed table.
///
/// Tracked columns become checkboxes; every checkbox starts unchecked no
/// matter what the CSV cell contained. Rows are identified by their index in
/// the full table, so the first data row is row 1.
pub struct HtmlTable {
    headers: Row,
    data: Vec<Row>,
    tracked: Vec<usize>,
    checks: HashMap<(usize, usize), bool>,
}

impl HtmlTable {
    pub fn new(table: &Table, tracked: &TrackedColumns) -> Self {
        let headers = table.headers().cloned().unwrap_or_default();
        let data: Vec<Row> = table.data_rows().to_vec();
        let tracked = tracked.resolve(headers.len());

        let mut checks = HashMap::new();
        for row in 1..=data.len() {
            for &column in &tracked {
                checks.insert((row, column), false);
            }
        }

        HtmlTable {
            headers,
            data,
            tracked,
            checks,
        }
    }

    fn is_tracked(&self, column: usize) -> bool {
        self.tracked.contains(&column)
    }

    /// Render `<thead>` and `<tbody>` for the table element.
    ///
    /// Tracked header cells carry a "Reset All" button tagged with the column
    /// index; tracked body cells are checkbox inputs tagged with
    /// `data-row`/`data-column` so the page script and the state manager
    /// address them the same way.
    pub fn to_html(&self) -> String {
        let mut html = String::new();

        html.push_str("<thead><tr>");
        for (index, header) in self.headers.iter().enumerate() {
            if self.is_tracked(index) {
                html.push_str(&format!(
                    "<th><div class=\"header-with-button\"><span>{}</span>\
                     <button class=\"reset-column-btn\" data-column-index=\"{}\">Reset All</button>\
                     </div></th>",
                    escape_html(header),
                    index
                ));
            } else {
                html.push_str(&format!("<th>{}</th>", escape_html(header)));
            }
        }
        html.push_str("</tr></thead>");

        html.push_str("<tbody>");
        for (offset, row) in self.data.iter().enumerate() {
            let row_index = offset + 1;
            html.push_str("<tr>");
            for (column, cell) in row.iter().enumerate() {
                if self.is_tracked(column) {
                    let checked = self
                        .checks
                        .get(&(row_index, column))
                        .copied()
                        .unwrap_or(false);
                    html.push_str(&format!(
                        "<td><input type=\"checkbox\" data-row=\"{}\" data-column=\"{}\"{}></td>",
                        row_index,
                        column,
                        if checked { " checked" } else { "" }
                    ));
                } else {
                    html.push_str(&format!("<td>{}</td>", escape_html(cell)));
                }
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody>");

        html
    }

    /// A full-width error row, shown when the CSV cannot be read.
    pub fn error_row_html(message: &str) -> String {
        format!(
            "<tbody><tr><td colspan=\"100%\">{}</td></tr></tbody>",
            escape_html(message)
        )
    }
}

impl CheckboxView for HtmlTable {
    fn checkboxes(&self, column: usize) -> Vec<(usize, bool)> {
        let mut boxes: Vec<(usize, bool)> = self
            .checks
            .iter()
            .filter(|((_, c), _)| *c == column)
            .map(|((row, _), &checked)| (*row, checked))
            .collect();
        boxes.sort_unstable_by_key(|&(row, _)| row);
        boxes
    }

    fn set_checked(&mut self, row: usize, column: usize, checked: bool) {
        if let Some(state) = self.checks.get_mut(&(row, column)) {
            *state = checked;
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
