//! Tabular Result Rendering
//!
//! Records are schema-less, so the table header is the union of the
//! columns across all rows. A record missing a column renders an empty
//! cell. Cell text is capped at a fixed character width, and every
//! rendering ends with a row count; an empty result set renders as an
//! explicit message rather than an empty table.

use std::collections::BTreeSet;

use crate::value::Record;

/// Widest a cell may render; longer values are cut with an ellipsis
pub const MAX_CELL_WIDTH: usize = 40;

const ELLIPSIS: &str = "...";

/// Render records as aligned columns with a trailing row count
#[must_use]
pub fn render_table(records: &[Record]) -> String {
    if records.is_empty() {
        return "(no rows)\n".to_string();
    }

    let columns: Vec<&str> = records
        .iter()
        .flat_map(|record| record.keys())
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let cells: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| {
                    record.get(*column).map_or_else(String::new, |v| clip(&v.to_string()))
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    render_row(&mut out, &widths, columns.iter().map(|c| (*c).to_string()));
    render_row(&mut out, &widths, widths.iter().map(|w| "-".repeat(*w)));
    for row in &cells {
        render_row(&mut out, &widths, row.iter().cloned());
    }
    out.push('\n');
    let n = records.len();
    out.push_str(&format!("{n} row{}\n", if n == 1 { "" } else { "s" }));
    out
}

fn render_row(out: &mut String, widths: &[usize], cells: impl Iterator<Item = String>) {
    let mut line = String::new();
    for (i, cell) in cells.enumerate() {
        let pad = widths[i].saturating_sub(cell.chars().count());
        line.push_str(&cell);
        line.push_str(&" ".repeat(pad));
        line.push_str("  ");
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Truncate to the fixed cell width, marking the cut with an ellipsis
fn clip(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        return text.to_string();
    }
    let kept: String = text.chars().take(MAX_CELL_WIDTH - ELLIPSIS.len()).collect();
    format!("{kept}{ELLIPSIS}")
}
