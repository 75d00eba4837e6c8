// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Human-readable rendering of batches and rows.

use quiver_engine::RowBatch;
use unicode_width::UnicodeWidthStr;

/// Display width of a string; for multi-line strings, the widest line.
fn display_width(s: &str) -> usize {
    if s.contains('\n') { s.lines().map(|line| line.width()).max().unwrap_or(0) } else { s.width() }
}

/// Escape newlines and tabs for single-line table cells.
fn escape_control_chars(s: &str) -> String {
    s.replace('\n', "\\n").replace('\t', "\\t")
}

fn cell_text(batch: &RowBatch, column: usize, row: usize) -> String {
    // SAFETY: callers hold the batch through BatchShared::with_batch, so
    // the producing task's arena is alive for the duration of the render.
    let value = unsafe { batch.value(column, row) };
    escape_control_chars(&value.to_string())
}

fn pad_center(s: &str, width: usize) -> String {
    let pad = width - display_width(s);
    let left = pad / 2;
    let right = pad - left;
    format!(" {:left$}{}{:right$} ", "", s, "", left = left, right = right)
}

/// Render a whole batch as a bordered table.
pub(crate) fn render_batch(batch: &RowBatch) -> String {
    let schema = batch.schema();
    let row_count = batch.row_count();

    let mut col_widths: Vec<usize> =
        schema.fields.iter().map(|field| display_width(&field.name)).collect();
    for row in 0..row_count {
        for (column, width) in col_widths.iter_mut().enumerate() {
            *width = (*width).max(display_width(&cell_text(batch, column, row)));
        }
    }
    for width in &mut col_widths {
        *width += 2;
    }

    let sep = format!(
        "+{}+",
        col_widths.iter().map(|w| "-".repeat(*w + 2)).collect::<Vec<_>>().join("+")
    );

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');

    let header = schema
        .fields
        .iter()
        .zip(&col_widths)
        .map(|(field, width)| pad_center(&field.name, *width))
        .collect::<Vec<_>>();
    out.push_str(&format!("|{}|\n", header.join("|")));
    out.push_str(&sep);
    out.push('\n');

    for row in 0..row_count {
        let cells = col_widths
            .iter()
            .enumerate()
            .map(|(column, width)| pad_center(&cell_text(batch, column, row), *width))
            .collect::<Vec<_>>();
        out.push_str(&format!("|{}|\n", cells.join("|")));
    }

    out.push_str(&sep);
    out.push('\n');
    out
}

/// Render one row as `name: value` pairs.
pub(crate) fn render_row(batch: &RowBatch, row: usize) -> String {
    batch
        .schema()
        .fields
        .iter()
        .enumerate()
        .map(|(column, field)| format!("{}: {}", field.name, cell_text(batch, column, row)))
        .collect::<Vec<_>>()
        .join(", ")
}
