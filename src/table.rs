use std::borrow::Cow;
use std::fmt::Write as _;

use crate::cell::CellValue;

/// One rendered cell: its text and whether it is right-aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCell {
    pub text: String,
    pub numeric: bool,
}

impl TableCell {
    pub fn from_value(value: Option<&CellValue>) -> Self {
        match value {
            Some(value) => Self {
                text: value.as_display(),
                numeric: matches!(value, CellValue::Number(_)),
            },
            None => Self::default(),
        }
    }
}

pub fn render_table(headers: &[String], rows: &[Vec<TableCell>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(&cell.text));
        }
    }

    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();

    let header_cells = headers
        .iter()
        .map(|h| TableCell {
            text: h.clone(),
            numeric: false,
        })
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&header_cells, &widths));

    let separator_cells = widths
        .iter()
        .map(|w| TableCell {
            text: "-".repeat((*w).max(3)),
            numeric: false,
        })
        .collect::<Vec<_>>();
    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator_cells, &separator_widths));

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }

    output
}

pub fn print_table(headers: &[String], rows: &[Vec<TableCell>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(cells: &[TableCell], widths: &[usize]) -> String {
    let rendered = widths
        .iter()
        .enumerate()
        .map(|(idx, width)| {
            let cell = cells.get(idx);
            let text = cell.map(|c| sanitize_cell(&c.text)).unwrap_or_default();
            let padding = " ".repeat(width.saturating_sub(display_width(&text)));
            if cell.is_some_and(|c| c.numeric) {
                format!("{padding}{text}")
            } else {
                format!("{text}{padding}")
            }
        })
        .collect::<Vec<_>>();
    rendered.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI escape, e.g. \x1b[31m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
