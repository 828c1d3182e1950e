#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_xlsxwriter::{Format, Workbook};
use tempfile::{TempDir, tempdir};

/// A fixture cell value.
#[derive(Debug, Clone)]
pub enum Cell {
    Text(&'static str),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Blank,
}

use Cell::Text;

pub fn date(y: i32, m: u32, d: u32) -> Cell {
    Cell::Date(NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
}

/// Excel serial number of a date-time (1900 date system).
pub fn serial(value: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .expect("epoch")
        .and_time(NaiveTime::MIN);
    (*value - epoch).num_milliseconds() as f64 / 86_400_000.0
}

/// Worksheet contents written starting at `origin` (0-based row, column).
pub struct SheetSpec {
    pub name: &'static str,
    pub origin: (u32, u16),
    pub rows: Vec<Vec<Cell>>,
}

impl SheetSpec {
    pub fn new(name: &'static str, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name,
            origin: (0, 0),
            rows,
        }
    }

    pub fn at(mut self, row: u32, col: u16) -> Self {
        self.origin = (row, col);
        self
    }
}

/// Build an xlsx workbook in memory.
pub fn workbook_bytes(sheets: &[SheetSpec]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    for layout in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(layout.name).expect("sheet name");
        for (r, row) in layout.rows.iter().enumerate() {
            let row_index = layout.origin.0 + r as u32;
            for (c, cell) in row.iter().enumerate() {
                let col = layout.origin.1 + c as u16;
                match cell {
                    Cell::Text(text) => {
                        sheet.write_string(row_index, col, *text).expect("write text");
                    }
                    Cell::Number(n) => {
                        sheet.write_number(row_index, col, *n).expect("write number");
                    }
                    Cell::Bool(b) => {
                        sheet.write_boolean(row_index, col, *b).expect("write bool");
                    }
                    Cell::Date(d) => {
                        let value = serial(&d.and_time(NaiveTime::MIN));
                        sheet
                            .write_number_with_format(row_index, col, value, &date_format)
                            .expect("write date");
                    }
                    Cell::DateTime(dt) => {
                        sheet
                            .write_number_with_format(row_index, col, serial(dt), &datetime_format)
                            .expect("write date-time");
                    }
                    Cell::Blank => {}
                }
            }
        }
    }
    workbook.save_to_buffer().expect("serialize workbook")
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes a workbook under the workspace and returns its path.
    pub fn write_workbook(&self, name: &str, sheets: &[SheetSpec]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, workbook_bytes(sheets)).expect("write workbook");
        path
    }

    /// Writes a text file under the workspace and returns its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).expect("write temp file");
        path
    }
}

/// The employee sheet used across extraction tests.
pub fn employee_sheet(rows: Vec<Vec<Cell>>) -> SheetSpec {
    let mut all = vec![vec![
        Text("Full Name"),
        Text("Age"),
        Text("Salary"),
        Text("Join Date"),
        Text("Last Active"),
    ]];
    all.extend(rows);
    SheetSpec::new("Employees", all)
}
