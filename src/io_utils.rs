//! Spreadsheet sources, worksheet selection, and row access.
//!
//! Every extraction opens its own workbook through calamine's format
//! auto-detection (xlsx, xlsm, xlsb, xls, ods) and drops it when the
//! extraction returns. The selected worksheet is exposed as a [`Worksheet`]
//! whose [`Row`] views hand out normalized cells by 1-based column ordinal.

use std::{
    fmt,
    fs::File,
    io::{BufReader, Cursor, Read},
    ops::RangeInclusive,
    path::{Path, PathBuf},
    sync::Arc,
};

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use log::debug;

use crate::{
    cell::{self, CellValue},
    config::SheetSelector,
    error::{CoercionError, ExtractError},
    field::CellType,
};

/// Where workbook bytes come from.
#[derive(Clone)]
pub enum Source {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl Source {
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        if path.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(ExtractError::Configuration(
                "file path must not be empty".to_string(),
            ));
        }
        Ok(Source::Path(path.to_path_buf()))
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ExtractError> {
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .map_err(ExtractError::unreadable)?;
        Ok(Source::Bytes(buffer.into()))
    }

    pub fn open(&self) -> Result<Workbook, ExtractError> {
        match self {
            Source::Path(path) => {
                debug!("Opening workbook {path:?}");
                open_workbook_auto(path)
                    .map(Workbook::File)
                    .map_err(ExtractError::unreadable)
            }
            Source::Bytes(bytes) => {
                debug!("Opening in-memory workbook ({} bytes)", bytes.len());
                open_workbook_auto_from_rs(Cursor::new(Arc::clone(bytes)))
                    .map(Workbook::Memory)
                    .map_err(ExtractError::unreadable)
            }
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Source::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// An opened workbook.
pub enum Workbook {
    File(Sheets<BufReader<File>>),
    Memory(Sheets<Cursor<Arc<[u8]>>>),
}

impl Workbook {
    pub fn sheet_names(&self) -> Vec<String> {
        match self {
            Workbook::File(sheets) => sheets.sheet_names(),
            Workbook::Memory(sheets) => sheets.sheet_names(),
        }
    }

    /// Load the worksheet picked by `selector`.
    pub fn worksheet(&mut self, selector: &SheetSelector) -> Result<Worksheet, ExtractError> {
        let names = self.sheet_names();
        let name = match selector {
            SheetSelector::Index(index) => {
                if *index == 0 || *index > names.len() {
                    return Err(ExtractError::WorksheetIndexOutOfRange {
                        index: *index,
                        count: names.len(),
                    });
                }
                names[*index - 1].clone()
            }
            SheetSelector::Name(name) => names
                .iter()
                .find(|candidate| *candidate == name)
                .cloned()
                .ok_or_else(|| ExtractError::WorksheetNotFound { name: name.clone() })?,
        };
        let range = match self {
            Workbook::File(sheets) => sheets.worksheet_range(&name),
            Workbook::Memory(sheets) => sheets.worksheet_range(&name),
        }
        .map_err(ExtractError::unreadable)?;
        Ok(Worksheet::new(name, range))
    }
}

/// The used cells of one worksheet.
pub struct Worksheet {
    name: String,
    range: Range<Data>,
}

impl Worksheet {
    pub fn new(name: String, range: Range<Data>) -> Self {
        Self { name, range }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the worksheet has no used range at all.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Absolute 1-based ordinals spanned by the used range; empty when the
    /// worksheet is empty.
    pub fn columns(&self) -> RangeInclusive<u32> {
        match (self.range.start(), self.range.end()) {
            (Some((_, first)), Some((_, last))) => first + 1..=last + 1,
            _ => 1..=0,
        }
    }

    /// Rows of the used range holding at least one non-blank cell, in order.
    pub fn used_rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        let first = self.range.start().map_or(0, |(row, _)| row);
        self.range
            .rows()
            .enumerate()
            .filter(|(_, cells)| cells.iter().any(|c| cell::normalize(c).is_some()))
            .map(move |(offset, _)| Row {
                number: first + offset as u32 + 1,
                range: &self.range,
            })
    }

    /// Used rows after skipping the header row when `has_header` is set.
    pub fn data_rows(&self, has_header: bool) -> impl Iterator<Item = Row<'_>> + '_ {
        self.used_rows().skip(usize::from(has_header))
    }
}

impl fmt::Debug for Worksheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worksheet")
            .field("name", &self.name)
            .field("start", &self.range.start())
            .field("end", &self.range.end())
            .finish()
    }
}

/// One used worksheet row.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    number: u32,
    range: &'a Range<Data>,
}

impl<'a> Row<'a> {
    /// 1-based worksheet row number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Normalized cell at a 1-based column ordinal; `None` when blank.
    pub fn cell(&self, ordinal: u32) -> Option<CellValue> {
        if ordinal == 0 {
            return None;
        }
        self.range
            .get_value((self.number - 1, ordinal - 1))
            .and_then(cell::normalize)
    }

    /// Cell at `ordinal` converted with the same rules compiled setters use.
    pub fn get<T: CellType>(&self, ordinal: u32) -> Result<T, CoercionError> {
        T::from_cell(self.cell(ordinal).as_ref())
    }

    /// Display text of the cell at `ordinal`, empty when blank.
    pub fn text(&self, ordinal: u32) -> String {
        self.cell(ordinal)
            .map(|value| value.as_display())
            .unwrap_or_default()
    }

    /// Non-blank cells of the row as (ordinal, value) pairs.
    pub fn cells(&self) -> impl Iterator<Item = (u32, CellValue)> + 'a {
        let number = self.number;
        let range = self.range;
        let last = range.end().map_or(0, |(_, col)| col + 1);
        let first = range.start().map_or(1, |(_, col)| col + 1);
        (first..=last).filter_map(move |ordinal| {
            range
                .get_value((number - 1, ordinal - 1))
                .and_then(cell::normalize)
                .map(|value| (ordinal, value))
        })
    }
}

impl fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("number", &self.number)
            .field("cells", &self.cells().collect::<Vec<_>>())
            .finish()
    }
}
