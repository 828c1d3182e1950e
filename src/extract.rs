//! Worksheet to record extraction.
//!
//! An [`ExtractorBuilder`] collects [`ExtractOptions`] and is consumed when a
//! source is attached, producing an immutable [`Extractor`]. Every extraction
//! call opens the workbook, selects the worksheet, builds the column mapping
//! for the requested record type and fills one record per used data row. The
//! first failure aborts the call; no partial results are returned.

use std::{io::Read, path::Path};

use log::{debug, info};

use crate::{
    config::{ExtractOptions, SheetSelector},
    error::{BoxError, ExtractError},
    header::HeaderIndex,
    io_utils::{Row, Source, Worksheet},
    mapping::FieldMapping,
    schema::{self, Record},
};

/// Mutable extraction settings, finalized by attaching a source.
#[derive(Debug, Clone, Default)]
pub struct ExtractorBuilder {
    options: ExtractOptions,
}

impl ExtractorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the first used row holds column names (default `true`).
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.options.has_header = has_header;
        self
    }

    /// Select the worksheet by 1-based position; replaces any name selection.
    pub fn worksheet_index(mut self, index: usize) -> Self {
        self.options.worksheet = SheetSelector::Index(index);
        self
    }

    /// Select the worksheet by name; replaces any index selection.
    pub fn worksheet_name(mut self, name: impl Into<String>) -> Self {
        self.options.worksheet = SheetSelector::Name(name.into());
        self
    }

    pub fn options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn from_path(self, path: impl AsRef<Path>) -> Result<Extractor, ExtractError> {
        Ok(self.finish(Source::from_path(path.as_ref())?))
    }

    pub fn from_bytes(self, bytes: impl Into<Vec<u8>>) -> Extractor {
        let bytes: Vec<u8> = bytes.into();
        self.finish(Source::Bytes(bytes.into()))
    }

    pub fn from_reader<R: Read>(self, reader: R) -> Result<Extractor, ExtractError> {
        Ok(self.finish(Source::from_reader(reader)?))
    }

    fn finish(self, source: Source) -> Extractor {
        Extractor {
            source,
            options: self.options,
        }
    }
}

/// A configured spreadsheet source ready for extraction.
#[derive(Debug, Clone)]
pub struct Extractor {
    source: Source,
    options: ExtractOptions,
}

impl Extractor {
    pub fn builder() -> ExtractorBuilder {
        ExtractorBuilder::new()
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Names of every worksheet in the workbook, in workbook order.
    pub fn worksheet_names(&self) -> Result<Vec<String>, ExtractError> {
        Ok(self.source.open()?.sheet_names())
    }

    /// Header index of the selected worksheet.
    pub fn header_index(&self) -> Result<HeaderIndex, ExtractError> {
        let worksheet = self.worksheet()?;
        Ok(HeaderIndex::from_worksheet(&worksheet))
    }

    /// Extract one `R` per used data row through its declared field bindings.
    pub fn extract<R: Record>(&self) -> Result<Vec<R>, ExtractError> {
        if self.options.has_header {
            schema::resolve::<R>()?;
        }
        let worksheet = self.worksheet()?;
        extract_records(&worksheet, self.options.has_header)
    }

    /// Extract through a caller-supplied row function instead of field bindings.
    pub fn extract_with<R, F>(&self, mut map_row: F) -> Result<Vec<R>, ExtractError>
    where
        F: FnMut(&Row<'_>) -> R,
    {
        self.try_extract_with(|row| Ok::<R, BoxError>(map_row(row)))
    }

    /// Like [`Extractor::extract_with`], for row functions that can fail.
    /// Failures are reported as [`ExtractError::RowMapping`] with the row number.
    pub fn try_extract_with<R, E, F>(&self, map_row: F) -> Result<Vec<R>, ExtractError>
    where
        F: FnMut(&Row<'_>) -> Result<R, E>,
        E: Into<BoxError>,
    {
        let worksheet = self.worksheet()?;
        map_rows(&worksheet, self.options.has_header, map_row)
    }

    fn worksheet(&self) -> Result<Worksheet, ExtractError> {
        let mut workbook = self.source.open()?;
        let worksheet = workbook.worksheet(&self.options.worksheet)?;
        debug!(
            "Selected worksheet '{}' ({})",
            worksheet.name(),
            self.options.worksheet
        );
        Ok(worksheet)
    }
}

/// Fill one record per used data row of `worksheet`.
pub fn extract_records<R: Record>(
    worksheet: &Worksheet,
    has_header: bool,
) -> Result<Vec<R>, ExtractError> {
    if worksheet.is_empty() {
        debug!("Worksheet '{}' has no used range", worksheet.name());
        if has_header {
            schema::resolve::<R>()?;
        }
        return Ok(Vec::new());
    }
    let mapping = FieldMapping::<R>::for_worksheet(worksheet, has_header)?;
    info!(
        "Extracting {} from worksheet '{}' with {} bound column(s)",
        R::record_name(),
        worksheet.name(),
        mapping.len()
    );
    let mut records = Vec::new();
    for row in worksheet.data_rows(has_header) {
        let mut record = R::default();
        mapping.apply(&mut record, &row)?;
        records.push(record);
    }
    info!("Extracted {} record(s)", records.len());
    Ok(records)
}

/// Map each used data row of `worksheet` through `map_row`.
pub fn map_rows<R, E, F>(
    worksheet: &Worksheet,
    has_header: bool,
    mut map_row: F,
) -> Result<Vec<R>, ExtractError>
where
    F: FnMut(&Row<'_>) -> Result<R, E>,
    E: Into<BoxError>,
{
    let mut records = Vec::new();
    for row in worksheet.data_rows(has_header) {
        let record = map_row(&row).map_err(|err| ExtractError::RowMapping {
            row: row.number(),
            source: err.into(),
        })?;
        records.push(record);
    }
    info!(
        "Mapped {} row(s) from worksheet '{}'",
        records.len(),
        worksheet.name()
    );
    Ok(records)
}
