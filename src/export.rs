//! Writing extracted records back out as JSON, XML or a new xlsx workbook.
//!
//! The xlsx writer uses the record's field table: one header cell per field
//! (its primary column name, or its identifier when it has none) followed by
//! one row per record. Re-extracting the written workbook with the same record
//! type yields equal values for every bound field.

use std::{fs, path::Path};

use log::info;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde::Serialize;

use crate::{
    cell::{self, CellValue},
    error::ExportError,
    schema::Record,
};

const XML_ROOT: &str = "records";
const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const DURATION_FORMAT: &str = "[h]:mm:ss";

/// Serialize records as a compact JSON array.
pub fn to_json<R: Serialize>(records: &[R]) -> Result<String, ExportError> {
    Ok(serde_json::to_string(records)?)
}

#[derive(Serialize)]
struct XmlEnvelope<'a, R> {
    record: &'a [R],
}

/// Serialize records as `<records><record>…</record>…</records>`.
pub fn to_xml<R: Serialize>(records: &[R]) -> Result<String, ExportError> {
    quick_xml::se::to_string_with_root(XML_ROOT, &XmlEnvelope { record: records })
        .map_err(|err| ExportError::Xml(err.to_string()))
}

pub fn write_xml<R: Serialize>(records: &[R], path: &Path) -> Result<(), ExportError> {
    let xml = to_xml(records)?;
    fs::write(path, xml)?;
    info!("Wrote {} record(s) as XML to {path:?}", records.len());
    Ok(())
}

/// Build an xlsx workbook holding `records` and return its bytes.
pub fn to_xlsx_bytes<R: Record>(records: &[R]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = build_workbook(records)?;
    Ok(workbook.save_to_buffer()?)
}

pub fn write_xlsx<R: Record>(records: &[R], path: &Path) -> Result<(), ExportError> {
    let mut workbook = build_workbook(records)?;
    workbook.save(path)?;
    info!("Wrote {} record(s) as xlsx to {path:?}", records.len());
    Ok(())
}

fn build_workbook<R: Record>(records: &[R]) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let formats = CellFormats::new();

    for (col, field) in R::fields().iter().enumerate() {
        sheet.write_string_with_format(0, column(col)?, field.header(), &formats.header)?;
    }
    for (index, record) in records.iter().enumerate() {
        let row = u32::try_from(index + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, field) in R::fields().iter().enumerate() {
            if let Some(value) = (field.read)(record) {
                write_cell(sheet, row, column(col)?, &value, &formats)?;
            }
        }
    }
    Ok(workbook)
}

struct CellFormats {
    header: Format,
    date: Format,
    datetime: Format,
    duration: Format,
}

impl CellFormats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            date: Format::new().set_num_format(DATE_FORMAT),
            datetime: Format::new().set_num_format(DATETIME_FORMAT),
            duration: Format::new().set_num_format(DURATION_FORMAT),
        }
    }
}

fn column(index: usize) -> Result<u16, XlsxError> {
    u16::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    formats: &CellFormats,
) -> Result<(), XlsxError> {
    match value {
        CellValue::Text(text) | CellValue::Error(text) => {
            sheet.write_string(row, col, text)?;
        }
        CellValue::Number(number) => {
            sheet.write_number(row, col, *number)?;
        }
        CellValue::Boolean(flag) => {
            sheet.write_boolean(row, col, *flag)?;
        }
        CellValue::DateTime(dt) => {
            let format = if dt.time() == chrono::NaiveTime::MIN {
                &formats.date
            } else {
                &formats.datetime
            };
            sheet.write_number_with_format(row, col, cell::to_excel_serial(dt), format)?;
        }
        CellValue::Duration(duration) => {
            sheet.write_number_with_format(
                row,
                col,
                cell::duration_to_days(duration),
                &formats.duration,
            )?;
        }
    }
    Ok(())
}
