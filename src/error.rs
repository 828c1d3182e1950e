//! Error types surfaced by extraction and export.
//!
//! [`ExtractError`] is returned by every extraction entry point; per-cell
//! conversion problems are described by [`CoercionError`] and always reach the
//! caller wrapped in [`ExtractError::ValueCoercion`] with the offending row and
//! column attached.

use thiserror::Error;

/// Boxed error produced by a caller-supplied row mapping function.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no field of `{record}` is bound to a spreadsheet column")]
    MissingBindingMetadata { record: &'static str },

    #[error("worksheet '{name}' not found")]
    WorksheetNotFound { name: String },

    #[error("worksheet index must be between 1 and {count} (got {index})")]
    WorksheetIndexOutOfRange { index: usize, count: usize },

    #[error("unable to read spreadsheet: {source}")]
    UnreadableSource {
        #[source]
        source: BoxError,
    },

    #[error("error setting field `{field}` from column {column} in row {row}")]
    ValueCoercion {
        row: u32,
        column: u32,
        field: &'static str,
        #[source]
        source: CoercionError,
    },

    #[error("row mapping failed in row {row}")]
    RowMapping {
        row: u32,
        #[source]
        source: BoxError,
    },

    #[error("invalid extractor configuration: {0}")]
    Configuration(String),
}

impl ExtractError {
    pub(crate) fn unreadable<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        ExtractError::UnreadableSource { source: err.into() }
    }

    /// Row and column of a coercion failure, if this error is one.
    pub fn cell_position(&self) -> Option<(u32, u32)> {
        match self {
            ExtractError::ValueCoercion { row, column, .. } => Some((*row, *column)),
            _ => None,
        }
    }
}

/// A normalized cell value could not be converted into a field's type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert {value} to {target}: {reason}")]
pub struct CoercionError {
    pub value: String,
    pub target: &'static str,
    pub reason: String,
}

impl CoercionError {
    pub fn new(value: impl Into<String>, target: &'static str, reason: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            target,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize records to JSON")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize records to XML: {0}")]
    Xml(String),

    #[error("failed to write xlsx document")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to write export file")]
    Io(#[from] std::io::Error),
}
