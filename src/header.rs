//! Column-name lookup built from a worksheet's header row.

use std::collections::HashMap;

use itertools::Itertools;
use log::debug;

use crate::io_utils::{Row, Worksheet};

/// Header text to 1-based column ordinal.
///
/// Names are matched exactly, without case or whitespace normalization.
/// Non-text header cells are indexed by their display text. When a name
/// appears more than once the right-most occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    columns: HashMap<String, u32>,
}

impl HeaderIndex {
    /// Index the first used row of `worksheet`; empty when the sheet is empty.
    pub fn from_worksheet(worksheet: &Worksheet) -> Self {
        worksheet
            .used_rows()
            .next()
            .map(|row| Self::from_row(&row))
            .unwrap_or_default()
    }

    pub fn from_row(row: &Row<'_>) -> Self {
        let mut columns = HashMap::new();
        for (ordinal, value) in row.cells() {
            let name = value.as_display();
            if let Some(previous) = columns.insert(name, ordinal) {
                debug!(
                    "Header '{}' repeats in columns {previous} and {ordinal}; using {ordinal}",
                    value.as_display()
                );
            }
        }
        Self { columns }
    }

    pub fn ordinal(&self, name: &str) -> Option<u32> {
        self.columns.get(name).copied()
    }

    /// First candidate present in the header, with its ordinal.
    pub fn first_match<'n>(&self, candidates: &[&'n str]) -> Option<(&'n str, u32)> {
        candidates
            .iter()
            .find_map(|name| self.ordinal(name).map(|ordinal| (*name, ordinal)))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// (ordinal, name) pairs sorted by ordinal.
    pub fn entries(&self) -> Vec<(u32, &str)> {
        self.columns
            .iter()
            .map(|(name, ordinal)| (*ordinal, name.as_str()))
            .sorted()
            .collect()
    }
}
