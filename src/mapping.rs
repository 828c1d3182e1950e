//! Column-ordinal to field binding for one worksheet.
//!
//! In header mode each bound field takes the first of its candidate column
//! names that appears in the [`HeaderIndex`]; fields with no match stay at
//! their default value. In no-header mode every declared field binds by
//! position: field `k` binds to the `k`-th column of the used range, counted
//! from its left edge, up to the range's width.

use std::{collections::BTreeMap, ops::RangeInclusive, sync::Arc};

use log::debug;

use crate::{
    error::ExtractError,
    header::HeaderIndex,
    io_utils::{Row, Worksheet},
    schema::{self, Record},
    setter::{self, Setter},
};

pub struct FieldMapping<R> {
    bindings: BTreeMap<u32, Arc<Setter<R>>>,
}

impl<R: Record> FieldMapping<R> {
    /// Bind fields through the header row.
    pub fn from_header(header: &HeaderIndex) -> Result<Self, ExtractError> {
        let schema = schema::resolve::<R>()?;
        let mut mapping = Self {
            bindings: BTreeMap::new(),
        };
        for field in schema.fields() {
            match header.first_match(field.columns) {
                Some((name, ordinal)) => {
                    debug!("Field '{}' bound to column {ordinal} ('{name}')", field.ident);
                    mapping.bind(ordinal, setter::setter_for(field));
                }
                None => debug!(
                    "Field '{}' has no matching column among {:?}",
                    field.ident, field.columns
                ),
            }
        }
        Ok(mapping)
    }

    /// Bind every declared field by position: field `k` takes the `k`-th
    /// ordinal of `columns`.
    pub fn positional(columns: RangeInclusive<u32>) -> Result<Self, ExtractError> {
        let fields = R::fields();
        if fields.is_empty() {
            return Err(ExtractError::MissingBindingMetadata {
                record: R::record_name(),
            });
        }
        let width = columns.clone().count();
        let mut mapping = Self {
            bindings: BTreeMap::new(),
        };
        for (field, ordinal) in fields.iter().zip(columns) {
            mapping.bind(ordinal, setter::setter_for(field));
        }
        if fields.len() > width {
            debug!(
                "{} field(s) of {} left unbound beyond {width} used column(s)",
                fields.len() - width,
                R::record_name()
            );
        }
        Ok(mapping)
    }

    /// Build the mapping for `worksheet` in the requested mode.
    pub fn for_worksheet(worksheet: &Worksheet, has_header: bool) -> Result<Self, ExtractError> {
        if has_header {
            Self::from_header(&HeaderIndex::from_worksheet(worksheet))
        } else {
            Self::positional(worksheet.columns())
        }
    }

    fn bind(&mut self, ordinal: u32, setter: Arc<Setter<R>>) {
        if let Some(previous) = self.bindings.insert(ordinal, setter) {
            debug!(
                "Column {ordinal} rebound from field '{}' to '{}'",
                previous.field(),
                self.bindings[&ordinal].field()
            );
        }
    }

    /// Fill `record` from `row`, reporting the first cell that fails to coerce.
    pub fn apply(&self, record: &mut R, row: &Row<'_>) -> Result<(), ExtractError> {
        for (ordinal, setter) in &self.bindings {
            setter
                .apply(record, row.cell(*ordinal).as_ref())
                .map_err(|source| ExtractError::ValueCoercion {
                    row: row.number(),
                    column: *ordinal,
                    field: setter.field(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Bound (ordinal, field) pairs in column order.
    pub fn bindings(&self) -> impl Iterator<Item = (u32, &'static str)> + '_ {
        self.bindings
            .iter()
            .map(|(ordinal, setter)| (*ordinal, setter.field()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
