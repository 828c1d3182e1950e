//! Record schemas: static field tables and their resolved binding lists.
//!
//! A record type describes its fields once, in declaration order, through the
//! [`record!`](crate::record) macro. Each [`Field`] carries the ordered list of
//! spreadsheet column names it accepts (the first is its primary name), its
//! [`Shape`], and plain function pointers that assign a coerced value to the
//! field and read it back for export.
//!
//! [`resolve`] narrows a field table to the fields that carry binding
//! metadata. The result is computed once per record type and shared through a
//! process-wide cache.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

use log::debug;

use crate::{
    cell::CellValue,
    coerce::{Coerced, Shape},
    error::{CoercionError, ExtractError},
};

/// Assigns a coerced value (or the absent policy, for `None`) to one field.
pub type Assign<R> = fn(&mut R, Option<Coerced>) -> Result<(), CoercionError>;

/// Reads one field back as a cell value.
pub type Read<R> = fn(&R) -> Option<CellValue>;

/// Static description of one record field.
pub struct Field<R> {
    pub ident: &'static str,
    /// Acceptable column names; the first is the primary name. Empty when the
    /// field carries no binding metadata.
    pub columns: &'static [&'static str],
    pub shape: Shape,
    pub assign: Assign<R>,
    pub read: Read<R>,
}

impl<R> Field<R> {
    pub fn is_bound(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Header text used when writing this field back out.
    pub fn header(&self) -> &'static str {
        self.columns.first().copied().unwrap_or(self.ident)
    }
}

impl<R> fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("ident", &self.ident)
            .field("columns", &self.columns)
            .field("shape", &self.shape)
            .finish()
    }
}

/// A type that can be populated from one worksheet row.
///
/// Implemented through [`record!`](crate::record).
pub trait Record: Default + 'static {
    /// Every field, in declaration order.
    fn fields() -> &'static [Field<Self>];

    fn record_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// The bound fields of a record type, in declaration order.
#[derive(Debug)]
pub struct ResolvedSchema<R: 'static> {
    record: &'static str,
    bound: Vec<&'static Field<R>>,
}

impl<R: 'static> ResolvedSchema<R> {
    pub fn record(&self) -> &'static str {
        self.record
    }

    pub fn fields(&self) -> &[&'static Field<R>] {
        &self.bound
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

type SchemaCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static RESOLVED: LazyLock<SchemaCache> = LazyLock::new(|| RwLock::new(HashMap::new()));

/// Resolve the bound fields of `R`, failing when none carry binding metadata.
pub fn resolve<R: Record>() -> Result<Arc<ResolvedSchema<R>>, ExtractError> {
    let schema = cached::<R>().unwrap_or_else(|| {
        let computed = Arc::new(build::<R>());
        let mut cache = RESOLVED.write().unwrap_or_else(PoisonError::into_inner);
        let entry = cache
            .entry(TypeId::of::<R>())
            .or_insert_with(|| computed.clone() as Arc<dyn Any + Send + Sync>);
        Arc::clone(entry)
            .downcast::<ResolvedSchema<R>>()
            .unwrap_or(computed)
    });
    if schema.is_empty() {
        return Err(ExtractError::MissingBindingMetadata {
            record: schema.record,
        });
    }
    Ok(schema)
}

fn cached<R: Record>() -> Option<Arc<ResolvedSchema<R>>> {
    let cache = RESOLVED.read().unwrap_or_else(PoisonError::into_inner);
    cache
        .get(&TypeId::of::<R>())
        .and_then(|entry| Arc::clone(entry).downcast::<ResolvedSchema<R>>().ok())
}

fn build<R: Record>() -> ResolvedSchema<R> {
    let bound = R::fields()
        .iter()
        .filter(|field| field.is_bound())
        .collect::<Vec<_>>();
    debug!(
        "Resolved {} bound field(s) of {} for {}",
        bound.len(),
        R::fields().len(),
        R::record_name()
    );
    ResolvedSchema {
        record: R::record_name(),
        bound,
    }
}

/// Implement [`Record`] for a struct by listing its fields.
///
/// Each entry names a field, its type, and optionally the column names it
/// binds to. Fields without column names are filled only in no-header mode.
///
/// ```
/// use sheet_records::record;
///
/// #[derive(Debug, Default)]
/// struct Employee {
///     name: String,
///     age: Option<u32>,
///     notes: String,
/// }
///
/// record!(Employee {
///     name: String => ["Full Name", "Name"],
///     age: Option<u32> => ["Age"],
///     notes: String,
/// });
///
/// use sheet_records::Record;
/// assert_eq!(Employee::fields()[0].header(), "Full Name");
/// assert_eq!(Employee::fields()[2].header(), "notes");
/// ```
#[macro_export]
macro_rules! record {
    (
        $record:ident {
            $( $field:ident : $ty:ty $( => [ $($column:literal),* $(,)? ] )? ),* $(,)?
        }
    ) => {
        impl $crate::Record for $record {
            fn fields() -> &'static [$crate::Field<Self>] {
                static FIELDS: &[$crate::Field<$record>] = &[
                    $(
                        $crate::Field {
                            ident: stringify!($field),
                            columns: &[ $( $($column),* )? ],
                            shape: <$ty as $crate::CellType>::SHAPE,
                            assign: |record: &mut $record, value: ::std::option::Option<$crate::Coerced>| {
                                record.$field = <$ty as $crate::CellType>::from_slot(value)?;
                                Ok(())
                            },
                            read: |record: &$record| $crate::CellType::to_cell(&record.$field),
                        }
                    ),*
                ];
                FIELDS
            }

            fn record_name() -> &'static str {
                stringify!($record)
            }
        }
    };
}
