//! Compiled per-field setters and their process-wide cache.
//!
//! Compiling a setter selects the coercion routine for the field's shape once
//! and pairs it with the field's assignment function. Setters are memoized by
//! field identity (record type plus field name) for the lifetime of the
//! process; concurrent first accesses converge on the first stored setter.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

use log::trace;

use crate::{
    cell::CellValue,
    coerce::{Coercer, Shape, coercer_for},
    error::CoercionError,
    schema::{Assign, Field, Record},
};

pub struct Setter<R> {
    field: &'static str,
    shape: Shape,
    coercer: Coercer,
    assign: Assign<R>,
}

impl<R> Setter<R> {
    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Coerce `cell` and store it in `record`. A blank cell applies the field's
    /// absent policy.
    pub fn apply(&self, record: &mut R, cell: Option<&CellValue>) -> Result<(), CoercionError> {
        let coerced = cell
            .map(|value| (self.coercer)(value, &self.shape))
            .transpose()?;
        (self.assign)(record, coerced)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FieldKey {
    record: TypeId,
    field: &'static str,
}

type SetterCache = RwLock<HashMap<FieldKey, Arc<dyn Any + Send + Sync>>>;

static SETTERS: LazyLock<SetterCache> = LazyLock::new(|| RwLock::new(HashMap::new()));

/// Build a setter for one field without consulting the cache.
pub fn compile<R: Record>(field: &Field<R>) -> Setter<R> {
    trace!(
        "Compiling setter for {}.{} ({})",
        R::record_name(),
        field.ident,
        field.shape.describe()
    );
    Setter {
        field: field.ident,
        shape: field.shape,
        coercer: coercer_for(field.shape.kind),
        assign: field.assign,
    }
}

/// Fetch the cached setter for a field, compiling it on first use.
pub fn setter_for<R: Record>(field: &Field<R>) -> Arc<Setter<R>> {
    let key = FieldKey {
        record: TypeId::of::<R>(),
        field: field.ident,
    };
    {
        let cache = SETTERS.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(setter) = cache
            .get(&key)
            .and_then(|entry| Arc::clone(entry).downcast::<Setter<R>>().ok())
        {
            return setter;
        }
    }
    let compiled = Arc::new(compile(field));
    let mut cache = SETTERS.write().unwrap_or_else(PoisonError::into_inner);
    let entry = cache
        .entry(key)
        .or_insert_with(|| compiled.clone() as Arc<dyn Any + Send + Sync>);
    Arc::clone(entry)
        .downcast::<Setter<R>>()
        .unwrap_or(compiled)
}
