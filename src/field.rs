//! Target field types.
//!
//! [`CellType`] is implemented for every type a record field may have. It
//! couples a static [`Shape`] (which selects the coercion routine) with the
//! conversion from the coerced value into the concrete Rust type, the value a
//! field takes when its cell is blank, and the reverse conversion used by
//! export.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use uuid::Uuid;

use crate::{
    cell::CellValue,
    coerce::{self, Coerced, Kind, Shape},
    error::CoercionError,
};

pub trait CellType: Sized {
    const SHAPE: Shape;

    /// Convert a value already coerced according to [`Self::SHAPE`].
    fn from_coerced(value: Coerced) -> Result<Self, CoercionError>;

    /// Value assigned when the bound cell is blank.
    fn absent() -> Self;

    /// Cell written for this value on export; `None` leaves the cell blank.
    fn to_cell(&self) -> Option<CellValue>;

    fn from_slot(value: Option<Coerced>) -> Result<Self, CoercionError> {
        match value {
            Some(value) => Self::from_coerced(value),
            None => Ok(Self::absent()),
        }
    }

    fn from_cell(cell: Option<&CellValue>) -> Result<Self, CoercionError> {
        match cell {
            Some(cell) => Self::from_coerced(coerce::coerce(cell, &Self::SHAPE)?),
            None => Ok(Self::absent()),
        }
    }
}

impl<T: CellType> CellType for Option<T> {
    const SHAPE: Shape = T::SHAPE.nullable();

    fn from_coerced(value: Coerced) -> Result<Self, CoercionError> {
        T::from_coerced(value).map(Some)
    }

    fn absent() -> Self {
        None
    }

    fn to_cell(&self) -> Option<CellValue> {
        self.as_ref().and_then(CellType::to_cell)
    }
}

macro_rules! integer_cell_type {
    ($($ty:ty),* $(,)?) => {$(
        impl CellType for $ty {
            const SHAPE: Shape = Shape::of(Kind::Integer);

            fn from_coerced(value: Coerced) -> Result<Self, CoercionError> {
                match value {
                    Coerced::Integer(number) => <$ty>::try_from(number).map_err(|_| {
                        CoercionError::new(
                            format!("number '{number}'"),
                            stringify!($ty),
                            "number is out of range",
                        )
                    }),
                    other => Err(other.mismatch(stringify!($ty))),
                }
            }

            fn absent() -> Self {
                0
            }

            fn to_cell(&self) -> Option<CellValue> {
                Some(CellValue::Number(*self as f64))
            }
        }
    )*};
}

integer_cell_type!(i8, i16, i32, i64, u8, u16, u32, u64);

impl CellType for f64 {
    const SHAPE: Shape = Shape::of(Kind::Float);

    fn from_coerced(value: Coerced) -> Result<Self, CoercionError> {
        match value {
            Coerced::Float(number) => Ok(number),
            other => Err(other.mismatch("f64")),
        }
    }

    fn absent() -> Self {
        0.0
    }

    fn to_cell(&self) -> Option<CellValue> {
        Some(CellValue::Number(*self))
    }
}

impl CellType for f32 {
    const SHAPE: Shape = Shape::of(Kind::Float);

    fn from_coerced(value: Coerced) -> Result<Self, CoercionError> {
        match value {
            Coerced::Float(number) => Ok(number as f32),
            other => Err(other.mismatch("f32")),
        }
    }

    fn absent() -> Self {
        0.0
    }

    fn to_cell(&self) -> Option<CellValue> {
        Some(CellValue::Number(f64::from(*self)))
    }
}

impl CellType for Decimal {
    const SHAPE: Shape = Shape::of(Kind::Decimal);

    fn from_coerced(value: Coerced) -> Result<Self, CoercionError> {
        match value {
            Coerced::Decimal(number) => Ok(number),
            other => Err(other.mismatch("decimal")),
        }
    }

    fn absent() -> Self {
        Decimal::ZERO
    }

    fn to_cell(&self) -> Option<CellValue> {
        self.to_f64().map(CellValue::Number)
    }
}

impl CellType for bool {
    const SHAPE: Shape = Shape::of(Kind::Boolean);

    fn from_coerced(value: Coerced) -> Result<Self, CoercionError> {
        match value {
            Coerced::Boolean(flag) => Ok(flag),
            other => Err(other.mismatch("boolean")),
        }
    }

    fn absent() -> Self {
        false
    }

    fn to_cell(&self) -> Option<CellValue> {
        Some(CellValue::Boolean(*self))
    }
}

impl CellType for String {
    const SHAPE: Shape = Shape::of(Kind::Text);

    fn from_coerced(value: Coerced) -> Result<Self, CoercionError> {
        match value {
            Coerced::Text(text) => Ok(text),
            other => Err(other.mismatch("text")),
        }
    }

    fn absent() -> Self {
        String::new()
    }

    fn to_cell(&self) -> Option<CellValue> {
        (!self.is_empty()).then(|| CellValue::Text(self.clone()))
    }
}

impl CellType for NaiveDateTime {
    const SHAPE: Shape = Shape::of(Kind::DateTime);

    fn from_coerced(value: Coerced) -> Result<Self, CoercionError> {
        match value {
            Coerced::DateTime(dt) => Ok(dt),
            other => Err(other.mismatch("date-time")),
        }
    }

    fn absent() -> Self {
        NaiveDateTime::default()
    }

    fn to_cell(&self) -> Option<CellValue> {
        Some(CellValue::DateTime(*self))
    }
}

impl CellType for NaiveDate {
    const SHAPE: Shape = Shape::of(Kind::Date);

    fn from_coerced(value: Coerced) -> Result<Self, CoercionError> {
        match value {
            Coerced::Date(date) => Ok(date),
            other => Err(other.mismatch("date")),
        }
    }

    fn absent() -> Self {
        NaiveDate::default()
    }

    fn to_cell(&self) -> Option<CellValue> {
        Some(CellValue::DateTime(self.and_time(NaiveTime::MIN)))
    }
}

impl CellType for NaiveTime {
    const SHAPE: Shape = Shape::of(Kind::Time);

    fn from_coerced(value: Coerced) -> Result<Self, CoercionError> {
        match value {
            Coerced::Time(time) => Ok(time),
            other => Err(other.mismatch("time")),
        }
    }

    fn absent() -> Self {
        NaiveTime::MIN
    }

    fn to_cell(&self) -> Option<CellValue> {
        Some(CellValue::Duration(*self - NaiveTime::MIN))
    }
}

impl CellType for TimeDelta {
    const SHAPE: Shape = Shape::of(Kind::Duration);

    fn from_coerced(value: Coerced) -> Result<Self, CoercionError> {
        match value {
            Coerced::Duration(duration) => Ok(duration),
            other => Err(other.mismatch("duration")),
        }
    }

    fn absent() -> Self {
        TimeDelta::zero()
    }

    fn to_cell(&self) -> Option<CellValue> {
        Some(CellValue::Duration(*self))
    }
}

impl CellType for Uuid {
    const SHAPE: Shape = Shape::of(Kind::Guid);

    fn from_coerced(value: Coerced) -> Result<Self, CoercionError> {
        match value {
            Coerced::Guid(id) => Ok(id),
            other => Err(other.mismatch("uuid")),
        }
    }

    fn absent() -> Self {
        Uuid::nil()
    }

    fn to_cell(&self) -> Option<CellValue> {
        Some(CellValue::Text(self.hyphenated().to_string()))
    }
}

/// Declare a field-compatible enumeration.
///
/// Members are matched case-insensitively by name, or by their zero-based
/// ordinal. Blank cells and unmatched values select the first member.
///
/// ```
/// sheet_records::cell_enum! {
///     pub enum Status { Active, Inactive, Suspended }
/// }
///
/// assert_eq!(Status::default(), Status::Active);
/// assert_eq!(Status::Suspended.as_str(), "Suspended");
/// ```
#[macro_export]
macro_rules! cell_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident { $first:ident $(, $rest:ident)* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis enum $name {
            #[default]
            $first,
            $($rest),*
        }

        impl $name {
            pub const MEMBERS: &'static [&'static str] =
                &[stringify!($first), $(stringify!($rest)),*];
            const ALL: &'static [$name] = &[$name::$first, $($name::$rest),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $name::$first => stringify!($first),
                    $($name::$rest => stringify!($rest)),*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $crate::CellType for $name {
            const SHAPE: $crate::Shape = $crate::Shape::enumeration($name::MEMBERS);

            fn from_coerced(
                value: $crate::Coerced,
            ) -> ::std::result::Result<Self, $crate::CoercionError> {
                match value {
                    $crate::Coerced::Member(index) => {
                        $name::ALL.get(index).copied().ok_or_else(|| {
                            $crate::CoercionError::new(
                                format!("member {index}"),
                                stringify!($name),
                                "no such member",
                            )
                        })
                    }
                    other => Err($crate::CoercionError::new(
                        format!("{other:?}"),
                        stringify!($name),
                        "value was coerced for a different kind",
                    )),
                }
            }

            fn absent() -> Self {
                $name::$first
            }

            fn to_cell(&self) -> ::std::option::Option<$crate::CellValue> {
                Some($crate::CellValue::Text(self.as_str().to_string()))
            }
        }
    };
}

/// Make any `FromStr + Display + Default` type usable as a field.
///
/// The cell's display text is parsed with `FromStr`; parse failures are
/// reported as coercion errors. Blank cells yield `Default::default()`.
#[macro_export]
macro_rules! cell_value_from_str {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::CellType for $ty {
            const SHAPE: $crate::Shape = $crate::Shape::of($crate::Kind::Parsed);

            fn from_coerced(
                value: $crate::Coerced,
            ) -> ::std::result::Result<Self, $crate::CoercionError> {
                match value {
                    $crate::Coerced::Text(text) => text.trim().parse::<$ty>().map_err(|err| {
                        $crate::CoercionError::new(
                            format!("text '{text}'"),
                            stringify!($ty),
                            err.to_string(),
                        )
                    }),
                    other => Err($crate::CoercionError::new(
                        format!("{other:?}"),
                        stringify!($ty),
                        "value was coerced for a different kind",
                    )),
                }
            }

            fn absent() -> Self {
                <$ty as ::std::default::Default>::default()
            }

            fn to_cell(&self) -> ::std::option::Option<$crate::CellValue> {
                Some($crate::CellValue::Text(self.to_string()))
            }
        }
    )+};
}
