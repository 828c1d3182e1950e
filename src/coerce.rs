//! Type-tag driven coercion of normalized cell values.
//!
//! A field's [`Shape`] names the [`Kind`] of value it stores. [`coercer_for`]
//! picks the conversion routine for a kind once; the routine turns any
//! [`CellValue`] into a [`Coerced`] value of that kind or fails with a
//! [`CoercionError`]. Parsing follows one fixed, locale-independent
//! convention.

use std::{str::FromStr, sync::LazyLock};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use log::debug;
use regex::Regex;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use uuid::Uuid;

use crate::{
    cell::{self, CellValue},
    error::CoercionError,
};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-)?(?:(\d+)\.)?(\d{1,2}):(\d{2})(?::(\d{2})(?:\.(\d{1,7}))?)?$")
        .unwrap_or_else(|err| panic!("invalid duration pattern: {err}"))
});

/// The strict value kinds a field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Text,
    Integer,
    Float,
    Decimal,
    Boolean,
    DateTime,
    Date,
    Time,
    Duration,
    Guid,
    Enumeration,
    /// Any other type, parsed from the cell's display text.
    Parsed,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Text => "text",
            Kind::Integer => "integer",
            Kind::Float => "float",
            Kind::Decimal => "decimal",
            Kind::Boolean => "boolean",
            Kind::DateTime => "date-time",
            Kind::Date => "date",
            Kind::Time => "time",
            Kind::Duration => "duration",
            Kind::Guid => "uuid",
            Kind::Enumeration => "enumeration",
            Kind::Parsed => "parsed value",
        }
    }
}

/// Static description of a field's type: its kind, whether it may be absent,
/// and (for enumerations) the member names in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub kind: Kind,
    pub nullable: bool,
    pub members: &'static [&'static str],
}

impl Shape {
    pub const fn of(kind: Kind) -> Self {
        Self {
            kind,
            nullable: false,
            members: &[],
        }
    }

    pub const fn enumeration(members: &'static [&'static str]) -> Self {
        Self {
            kind: Kind::Enumeration,
            nullable: false,
            members,
        }
    }

    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    pub fn describe(&self) -> String {
        if self.nullable {
            format!("optional {}", self.kind.as_str())
        } else {
            self.kind.as_str().to_string()
        }
    }
}

/// A cell value converted to the kind a field expects.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Text(String),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Duration(TimeDelta),
    Guid(Uuid),
    /// Index into [`Shape::members`].
    Member(usize),
}

impl Coerced {
    pub(crate) fn mismatch(&self, target: &'static str) -> CoercionError {
        CoercionError::new(
            format!("{self:?}"),
            target,
            "value was coerced for a different kind",
        )
    }
}

pub type Coercer = fn(&CellValue, &Shape) -> Result<Coerced, CoercionError>;

/// Select the conversion routine for a kind.
pub fn coercer_for(kind: Kind) -> Coercer {
    match kind {
        Kind::Text | Kind::Parsed => to_text,
        Kind::Integer => to_integer,
        Kind::Float => to_float,
        Kind::Decimal => to_decimal,
        Kind::Boolean => to_boolean,
        Kind::DateTime => to_datetime,
        Kind::Date => to_date,
        Kind::Time => to_time,
        Kind::Duration => to_duration,
        Kind::Guid => to_guid,
        Kind::Enumeration => to_member,
    }
}

/// Coerce one value according to a shape.
pub fn coerce(value: &CellValue, shape: &Shape) -> Result<Coerced, CoercionError> {
    coercer_for(shape.kind)(value, shape)
}

fn fail(value: &CellValue, shape: &Shape, reason: impl Into<String>) -> CoercionError {
    CoercionError::new(value.describe(), shape.kind.as_str(), reason)
}

fn unsupported(value: &CellValue, shape: &Shape) -> CoercionError {
    fail(
        value,
        shape,
        format!("{} cells cannot hold a {}", value.kind_name(), shape.kind.as_str()),
    )
}

fn to_text(value: &CellValue, _shape: &Shape) -> Result<Coerced, CoercionError> {
    Ok(Coerced::Text(value.as_display()))
}

fn to_integer(value: &CellValue, shape: &Shape) -> Result<Coerced, CoercionError> {
    match value {
        CellValue::Number(n) => {
            let rounded = n.round_ties_even();
            if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
                return Err(fail(value, shape, "number is out of range"));
            }
            Ok(Coerced::Integer(rounded as i64))
        }
        CellValue::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(Coerced::Integer)
            .map_err(|err| fail(value, shape, err.to_string())),
        CellValue::Boolean(b) => Ok(Coerced::Integer(i64::from(*b))),
        _ => Err(unsupported(value, shape)),
    }
}

fn to_float(value: &CellValue, shape: &Shape) -> Result<Coerced, CoercionError> {
    match value {
        CellValue::Number(n) => Ok(Coerced::Float(*n)),
        CellValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Coerced::Float)
            .map_err(|err| fail(value, shape, err.to_string())),
        CellValue::Boolean(b) => Ok(Coerced::Float(if *b { 1.0 } else { 0.0 })),
        _ => Err(unsupported(value, shape)),
    }
}

fn to_decimal(value: &CellValue, shape: &Shape) -> Result<Coerced, CoercionError> {
    match value {
        CellValue::Number(n) => Decimal::from_f64(*n)
            .map(Coerced::Decimal)
            .ok_or_else(|| fail(value, shape, "number cannot be represented as a decimal")),
        CellValue::Text(s) => parse_decimal_literal(s)
            .map(Coerced::Decimal)
            .map_err(|reason| fail(value, shape, reason)),
        CellValue::Boolean(b) => Ok(Coerced::Decimal(Decimal::from(u8::from(*b)))),
        _ => Err(unsupported(value, shape)),
    }
}

fn to_boolean(value: &CellValue, shape: &Shape) -> Result<Coerced, CoercionError> {
    match value {
        CellValue::Boolean(b) => Ok(Coerced::Boolean(*b)),
        CellValue::Number(n) => Ok(Coerced::Boolean(*n != 0.0)),
        CellValue::Text(s) => parse_boolean(s)
            .map(Coerced::Boolean)
            .ok_or_else(|| fail(value, shape, "expected true/false, yes/no, t/f, y/n or 1/0")),
        _ => Err(unsupported(value, shape)),
    }
}

fn to_datetime(value: &CellValue, shape: &Shape) -> Result<Coerced, CoercionError> {
    match value {
        CellValue::DateTime(dt) => Ok(Coerced::DateTime(*dt)),
        CellValue::Number(n) => cell::from_excel_serial(*n)
            .map(Coerced::DateTime)
            .ok_or_else(|| fail(value, shape, "number is not a valid date serial")),
        CellValue::Text(s) => parse_naive_datetime(s)
            .or_else(|_| parse_naive_date(s).map(|d| d.and_time(NaiveTime::MIN)))
            .map(Coerced::DateTime)
            .map_err(|reason| fail(value, shape, reason)),
        _ => Err(unsupported(value, shape)),
    }
}

fn to_date(value: &CellValue, shape: &Shape) -> Result<Coerced, CoercionError> {
    match value {
        CellValue::DateTime(dt) => Ok(Coerced::Date(dt.date())),
        CellValue::Number(n) => cell::from_excel_serial(*n)
            .map(|dt| Coerced::Date(dt.date()))
            .ok_or_else(|| fail(value, shape, "number is not a valid date serial")),
        CellValue::Text(s) => parse_naive_date(s)
            .or_else(|_| parse_naive_datetime(s).map(|dt| dt.date()))
            .map(Coerced::Date)
            .map_err(|reason| fail(value, shape, reason)),
        _ => Err(unsupported(value, shape)),
    }
}

fn to_time(value: &CellValue, shape: &Shape) -> Result<Coerced, CoercionError> {
    match value {
        CellValue::DateTime(dt) => Ok(Coerced::Time(dt.time())),
        CellValue::Duration(d) => {
            if *d < TimeDelta::zero() || *d >= TimeDelta::days(1) {
                return Err(fail(value, shape, "duration does not fit within one day"));
            }
            Ok(Coerced::Time(NaiveTime::MIN + *d))
        }
        CellValue::Number(n) if (0.0..1.0).contains(n) => cell::duration_from_days(*n)
            .map(|d| Coerced::Time(NaiveTime::MIN + d))
            .ok_or_else(|| fail(value, shape, "number is not a valid time fraction")),
        CellValue::Text(s) => parse_naive_time(s)
            .map(Coerced::Time)
            .map_err(|reason| fail(value, shape, reason)),
        _ => Err(unsupported(value, shape)),
    }
}

fn to_duration(value: &CellValue, shape: &Shape) -> Result<Coerced, CoercionError> {
    match value {
        CellValue::Duration(d) => Ok(Coerced::Duration(*d)),
        CellValue::Number(n) => cell::duration_from_days(*n)
            .map(Coerced::Duration)
            .ok_or_else(|| fail(value, shape, "number is not a valid day fraction")),
        CellValue::Text(s) => parse_duration(s)
            .map(Coerced::Duration)
            .map_err(|reason| fail(value, shape, reason)),
        _ => Err(unsupported(value, shape)),
    }
}

fn to_guid(value: &CellValue, shape: &Shape) -> Result<Coerced, CoercionError> {
    match value {
        CellValue::Text(s) => {
            let trimmed = s.trim().trim_matches(|c: char| matches!(c, '{' | '}'));
            Uuid::parse_str(trimmed)
                .map(Coerced::Guid)
                .map_err(|err| fail(value, shape, err.to_string()))
        }
        _ => Err(unsupported(value, shape)),
    }
}

// Unmatched values fall back to the zero (first-declared) member.
fn to_member(value: &CellValue, shape: &Shape) -> Result<Coerced, CoercionError> {
    let index = match value {
        CellValue::Text(s) => {
            let trimmed = s.trim();
            shape
                .members
                .iter()
                .position(|member| member.eq_ignore_ascii_case(trimmed))
                .or_else(|| member_ordinal(trimmed.parse::<f64>().ok()?, shape))
        }
        CellValue::Number(n) => member_ordinal(*n, shape),
        _ => None,
    };
    if shape.members.is_empty() {
        return Err(fail(value, shape, "enumeration declares no members"));
    }
    Ok(Coerced::Member(index.unwrap_or_else(|| {
        debug!(
            "{} matches no member of [{}]; using '{}'",
            value.describe(),
            shape.members.join(", "),
            shape.members[0]
        );
        0
    })))
}

fn member_ordinal(number: f64, shape: &Shape) -> Option<usize> {
    if number.fract() != 0.0 || number < 0.0 {
        return None;
    }
    let ordinal = number as usize;
    (ordinal < shape.members.len()).then_some(ordinal)
}

pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate, String> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| format!("'{value}' is not a recognized date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime, String> {
    let trimmed = value.trim().trim_end_matches('Z');
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| format!("'{value}' is not a recognized date-time"))
}

pub fn parse_naive_time(value: &str) -> Result<NaiveTime, String> {
    let trimmed = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| format!("'{value}' is not a recognized time"))
}

pub fn parse_decimal_literal(value: &str) -> Result<Decimal, String> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|err| format!("'{value}' is not a decimal number: {err}"))
}

/// Parse `[-][d.]hh:mm[:ss[.fffffff]]`.
pub fn parse_duration(value: &str) -> Result<TimeDelta, String> {
    let invalid = || format!("'{value}' is not a recognized duration");
    let captures = DURATION_PATTERN.captures(value.trim()).ok_or_else(invalid)?;
    let number = |index: usize| -> Result<i64, String> {
        captures
            .get(index)
            .map_or(Ok(0), |m| m.as_str().parse::<i64>().map_err(|_| invalid()))
    };
    let (days, hours, minutes, seconds) = (number(2)?, number(3)?, number(4)?, number(5)?);
    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(invalid());
    }
    let nanos = captures.get(6).map_or(Ok(0), |m| {
        format!("{:0<9}", m.as_str())
            .parse::<i64>()
            .map_err(|_| invalid())
    })?;
    let total = TimeDelta::try_days(days)
        .and_then(|d| d.checked_add(&TimeDelta::try_hours(hours)?))
        .and_then(|d| d.checked_add(&TimeDelta::try_minutes(minutes)?))
        .and_then(|d| d.checked_add(&TimeDelta::try_seconds(seconds)?))
        .and_then(|d| d.checked_add(&TimeDelta::nanoseconds(nanos)))
        .ok_or_else(invalid)?;
    Ok(if captures.get(1).is_some() { -total } else { total })
}
