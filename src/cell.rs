//! Normalized cell values.
//!
//! Every raw calamine [`Data`] value is collapsed into one of a fixed set of
//! runtime kinds before any field-specific coercion runs. Blank cells (and
//! empty strings) normalize to `None`.

use std::fmt;

use calamine::Data;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::coerce::{parse_duration, parse_naive_date, parse_naive_datetime};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Duration(TimeDelta),
    Error(String),
}

impl CellValue {
    /// Name of the runtime kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            CellValue::Text(_) => "text",
            CellValue::Number(_) => "number",
            CellValue::Boolean(_) => "boolean",
            CellValue::DateTime(_) => "date-time",
            CellValue::Duration(_) => "duration",
            CellValue::Error(_) => "error",
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Boolean(b) => b.to_string(),
            CellValue::DateTime(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            CellValue::Duration(d) => format_duration(*d),
            CellValue::Error(e) => e.clone(),
        }
    }

    /// Quoted rendering used inside error messages.
    pub(crate) fn describe(&self) -> String {
        format!("{} '{}'", self.kind_name(), self.as_display())
    }

    /// JSON rendering used by the `dump` command.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CellValue::Boolean(b) => serde_json::Value::Bool(*b),
            other => serde_json::Value::String(other.as_display()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Normalize one raw calamine value.
pub fn normalize(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Boolean(*b)),
        Data::DateTime(dt) => {
            let converted = if dt.is_duration() {
                dt.as_duration().map(CellValue::Duration)
            } else {
                dt.as_datetime().map(CellValue::DateTime)
            };
            converted.or(Some(CellValue::Number(dt.as_f64())))
        }
        Data::DateTimeIso(s) => Some(
            parse_naive_datetime(s)
                .ok()
                .or_else(|| {
                    parse_naive_date(s)
                        .ok()
                        .map(|d| d.and_time(chrono::NaiveTime::MIN))
                })
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
        ),
        Data::DurationIso(s) => Some(
            parse_iso_duration(s)
                .or_else(|| parse_duration(s).ok())
                .map(CellValue::Duration)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
        ),
        Data::Error(e) => Some(CellValue::Error(e.to_string())),
    }
}

/// Convert an Excel serial number (1900 date system) into a date-time.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = excel_epoch()?;
    let millis = (serial * MILLIS_PER_DAY).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

/// Convert a date-time into an Excel serial number (1900 date system).
pub fn to_excel_serial(value: &NaiveDateTime) -> f64 {
    match excel_epoch() {
        Some(epoch) => (*value - epoch).num_milliseconds() as f64 / MILLIS_PER_DAY,
        None => 0.0,
    }
}

/// Fractional days represented by a duration.
pub fn duration_to_days(value: &TimeDelta) -> f64 {
    value.num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Duration represented by a number of fractional days.
pub fn duration_from_days(days: f64) -> Option<TimeDelta> {
    if !days.is_finite() {
        return None;
    }
    TimeDelta::try_milliseconds((days * MILLIS_PER_DAY).round() as i64)
}

fn excel_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30).map(|d| d.and_time(chrono::NaiveTime::MIN))
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

fn format_duration(value: TimeDelta) -> String {
    let sign = if value < TimeDelta::zero() { "-" } else { "" };
    let total = value.abs();
    let days = total.num_days();
    let hours = total.num_hours() % 24;
    let minutes = total.num_minutes() % 60;
    let seconds = total.num_seconds() % 60;
    if days > 0 {
        format!("{sign}{days}.{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
    }
}

// ODS stores durations as ISO 8601, e.g. `PT08H30M00S`.
fn parse_iso_duration(value: &str) -> Option<TimeDelta> {
    let (negative, rest) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let rest = rest.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, t),
        None => (rest, ""),
    };
    let mut millis = 0f64;
    let mut take = |part: &str, units: &[(char, f64)]| -> Option<()> {
        let mut number = String::new();
        for ch in part.chars() {
            if ch.is_ascii_digit() || ch == '.' {
                number.push(ch);
                continue;
            }
            let scale = units.iter().find(|(unit, _)| *unit == ch)?.1;
            millis += number.parse::<f64>().ok()? * scale;
            number.clear();
        }
        number.is_empty().then_some(())
    };
    take(date_part, &[('D', MILLIS_PER_DAY)])?;
    take(
        time_part,
        &[('H', 3_600_000.0), ('M', 60_000.0), ('S', 1_000.0)],
    )?;
    let delta = TimeDelta::try_milliseconds(millis.round() as i64)?;
    Some(if negative { -delta } else { delta })
}
