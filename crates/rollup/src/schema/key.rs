//! Grouping key values and their semantic types.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Serialize, Serializer};

/// Semantic type of a grouping key, which decides ordering and filter controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    /// Numbers, hours, ISO weeks and year-months; ordered ascending.
    Numeric,
    /// Dates and timestamps; ordered chronologically.
    Date,
    /// Weekday labels; ordered Monday to Sunday.
    FixedCategorical,
    /// Free-form text; ordered by first occurrence.
    Categorical,
}

impl KeyType {
    /// Common type of a set of keys. Disagreeing keys resolve to
    /// [`KeyType::Categorical`], as does an empty set.
    pub fn resolve<'a>(keys: impl IntoIterator<Item = &'a KeyValue>) -> KeyType {
        let mut resolved = None;
        for key in keys {
            let kind = key.key_type();
            match resolved {
                None => resolved = Some(kind),
                Some(k) if k == kind => {}
                Some(_) => return KeyType::Categorical,
            }
        }
        resolved.unwrap_or(KeyType::Categorical)
    }

    /// Compare two keys of this type.
    ///
    /// Free categorical keys compare equal so a stable sort leaves them in
    /// first-occurrence order.
    pub fn compare(&self, a: &KeyValue, b: &KeyValue) -> Ordering {
        match self {
            KeyType::Numeric => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            },
            KeyType::Date => a.instant().cmp(&b.instant()),
            KeyType::FixedCategorical => a.weekday_index().cmp(&b.weekday_index()),
            KeyType::Categorical => Ordering::Equal,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyType::Numeric => "numeric",
            KeyType::Date => "date",
            KeyType::FixedCategorical => "fixed categorical",
            KeyType::Categorical => "categorical",
        };
        write!(f, "{name}")
    }
}

/// One grouping key value.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Number(f64),
    /// Calendar year-month, rendered `YYYY-MM`.
    Month { year: i32, month: u32 },
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Weekday(Weekday),
    Text(String),
}

impl KeyValue {
    pub fn key_type(&self) -> KeyType {
        match self {
            KeyValue::Number(_) | KeyValue::Month { .. } => KeyType::Numeric,
            KeyValue::Date(_) | KeyValue::Timestamp(_) => KeyType::Date,
            KeyValue::Weekday(_) => KeyType::FixedCategorical,
            KeyValue::Text(_) => KeyType::Categorical,
        }
    }

    /// Numeric position of the key. Year-months map to `year * 100 + month`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            KeyValue::Number(v) => Some(*v),
            KeyValue::Month { year, month } => Some(f64::from(*year * 100 + *month as i32)),
            _ => None,
        }
    }

    /// Calendar date of a date or timestamp key.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            KeyValue::Date(d) => Some(*d),
            KeyValue::Timestamp(dt) => Some(dt.date()),
            _ => None,
        }
    }

    fn instant(&self) -> Option<NaiveDateTime> {
        match self {
            KeyValue::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            KeyValue::Timestamp(dt) => Some(*dt),
            _ => None,
        }
    }

    fn weekday_index(&self) -> Option<u32> {
        match self {
            KeyValue::Weekday(w) => Some(w.num_days_from_monday()),
            _ => None,
        }
    }

    /// Text form used for display, export and category filters. Distinct
    /// values of one variant always get distinct labels.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Number(v) => write!(f, "{}", format_number(*v)),
            KeyValue::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            KeyValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            KeyValue::Timestamp(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            KeyValue::Weekday(w) => write!(f, "{}", weekday_name(*w)),
            KeyValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl Serialize for KeyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            KeyValue::Number(v) => serializer.serialize_f64(*v),
            other => serializer.serialize_str(&other.label()),
        }
    }
}

/// Full English weekday name.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Shortest text that parses back to the same number; whole numbers have no
/// fractional part.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Avoid "-0"
        return "0".to_string();
    }
    value.to_string()
}
