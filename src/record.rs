//! Record model shared by every admin page.
//!
//! Pages define their own record structs and a typed field-key enum. The
//! browser, the editor and the data sources only ever see records through
//! the [`Record`] trait and field values through [`Value`].

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;

use chrono::{NaiveDate, NaiveDateTime};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A single field value of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Compare two values for sorting.
    ///
    /// Same-kind values compare naturally. Different kinds order by kind,
    /// NaN sorts after every other number, and lists compare element-wise,
    /// so the result is a total order.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            },
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a
                .iter()
                .zip(b)
                .map(|(x, y)| x.compare(y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    const fn kind_rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Number(_) => 1,
            Self::Date(_) => 2,
            Self::DateTime(_) => 3,
            Self::Text(_) => 4,
            Self::List(_) => 5,
        }
    }

    /// Exact equality against a filter option value.
    pub fn equals_option(&self, option: &str) -> bool {
        match self {
            Self::Text(s) => s == option,
            other => other.to_string() == option,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                #[allow(clippy::cast_possible_truncation)]
                let whole = *n as i64;
                write!(f, "{whole}")
            }
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::DateTime(dt) => write!(f, "{}", dt.format(DATE_TIME_FORMAT)),
            Self::List(items) => {
                let joined: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", joined.join(","))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

/// Typed column key of a record (`keyOf<R>`).
pub trait FieldKey: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// Wire name of the field, e.g. `patient_name`.
    fn name(self) -> &'static str;
}

/// Field values submitted to `create` / `update`.
pub type Patch<K> = BTreeMap<K, Value>;

/// One row of domain data with a stable, unique id.
pub trait Record: Clone + Debug + Send + Sync + 'static {
    type Field: FieldKey;

    fn id(&self) -> &str;

    /// Raw value of a field; `None` when the record has no value for it.
    fn value(&self, field: Self::Field) -> Option<Value>;

    /// Build a new record from a create patch.
    fn from_patch(id: String, patch: &Patch<Self::Field>) -> Result<Self>;

    /// Apply an update patch in place.
    fn apply(&mut self, patch: &Patch<Self::Field>) -> Result<()>;
}

// === Patch accessors used by the page records ===

pub fn patch_text<K: FieldKey>(patch: &Patch<K>, key: K) -> Result<Option<String>> {
    match patch.get(&key) {
        None => Ok(None),
        Some(Value::Text(s)) => Ok(Some(s.clone())),
        Some(other) => Err(eyre!("Field '{}' expects text, got {other}", key.name())),
    }
}

pub fn patch_number<K: FieldKey>(patch: &Patch<K>, key: K) -> Result<Option<f64>> {
    match patch.get(&key) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(*n)),
        Some(other) => Err(eyre!("Field '{}' expects a number, got {other}", key.name())),
    }
}

pub fn patch_bool<K: FieldKey>(patch: &Patch<K>, key: K) -> Result<Option<bool>> {
    match patch.get(&key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(eyre!("Field '{}' expects yes/no, got {other}", key.name())),
    }
}

pub fn patch_date<K: FieldKey>(patch: &Patch<K>, key: K) -> Result<Option<NaiveDate>> {
    match patch.get(&key) {
        None => Ok(None),
        Some(Value::Date(d)) => Ok(Some(*d)),
        Some(other) => Err(eyre!("Field '{}' expects a date, got {other}", key.name())),
    }
}

pub fn patch_date_time<K: FieldKey>(patch: &Patch<K>, key: K) -> Result<Option<NaiveDateTime>> {
    match patch.get(&key) {
        None => Ok(None),
        Some(Value::DateTime(dt)) => Ok(Some(*dt)),
        Some(other) => Err(eyre!("Field '{}' expects a date and time, got {other}", key.name())),
    }
}

/// Unwrap a patch value that a new record cannot do without.
pub fn require<T, K: FieldKey>(value: Option<T>, key: K) -> Result<T> {
    value.ok_or_else(|| eyre!("Field '{}' is required", key.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_stringifies_raw_values() {
        assert_eq!(Value::Number(120.0).to_string(), "120");
        assert_eq!(Value::Number(12.5).to_string(), "12.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2024-03-09");
        let dt = date.and_hms_opt(14, 5, 0).unwrap();
        assert_eq!(Value::DateTime(dt).to_string(), "2024-03-09 14:05");
        let list = Value::List(vec![Value::text("a"), Value::Number(2.0)]);
        assert_eq!(list.to_string(), "a,2");
    }

    #[test]
    fn test_compare_same_kind() {
        assert_eq!(Value::text("a").compare(&Value::text("b")), Ordering::Less);
        assert_eq!(Value::Number(3.0).compare(&Value::Number(2.0)), Ordering::Greater);
        assert_eq!(Value::Bool(false).compare(&Value::Bool(true)), Ordering::Less);
    }

    #[test]
    fn test_compare_mixed_kinds_orders_by_kind() {
        assert_eq!(Value::text("a").compare(&Value::Number(1.0)), Ordering::Greater);
        assert_eq!(Value::Number(1.0).compare(&Value::text("a")), Ordering::Less);
        assert_eq!(Value::Bool(true).compare(&Value::Number(-5.0)), Ordering::Less);

        // a < b and b < c must give a < c across kinds
        let values = [Value::Bool(true), Value::Number(9.0), Value::text("0")];
        assert_eq!(values[0].compare(&values[1]), Ordering::Less);
        assert_eq!(values[1].compare(&values[2]), Ordering::Less);
        assert_eq!(values[0].compare(&values[2]), Ordering::Less);
    }

    #[test]
    fn test_compare_nan_sorts_after_numbers() {
        let nan = Value::Number(f64::NAN);
        assert_eq!(nan.compare(&Value::Number(1.0)), Ordering::Greater);
        assert_eq!(Value::Number(f64::INFINITY).compare(&nan), Ordering::Less);
        assert_eq!(nan.compare(&Value::Number(f64::NAN)), Ordering::Equal);
    }

    #[test]
    fn test_compare_lists_element_wise() {
        let short = Value::List(vec![Value::text("a")]);
        let long = Value::List(vec![Value::text("a"), Value::text("b")]);
        let other = Value::List(vec![Value::text("b")]);
        assert_eq!(short.compare(&long), Ordering::Less);
        assert_eq!(long.compare(&other), Ordering::Less);
        assert_eq!(short.compare(&short.clone()), Ordering::Equal);
    }

    #[test]
    fn test_equals_option_is_exact() {
        assert!(Value::text("active").equals_option("active"));
        assert!(!Value::text("inactive").equals_option("active"));
        assert!(!Value::text("Active").equals_option("active"));
        assert!(Value::Bool(true).equals_option("true"));
        assert!(Value::Number(3.0).equals_option("3"));
    }

    #[test]
    fn test_value_deserializes_untagged() {
        let values: Vec<Value> = serde_json::from_str(r#"["x", 2, true, "2024-01-02"]"#).unwrap();
        assert_eq!(values[0], Value::text("x"));
        assert_eq!(values[1], Value::Number(2.0));
        assert_eq!(values[2], Value::Bool(true));
        assert_eq!(
            values[3],
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        );
    }
}
