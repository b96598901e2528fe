//! Key-value records of learning statistics.
use crate::error::QlearnError;
use chrono::prelude::{DateTime, Local};
use std::{
    collections::{
        btree_map::{IntoIter, Iter, Keys},
        BTreeMap,
    },
    fmt,
};

/// Value stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single value such as a loss or an episode return.
    Scalar(f32),

    /// A timestamp.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array, e.g. TD targets of a batch.
    Array1(Vec<f32>),

    /// A text value.
    String(String),
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => write!(f, "{:.6}", v),
            Self::DateTime(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
            Self::Array1(v) => write!(f, "{:?}", v),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

/// A container of named [`RecordValue`]s.
///
/// Keys are kept sorted so that records print in a stable order.
///
/// ```
/// use qlearn_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("loss", 0.5);
/// record.insert("epsilon", RecordValue::Scalar(0.9));
/// assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(BTreeMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Creates a record holding a single scalar.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(BTreeMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a value, replacing any previous value of the key.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Returns a reference to the value of the key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records. Values of `record` win on duplicate keys.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Gets a scalar value.
    pub fn get_scalar(&self, k: &str) -> Result<f32, QlearnError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(QlearnError::RecordValueTypeError("Scalar".to_string())),
            None => Err(QlearnError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, QlearnError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(QlearnError::RecordValueTypeError("Array1".to_string())),
            None => Err(QlearnError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a string value.
    pub fn get_string(&self, k: &str) -> Result<String, QlearnError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(QlearnError::RecordValueTypeError("String".to_string())),
            None => Err(QlearnError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns `true` if the record has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl IntoIterator for Record {
    type Item = (String, RecordValue);
    type IntoIter = IntoIter<String, RecordValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Record {
    /// Formats scalars and strings as `key=value` pairs. Arrays are omitted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.0.iter() {
            if let RecordValue::Array1(_) = v {
                continue;
            }
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", k, v)?;
            first = false;
        }
        Ok(())
    }
}
