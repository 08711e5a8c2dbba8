//! Key-value records.
use crate::error::DqlError;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{Iter, Keys},
    HashMap,
};

/// A value stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single value, such as a loss or an epsilon.
    Scalar(f32),

    /// A timestamp in local time.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array.
    Array1(Vec<f32>),

    /// A text value.
    String(String),
}

/// A set of named values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record holding a single scalar.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
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

    /// Inserts a value, replacing the one stored under the same key.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Gets the value stored under `k`.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records. Values of `record` win on shared keys.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Merges another record into this one. Values of `record` win on shared keys.
    pub fn merge_inplace(&mut self, record: Record) {
        self.0.extend(record.0);
    }

    /// Gets a scalar.
    ///
    /// # Errors
    ///
    /// Fails if the key is missing or the value is not a scalar.
    pub fn get_scalar(&self, k: &str) -> Result<f32, DqlError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(DqlError::RecordValueTypeError("Scalar".to_string())),
            None => Err(DqlError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, DqlError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(DqlError::RecordValueTypeError("Array1".to_string())),
            None => Err(DqlError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a string.
    pub fn get_string(&self, k: &str) -> Result<String, DqlError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(DqlError::RecordValueTypeError("String".to_string())),
            None => Err(DqlError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns `true` if the record holds no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let record = Record::from_slice(&[
            ("loss", RecordValue::Scalar(1.5)),
            ("phase", RecordValue::String("train".into())),
        ]);

        assert_eq!(record.get_scalar("loss").unwrap(), 1.5);
        assert_eq!(record.get_string("phase").unwrap(), "train");
        assert!(matches!(
            record.get_scalar("phase"),
            Err(DqlError::RecordValueTypeError(_))
        ));
        assert!(matches!(
            record.get_array1("missing"),
            Err(DqlError::RecordKeyError(_))
        ));
    }

    #[test]
    fn test_merge_prefers_later_values() {
        let mut record = Record::from_scalar("loss", 1.0);
        record.merge_inplace(Record::from_scalar("loss", 2.0));
        let record = record.merge(Record::from_scalar("eps", 0.5));

        assert_eq!(record.len(), 2);
        assert_eq!(record.get_scalar("loss").unwrap(), 2.0);
    }
}
