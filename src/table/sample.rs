use arrow::array::{Array, Float64Array, StringArray};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single cell value as seen from a [`Sample`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Float(f64),
    Text(String),
    Null,
}

impl Value {
    pub(crate) fn from_array(array: &dyn Array, index: usize) -> Value {
        if array.is_null(index) {
            return Value::Null;
        }
        if let Some(floats) = array.as_any().downcast_ref::<Float64Array>() {
            return Value::Float(floats.value(index));
        }
        if let Some(texts) = array.as_any().downcast_ref::<StringArray>() {
            return Value::Text(texts.value(index).to_string());
        }
        Value::Null
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// One row of a sample table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub values: Vec<(String, Value)>,
}

impl Sample {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}
