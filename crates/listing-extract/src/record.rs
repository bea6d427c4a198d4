//! The structured listing record

use crate::error::{ExtractError, Result};
use crate::repair::{check_shape, ensure_wrapping_key};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// A validated record: one top-level key wrapping a JSON object.
///
/// The inner fields are whatever the model produced. Use
/// [`ListingRecord::listing`] for a typed view.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    key: String,
    body: Map<String, Value>,
}

impl ListingRecord {
    /// Wrap `value` under `key` if needed and check the result
    pub fn from_value(value: Value, key: &str) -> Result<Self> {
        let value = ensure_wrapping_key(value, key);
        check_shape(&value, key).map_err(|reason| ExtractError::MalformedOutput {
            last_text: value.to_string(),
            reason,
        })?;
        let body = match value {
            Value::Object(mut map) => match map.remove(key) {
                Some(Value::Object(body)) => body,
                _ => Map::new(),
            },
            _ => Map::new(),
        };
        Ok(Self {
            key: key.to_string(),
            body,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The object under the wrapping key
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.key.clone(), Value::Object(self.body.clone()));
        Value::Object(map)
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode the body into the expected listing fields
    pub fn listing(&self) -> Result<CarListing> {
        Ok(CarListing::deserialize(Value::Object(self.body.clone()))?)
    }
}

impl Serialize for ListingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.body)?;
        map.end()
    }
}

/// Fields a car listing is expected to carry. Every field is optional so
/// partial records still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarListing {
    pub body_type: Option<String>,
    pub color: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub manufactured_year: Option<i64>,
    pub motor_size_cc: Option<f64>,
    pub tires: Option<Tires>,
    /// Free-form; the model is not held to a shape here
    pub windows: Option<Value>,
    pub notices: Vec<Notice>,
    pub price: Option<Price>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tires {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub manufactured_year: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notice {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Price {
    pub amount: Option<f64>,
    pub currency: Option<String>,
}
