//! Core types: wire attribute values, raw items, continuation keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A raw item as returned by the store: attribute name to wire value.
pub type RawItem = BTreeMap<String, AttributeValue>;

/// A continuation token (`LastEvaluatedKey` / `ExclusiveStartKey`).
pub type Key = BTreeMap<String, AttributeValue>;

/// A single attribute value in the store's tagged wire form.
///
/// Serializes as DynamoDB JSON, e.g. `{"S": "alice"}` or `{"N": "42"}`.
/// Numbers are carried as strings so no precision is lost in transit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "S")]
    S(String),
    #[serde(rename = "N")]
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "L")]
    L(Vec<AttributeValue>),
    #[serde(rename = "M")]
    M(BTreeMap<String, AttributeValue>),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
}

impl AttributeValue {
    /// Detect the wire type of a JSON value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => AttributeValue::Null(true),
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Number(n) => AttributeValue::N(n.to_string()),
            Value::String(s) => AttributeValue::S(s.clone()),
            Value::Array(items) => AttributeValue::L(items.iter().map(Self::from_json).collect()),
            Value::Object(obj) => AttributeValue::M(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back to plain JSON. Sets become arrays.
    ///
    /// A number string that does not parse is returned as a JSON string
    /// rather than dropped.
    pub fn into_json(self) -> Value {
        match self {
            AttributeValue::S(s) => Value::String(s),
            AttributeValue::N(n) => number_to_json(n),
            AttributeValue::Bool(b) => Value::Bool(b),
            AttributeValue::Null(_) => Value::Null,
            AttributeValue::L(items) => {
                Value::Array(items.into_iter().map(AttributeValue::into_json).collect())
            }
            AttributeValue::M(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect::<Map<String, Value>>(),
            ),
            AttributeValue::Ss(items) => Value::Array(items.into_iter().map(Value::String).collect()),
            AttributeValue::Ns(items) => Value::Array(items.into_iter().map(number_to_json).collect()),
        }
    }

    /// Short wire type tag, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null(_) => "NULL",
            AttributeValue::L(_) => "L",
            AttributeValue::M(_) => "M",
            AttributeValue::Ss(_) => "SS",
            AttributeValue::Ns(_) => "NS",
        }
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        AttributeValue::from_json(&value)
    }
}

fn number_to_json(n: String) -> Value {
    match n.parse::<Number>() {
        Ok(num) => Value::Number(num),
        Err(_) => Value::String(n),
    }
}

/// Convert a JSON object into a raw item / key. Non-object values yield an
/// empty map.
pub fn json_to_item(value: &Value) -> RawItem {
    match value {
        Value::Object(obj) => obj
            .iter()
            .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
            .collect(),
        _ => RawItem::new(),
    }
}

/// The declared type of a document attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrType {
    String,
    Number,
    Boolean,
    List,
    Map,
    StringSet,
    NumberSet,
}

impl AttrType {
    /// Whether a wire value is acceptable for this declared type.
    /// `NULL` is accepted everywhere.
    pub fn accepts(self, value: &AttributeValue) -> bool {
        matches!(
            (self, value),
            (_, AttributeValue::Null(_))
                | (AttrType::String, AttributeValue::S(_))
                | (AttrType::Number, AttributeValue::N(_))
                | (AttrType::Boolean, AttributeValue::Bool(_))
                | (AttrType::List, AttributeValue::L(_))
                | (AttrType::Map, AttributeValue::M(_))
                | (AttrType::StringSet, AttributeValue::Ss(_))
                | (AttrType::NumberSet, AttributeValue::Ns(_))
        )
    }
}
