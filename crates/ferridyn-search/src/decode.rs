//! Decoding raw wire items into JSON documents.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::catalog::TableSchema;
use crate::error::DecodeError;
use crate::types::RawItem;

/// Turns a raw item into the caller-facing document.
///
/// `tolerant` is set when the request used a partial projection: attributes
/// missing from the raw item are then expected and must not fail decoding.
pub trait ItemDecoder: Send + Sync {
    fn decode(&self, raw: RawItem, tolerant: bool) -> Result<Value, DecodeError>;
}

/// Schema-driven decoder.
///
/// Renames physical attributes back to their property names, checks declared
/// types, and (unless tolerant) requires every `required` attribute.
/// Undeclared attributes are passed through under their physical name.
pub struct SchemaDecoder {
    schema: Arc<TableSchema>,
}

impl SchemaDecoder {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self { schema }
    }
}

impl ItemDecoder for SchemaDecoder {
    fn decode(&self, raw: RawItem, tolerant: bool) -> Result<Value, DecodeError> {
        if !tolerant {
            for attr in self.schema.attributes.iter().filter(|a| a.required) {
                if !raw.contains_key(attr.attribute_name()) {
                    return Err(DecodeError::MissingAttribute(attr.property.clone()));
                }
            }
        }

        let mut doc = Map::new();
        for (attribute, value) in raw {
            match self.schema.attribute_by_physical(&attribute) {
                Some(def) => {
                    if !def.attr_type.accepts(&value) {
                        return Err(DecodeError::TypeMismatch {
                            attribute: def.property.clone(),
                            expected: def.attr_type,
                            actual: value.type_name(),
                        });
                    }
                    doc.insert(def.property.clone(), value.into_json());
                }
                None => {
                    doc.insert(attribute, value.into_json());
                }
            }
        }
        Ok(Value::Object(doc))
    }
}

/// Plain conversion with no schema mapping or validation.
pub struct RawDecoder;

impl ItemDecoder for RawDecoder {
    fn decode(&self, raw: RawItem, _tolerant: bool) -> Result<Value, DecodeError> {
        Ok(Value::Object(
            raw.into_iter().map(|(k, v)| (k, v.into_json())).collect(),
        ))
    }
}
