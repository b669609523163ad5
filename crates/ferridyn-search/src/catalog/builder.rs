use std::collections::HashSet;

use crate::error::SchemaError;

use super::{AttributeDef, GlobalIndex, KeySchema, LocalIndex, TableSchema};

/// Builder for registering a table schema.
pub struct TableSchemaBuilder {
    name: String,
    hash_key: Option<String>,
    range_key: Option<String>,
    global_indexes: Vec<GlobalIndex>,
    local_indexes: Vec<LocalIndex>,
    attributes: Vec<AttributeDef>,
}

impl TableSchemaBuilder {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            hash_key: None,
            range_key: None,
            global_indexes: Vec::new(),
            local_indexes: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Set the table's hash (partition) attribute.
    pub fn hash_key(mut self, name: &str) -> Self {
        self.hash_key = Some(name.to_string());
        self
    }

    /// Set the table's (optional) range (sort) attribute.
    pub fn range_key(mut self, name: &str) -> Self {
        self.range_key = Some(name.to_string());
        self
    }

    /// Append a global secondary index. Declaration order is selection order.
    pub fn global_index(mut self, index: GlobalIndex) -> Self {
        self.global_indexes.push(index);
        self
    }

    /// Append a local secondary index. Declaration order is selection order.
    pub fn local_index(mut self, index: LocalIndex) -> Self {
        self.local_indexes.push(index);
        self
    }

    /// Declare a document attribute.
    pub fn attribute(mut self, attr: AttributeDef) -> Self {
        self.attributes.push(attr);
        self
    }

    /// Validate and produce the schema.
    ///
    /// Index names must be unique across global and local indexes. When any
    /// attributes are declared, every key attribute must be one of them.
    pub fn build(self) -> Result<TableSchema, SchemaError> {
        let hash = self
            .hash_key
            .ok_or_else(|| SchemaError::MissingHashKey(self.name.clone()))?;

        let mut seen = HashSet::new();
        for attr in &self.attributes {
            if !seen.insert(attr.property.as_str()) {
                return Err(SchemaError::AttributeAlreadyExists(attr.property.clone()));
            }
        }

        let schema = TableSchema {
            name: self.name,
            primary_key: KeySchema {
                hash,
                range: self.range_key,
            },
            global_indexes: self.global_indexes,
            local_indexes: self.local_indexes,
            attributes: self.attributes,
        };
        validate_indexes(&schema)?;
        Ok(schema)
    }
}

fn validate_indexes(schema: &TableSchema) -> Result<(), SchemaError> {
    let mut names = HashSet::new();
    let index_names = schema
        .global_indexes
        .iter()
        .map(|i| &i.name)
        .chain(schema.local_indexes.iter().map(|i| &i.name));
    for name in index_names {
        if !names.insert(name.as_str()) {
            return Err(SchemaError::IndexAlreadyExists(name.clone()));
        }
    }

    if schema.attributes.is_empty() {
        return Ok(());
    }

    let declared = |attr: &str| schema.attribute_by_physical(attr).is_some();
    let mut keys: Vec<(&str, &str)> = Vec::new();
    for gsi in &schema.global_indexes {
        keys.push((gsi.name.as_str(), gsi.hash.as_str()));
        if let Some(range) = &gsi.range {
            keys.push((gsi.name.as_str(), range.as_str()));
        }
    }
    for lsi in &schema.local_indexes {
        keys.push((lsi.name.as_str(), lsi.range.as_str()));
    }

    for (index, attribute) in keys {
        if !declared(attribute) {
            return Err(SchemaError::IndexKeyAttributeMissing {
                index: index.to_string(),
                attribute: attribute.to_string(),
            });
        }
    }
    Ok(())
}
