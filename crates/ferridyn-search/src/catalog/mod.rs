//! Table schema and index catalog.
//!
//! The catalog is registered once per table and read-only afterwards. It
//! describes the primary key, the global and local secondary indexes in
//! declaration order, and the declared attributes (logical property name to
//! physical attribute name).

pub mod builder;

use serde::{Deserialize, Serialize};

use crate::types::AttrType;

pub use builder::TableSchemaBuilder;

/// Which attributes a secondary index carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Projection {
    All,
    KeysOnly,
    Include(Vec<String>),
}

impl Projection {
    /// Only full projections can evaluate filters on arbitrary attributes.
    pub fn is_all(&self) -> bool {
        matches!(self, Projection::All)
    }
}

/// Hash attribute plus optional range attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchema {
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

/// A global secondary index: owns its own hash attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalIndex {
    pub name: String,
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    pub projection: Projection,
}

impl GlobalIndex {
    /// A hash-only index with an `ALL` projection.
    pub fn new(name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
            range: None,
            projection: Projection::All,
        }
    }

    pub fn range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }
}

/// A local secondary index: shares the table's hash attribute and
/// contributes its own range attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIndex {
    pub name: String,
    pub range: String,
    pub projection: Projection,
}

impl LocalIndex {
    /// An index with an `ALL` projection.
    pub fn new(name: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: range.into(),
            projection: Projection::All,
        }
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }
}

/// A declared document attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Logical property name used by callers.
    pub property: String,
    /// Physical attribute name in the store; defaults to `property`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    pub attr_type: AttrType,
    #[serde(default)]
    pub required: bool,
}

impl AttributeDef {
    pub fn new(property: impl Into<String>, attr_type: AttrType) -> Self {
        Self {
            property: property.into(),
            attribute: None,
            attr_type,
            required: false,
        }
    }

    /// Store the property under a different physical attribute name.
    pub fn stored_as(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The physical attribute name.
    pub fn attribute_name(&self) -> &str {
        self.attribute.as_deref().unwrap_or(&self.property)
    }
}

/// Schema definition for a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub primary_key: KeySchema,
    #[serde(default)]
    pub global_indexes: Vec<GlobalIndex>,
    #[serde(default)]
    pub local_indexes: Vec<LocalIndex>,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
}

impl TableSchema {
    /// Start building a schema for `name`.
    pub fn builder(name: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder::new(name.into())
    }

    /// Resolve a logical property name (or an already-physical attribute
    /// name) to the physical attribute name. Undeclared names pass through.
    pub fn attribute_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.attributes
            .iter()
            .find(|a| a.property == name)
            .map(AttributeDef::attribute_name)
            .unwrap_or(name)
    }

    /// Look up an attribute definition by its physical name.
    pub fn attribute_by_physical(&self, attribute: &str) -> Option<&AttributeDef> {
        self.attributes
            .iter()
            .find(|a| a.attribute_name() == attribute)
    }

    pub fn global_index(&self, name: &str) -> Option<&GlobalIndex> {
        self.global_indexes.iter().find(|i| i.name == name)
    }

    pub fn local_index(&self, name: &str) -> Option<&LocalIndex> {
        self.local_indexes.iter().find(|i| i.name == name)
    }
}
