//! Request and response shapes exchanged with the store.
//!
//! Field names serialize in the store's wire casing (`KeyConditionExpression`,
//! `ExclusiveStartKey`, ...), so a descriptor can be forwarded as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{AttributeValue, Key, RawItem};

use super::index::IndexDescriptor;

/// What the store should return for each matching item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Select {
    SpecificAttributes,
    Count,
}

/// Item ordering for an indexed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// How the index for a search is chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IndexChoice {
    /// Let the index selector decide.
    #[default]
    Auto,
    /// A named global or local secondary index.
    Named(String),
    /// A descriptor supplied directly.
    Descriptor(IndexDescriptor),
}

/// Per-search options that feed the compiler.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub index: IndexChoice,
    pub limit: Option<u32>,
    pub consistent_read: bool,
    pub order: Option<Order>,
    pub projection: Vec<String>,
    pub count: bool,
    pub start_key: Option<Key>,
}

/// A compiled query or scan request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestDescriptor {
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_condition_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_names: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_values: BTreeMap<String, AttributeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Select>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_start_key: Option<Key>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_index_forward: Option<bool>,
}

impl RequestDescriptor {
    /// A key condition makes this an indexed lookup; otherwise it is a scan.
    pub fn is_query(&self) -> bool {
        self.key_condition_expression.is_some()
    }

    /// Whether items come back with only some of their attributes.
    pub fn is_partial_projection(&self) -> bool {
        self.projection_expression.is_some()
    }
}

/// One page returned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageResult {
    #[serde(default)]
    pub items: Vec<RawItem>,
    pub count: usize,
    pub scanned_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Key>,
}
