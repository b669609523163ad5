//! Index selection.
//!
//! Priority order, first match wins:
//! 1. Primary key
//! 2. Global secondary indexes, in declaration order (`ALL` projection only)
//! 3. Local secondary indexes, in declaration order (`ALL` projection only),
//!    keyed on the table's hash attribute plus the index's range attribute
//!
//! An index matches when the filter carries an unconditional, key-eligible
//! condition on its hash attribute and, if the index has a range attribute,
//! on that too. No match means the request is a scan.

use serde::{Deserialize, Serialize};

use crate::catalog::{GlobalIndex, LocalIndex, TableSchema};
use crate::error::SchemaError;

use super::filter::{FilterTree, Term, TermId};

/// What kind of index a descriptor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Primary,
    Global,
    Local,
}

/// The hash/range pairing a request is served by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub kind: IndexKind,
    /// Index name; `None` for the primary key.
    pub name: Option<String>,
    pub hash: String,
    pub range: Option<String>,
}

impl IndexDescriptor {
    pub fn primary(schema: &TableSchema) -> Self {
        Self {
            kind: IndexKind::Primary,
            name: None,
            hash: schema.primary_key.hash.clone(),
            range: schema.primary_key.range.clone(),
        }
    }

    pub fn global(index: &GlobalIndex) -> Self {
        Self {
            kind: IndexKind::Global,
            name: Some(index.name.clone()),
            hash: index.hash.clone(),
            range: index.range.clone(),
        }
    }

    /// Local indexes borrow the table's hash attribute.
    pub fn local(schema: &TableSchema, index: &LocalIndex) -> Self {
        Self {
            kind: IndexKind::Local,
            name: Some(index.name.clone()),
            hash: schema.primary_key.hash.clone(),
            range: Some(index.range.clone()),
        }
    }

    /// The `IndexName` to send, if any.
    pub fn index_name(&self) -> Option<&str> {
        match self.kind {
            IndexKind::Primary => None,
            IndexKind::Global | IndexKind::Local => self.name.as_deref(),
        }
    }
}

/// The filter conditions that can drive a key condition on a descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyTerms {
    pub hash: Option<TermId>,
    pub range: Option<TermId>,
}

impl KeyTerms {
    /// Usable as an indexed lookup: hash is required, range only when the
    /// index declares one.
    fn satisfies(&self, descriptor: &IndexDescriptor) -> bool {
        self.hash.is_some() && (descriptor.range.is_none() || self.range.is_some())
    }
}

/// A selected index plus the terms that justified it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSelection {
    pub descriptor: IndexDescriptor,
    pub keys: KeyTerms,
}

/// Pick the best usable index for `tree`, or `None` for a scan.
pub fn select_index(tree: &FilterTree, schema: &TableSchema) -> Option<IndexSelection> {
    let terms = tree.unconditional_terms();

    let primary = IndexDescriptor::primary(schema);
    let globals = schema
        .global_indexes
        .iter()
        .filter(|gsi| gsi.projection.is_all())
        .map(IndexDescriptor::global);
    let locals = schema
        .local_indexes
        .iter()
        .filter(|lsi| lsi.projection.is_all())
        .map(|lsi| IndexDescriptor::local(schema, lsi));

    std::iter::once(primary)
        .chain(globals)
        .chain(locals)
        .find_map(|descriptor| {
            let keys = key_terms(&terms, schema, &descriptor);
            keys.satisfies(&descriptor)
                .then_some(IndexSelection { descriptor, keys })
        })
}

/// Resolve a caller-named index: global indexes first, then local ones.
pub fn resolve_index(schema: &TableSchema, name: &str) -> Result<IndexDescriptor, SchemaError> {
    if let Some(gsi) = schema.global_index(name) {
        return Ok(IndexDescriptor::global(gsi));
    }
    if let Some(lsi) = schema.local_index(name) {
        return Ok(IndexDescriptor::local(schema, lsi));
    }
    Err(SchemaError::IndexNotFound(name.to_string()))
}

/// Match a tree's unconditional terms against an explicitly chosen index.
pub fn match_keys(tree: &FilterTree, schema: &TableSchema, descriptor: &IndexDescriptor) -> KeyTerms {
    key_terms(&tree.unconditional_terms(), schema, descriptor)
}

fn key_terms(terms: &[Term<'_>], schema: &TableSchema, descriptor: &IndexDescriptor) -> KeyTerms {
    KeyTerms {
        hash: key_term(terms, schema, &descriptor.hash),
        range: descriptor
            .range
            .as_deref()
            .and_then(|range| key_term(terms, schema, range)),
    }
}

/// First key-eligible term on `attribute`. Any non-eligible condition on the
/// attribute disqualifies it for this request.
fn key_term(terms: &[Term<'_>], schema: &TableSchema, attribute: &str) -> Option<TermId> {
    let mut on_attribute = terms
        .iter()
        .filter(|t| t.path.is_top_level() && schema.attribute_name(t.path.root()) == attribute)
        .peekable();
    on_attribute.peek()?;

    let mut first = None;
    for term in on_attribute {
        if !term.condition.is_key_eligible() {
            return None;
        }
        first.get_or_insert(term.id);
    }
    first
}
