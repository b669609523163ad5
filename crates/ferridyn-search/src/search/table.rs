//! Table handle: schema, read capability, decoder and defaults.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::TableSchema;
use crate::decode::{ItemDecoder, SchemaDecoder};
use crate::error::BoxError;

use super::engine::Search;
use super::request::{PageResult, RequestDescriptor};

/// Read access to the store.
///
/// Implementations must be safe to share between concurrent searches; each
/// search only ever has one call in flight.
#[async_trait]
pub trait ReadCapability: Send + Sync {
    /// Indexed lookup (the request carries a key condition).
    async fn query(&self, request: &RequestDescriptor) -> Result<PageResult, BoxError>;

    /// Full traversal of the table or index.
    async fn scan(&self, request: &RequestDescriptor) -> Result<PageResult, BoxError>;
}

/// Defaults applied to every search started from a [`Table`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub consistent_read: bool,
    /// Per-request `Limit`.
    pub page_limit: Option<u32>,
}

/// A registered table that searches run against.
///
/// Cheap to clone; schema, store and decoder are shared.
#[derive(Clone)]
pub struct Table {
    schema: Arc<TableSchema>,
    store: Arc<dyn ReadCapability>,
    decoder: Arc<dyn ItemDecoder>,
    defaults: SearchDefaults,
}

impl Table {
    /// Uses a [`SchemaDecoder`] and default options.
    pub fn new(schema: TableSchema, store: Arc<dyn ReadCapability>) -> Self {
        let schema = Arc::new(schema);
        Self {
            decoder: Arc::new(SchemaDecoder::new(Arc::clone(&schema))),
            schema,
            store,
            defaults: SearchDefaults::default(),
        }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn ItemDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_defaults(mut self, defaults: SearchDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn defaults(&self) -> &SearchDefaults {
        &self.defaults
    }

    pub(crate) fn store(&self) -> &dyn ReadCapability {
        self.store.as_ref()
    }

    pub(crate) fn decoder(&self) -> &dyn ItemDecoder {
        self.decoder.as_ref()
    }

    /// Start a new search with this table's defaults.
    pub fn search(&self) -> Search<'_> {
        Search::new(self)
    }
}
