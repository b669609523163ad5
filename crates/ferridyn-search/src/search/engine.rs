//! Search builder and pagination engine.
//!
//! A search compiles once, then fetches pages one at a time, feeding each
//! page's `LastEvaluatedKey` into the next request's `ExclusiveStartKey`
//! until its termination policy is met. Any failure aborts the whole search;
//! pages fetched so far are dropped.

use tracing::{debug, warn};

use crate::decode::RawDecoder;
use crate::error::{DownstreamError, Error, Result};
use crate::types::Key;

use super::compile::compile;
use super::condition::Condition;
use super::filter::FilterBuilder;
use super::index::IndexDescriptor;
use super::output::{MergedPages, SearchOutput};
use super::request::{IndexChoice, Order, PageResult, RequestDescriptor, SearchOptions};
use super::table::{ReadCapability, Table};

/// When to stop fetching pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// One request, whatever it returns.
    SinglePage,
    /// Keep going until at least `n` items have been counted or the store is
    /// exhausted.
    Minimum(usize),
    /// Keep going until the store is exhausted.
    Exhaustive,
}

/// A search against one [`Table`].
///
/// Owns its filter and options exclusively; the table's store and catalog
/// are only read.
pub struct Search<'a> {
    table: &'a Table,
    filter: FilterBuilder,
    options: SearchOptions,
    raw: bool,
}

impl<'a> Search<'a> {
    pub(crate) fn new(table: &'a Table) -> Self {
        let defaults = table.defaults();
        Self {
            table,
            filter: FilterBuilder::new(),
            options: SearchOptions {
                consistent_read: defaults.consistent_read,
                limit: defaults.page_limit,
                ..Default::default()
            },
            raw: false,
        }
    }

    // -----------------------------------------------------------------------
    // Filter tree
    // -----------------------------------------------------------------------

    /// Add a condition on `path`. A bare value means equality.
    pub fn filter(mut self, path: &str, condition: impl Into<Condition>) -> Self {
        self.filter = self.filter.filter(path, condition);
        self
    }

    /// Add several conditions as one AND-ed group.
    pub fn filter_all<'p>(mut self, conditions: impl IntoIterator<Item = (&'p str, Condition)>) -> Self {
        self.filter = self.filter.filter_all(conditions);
        self
    }

    pub fn or(mut self) -> Self {
        self.filter = self.filter.or();
        self
    }

    pub fn and(self) -> Self {
        self
    }

    /// Nested group built from an isolated child builder.
    pub fn group(mut self, build: impl FnOnce(FilterBuilder) -> FilterBuilder) -> Self {
        self.filter = self.filter.group(build);
        self
    }

    // -----------------------------------------------------------------------
    // Options
    // -----------------------------------------------------------------------

    /// Use a named global or local secondary index instead of selecting one.
    pub fn using_index(mut self, name: &str) -> Self {
        self.options.index = IndexChoice::Named(name.to_string());
        self
    }

    pub fn using_index_descriptor(mut self, descriptor: IndexDescriptor) -> Self {
        self.options.index = IndexChoice::Descriptor(descriptor);
        self
    }

    /// Per-request item limit.
    pub fn limit(mut self, n: u32) -> Self {
        self.options.limit = Some(n);
        self
    }

    pub fn consistent_read(mut self, consistent: bool) -> Self {
        self.options.consistent_read = consistent;
        self
    }

    /// Only valid when the search resolves to an indexed lookup.
    pub fn ascending(mut self) -> Self {
        self.options.order = Some(Order::Ascending);
        self
    }

    /// Only valid when the search resolves to an indexed lookup.
    pub fn descending(mut self) -> Self {
        self.options.order = Some(Order::Descending);
        self
    }

    /// Return only these properties or attributes. Dotted names address
    /// nested attributes, as in filters.
    pub fn select<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.options.projection = names.iter().map(|n| n.as_ref().to_string()).collect();
        self
    }

    /// Ask only for counts. Overrides any projection.
    pub fn count(mut self) -> Self {
        self.options.count = true;
        self
    }

    /// Resume from a previous result's `last_evaluated_key`.
    pub fn start_key(mut self, key: Key) -> Self {
        self.options.start_key = Some(key);
        self
    }

    /// Skip schema decoding; items are plain conversions of the wire values.
    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    /// Compile the request without sending it.
    pub fn get_input(&self) -> Result<RequestDescriptor> {
        let tree = self.filter.clone().build()?;
        compile(&tree, self.table.schema(), &self.options)
    }

    /// Fetch a single page.
    pub async fn execute(self) -> Result<SearchOutput> {
        self.run(Termination::SinglePage).await
    }

    /// Fetch pages until at least `n` items were counted or the store runs out.
    pub async fn minimum(self, n: usize) -> Result<SearchOutput> {
        self.run(Termination::Minimum(n)).await
    }

    /// Fetch every page.
    pub async fn all(self) -> Result<SearchOutput> {
        self.run(Termination::Exhaustive).await
    }

    pub async fn run(self, termination: Termination) -> Result<SearchOutput> {
        let request = self.get_input()?;
        let tolerant = request.is_partial_projection();
        let pages = paginate(self.table.store(), request, termination).await?;
        let merged = MergedPages::merge(pages);
        let output = if self.raw {
            merged.decode(&RawDecoder, tolerant)?
        } else {
            merged.decode(self.table.decoder(), tolerant)?
        };
        Ok(output)
    }
}

/// Drive round trips until `termination` is satisfied.
pub async fn paginate(
    store: &dyn ReadCapability,
    mut request: RequestDescriptor,
    termination: Termination,
) -> Result<Vec<PageResult>> {
    let mut pages = Vec::new();
    let mut counted = 0usize;

    loop {
        let page = fetch(store, &request).await?;
        counted += page.count;
        debug!(
            table = %request.table_name,
            operation = operation(&request),
            page = pages.len() + 1,
            count = page.count,
            scanned_count = page.scanned_count,
            has_more = page.last_evaluated_key.is_some(),
            "fetched page"
        );

        let next = page.last_evaluated_key.clone();
        pages.push(page);

        let Some(next) = next else {
            break;
        };
        match termination {
            Termination::SinglePage => break,
            Termination::Minimum(n) if counted >= n => break,
            Termination::Minimum(_) | Termination::Exhaustive => {
                request.exclusive_start_key = Some(next);
            }
        }
    }

    Ok(pages)
}

fn operation(request: &RequestDescriptor) -> &'static str {
    if request.is_query() { "query" } else { "scan" }
}

async fn fetch(store: &dyn ReadCapability, request: &RequestDescriptor) -> Result<PageResult> {
    let result = if request.is_query() {
        store.query(request).await
    } else if request.scan_index_forward.is_some() {
        // Scans have no ordering; never forward a direction flag.
        let mut stripped = request.clone();
        stripped.scan_index_forward = None;
        store.scan(&stripped).await
    } else {
        store.scan(request).await
    };

    result.map_err(|source| {
        warn!(
            table = %request.table_name,
            operation = operation(request),
            error = %source,
            "read failed"
        );
        Error::from(DownstreamError {
            table: request.table_name.clone(),
            operation: operation(request),
            request: serde_json::to_string(request).unwrap_or_default(),
            source,
        })
    })
}
