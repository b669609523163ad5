//! Output aggregation: many pages in, one logical result out.

use serde_json::Value;

use crate::decode::ItemDecoder;
use crate::error::DecodeError;
use crate::types::{Key, RawItem};

use super::request::PageResult;

/// Pages merged in fetch order, items still in wire form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedPages {
    pub items: Vec<RawItem>,
    pub count: usize,
    pub scanned_count: usize,
    pub last_evaluated_key: Option<Key>,
}

impl MergedPages {
    /// Concatenate items, sum the counters, keep the last page's token.
    pub fn merge(pages: impl IntoIterator<Item = PageResult>) -> Self {
        let mut merged = MergedPages::default();
        for page in pages {
            merged.items.extend(page.items);
            merged.count += page.count;
            merged.scanned_count += page.scanned_count;
            merged.last_evaluated_key = page.last_evaluated_key;
        }
        merged
    }

    /// Decode every item. See [`ItemDecoder`] for `tolerant`.
    pub fn decode(self, decoder: &dyn ItemDecoder, tolerant: bool) -> Result<SearchOutput, DecodeError> {
        let items = self
            .items
            .into_iter()
            .map(|raw| decoder.decode(raw, tolerant))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SearchOutput {
            items,
            count: self.count,
            scanned_count: self.scanned_count,
            last_evaluated_key: self.last_evaluated_key,
        })
    }
}

/// Result of a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutput {
    pub items: Vec<Value>,
    pub count: usize,
    pub scanned_count: usize,
    /// Resume token; `None` once the store is exhausted.
    pub last_evaluated_key: Option<Key>,
}

impl SearchOutput {
    /// Whether the store reported no further results.
    pub fn is_complete(&self) -> bool {
        self.last_evaluated_key.is_none()
    }
}
