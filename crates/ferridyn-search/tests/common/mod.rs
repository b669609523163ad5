//! Scripted in-memory read capability for driving the search engine.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use ferridyn_search::catalog::{GlobalIndex, TableSchema};
use ferridyn_search::error::BoxError;
use ferridyn_search::search::{PageResult, ReadCapability, RequestDescriptor, Table};
use ferridyn_search::types::json_to_item;

/// Which call the engine made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Query,
    Scan,
}

/// Replays a fixed list of responses and records every request.
#[derive(Default)]
pub struct ScriptedStore {
    responses: Mutex<VecDeque<Result<PageResult, String>>>,
    pub calls: Mutex<Vec<(Call, RequestDescriptor)>>,
}

impl ScriptedStore {
    pub fn new(responses: Vec<Result<PageResult, String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn pages(pages: Vec<PageResult>) -> Arc<Self> {
        Self::new(pages.into_iter().map(Ok).collect())
    }

    pub fn calls(&self) -> Vec<(Call, RequestDescriptor)> {
        self.calls.lock().clone()
    }

    fn respond(&self, call: Call, request: &RequestDescriptor) -> Result<PageResult, BoxError> {
        self.calls.lock().push((call, request.clone()));
        match self.responses.lock().pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(message.into()),
            None => Err("script exhausted".into()),
        }
    }
}

#[async_trait]
impl ReadCapability for ScriptedStore {
    async fn query(&self, request: &RequestDescriptor) -> Result<PageResult, BoxError> {
        self.respond(Call::Query, request)
    }

    async fn scan(&self, request: &RequestDescriptor) -> Result<PageResult, BoxError> {
        self.respond(Call::Scan, request)
    }
}

/// A page of `n` items with ids `{prefix}{i}`. When `more` is set the page
/// carries the token `{prefix}-end`.
pub fn page(prefix: &str, n: usize, more: bool) -> PageResult {
    let items: Vec<Value> = (0..n)
        .map(|i| json!({"userId": format!("{prefix}{i}"), "status": "active"}))
        .collect();
    PageResult {
        items: items.iter().map(json_to_item).collect(),
        count: n,
        scanned_count: n * 2,
        last_evaluated_key: more.then(|| json_to_item(&json!({"userId": format!("{prefix}-end")}))),
    }
}

pub fn users_schema() -> TableSchema {
    TableSchema::builder("users")
        .hash_key("userId")
        .global_index(GlobalIndex::new("byEmail", "email"))
        .build()
        .unwrap()
}

pub fn users_table(store: Arc<ScriptedStore>) -> Table {
    Table::new(users_schema(), store)
}
