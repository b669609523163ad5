//! # FerridynDB Search
//!
//! An index-aware search layer for DynamoDB-style document stores.
//!
//! Callers describe *what* they want with a declarative filter tree; the
//! search layer decides whether the request can be served by the primary
//! key, a global secondary index, or a local secondary index, compiles the
//! decision into the store's wire-level request fields (key condition,
//! filter expression, placeholders, projection), and drives pagination to
//! completion under one of three termination policies.
//!
//! The store itself is reached through the [`search::ReadCapability`]
//! trait, so the same search code runs against a remote DynamoDB-compatible
//! endpoint, a `ferridyn-server` connection, or an in-memory test double.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ferridyn_search::catalog::{GlobalIndex, TableSchema};
//! use ferridyn_search::search::{ReadCapability, Table};
//!
//! # async fn find_by_email(store: Arc<dyn ReadCapability>) -> ferridyn_search::error::Result<()> {
//! let schema = TableSchema::builder("users")
//!     .hash_key("userId")
//!     .global_index(GlobalIndex::new("byEmail", "email"))
//!     .build()?;
//! let users = Table::new(schema, store);
//!
//! // Served by the `byEmail` index, not a scan.
//! let found = users.search().filter("email", "a@b.com").all().await?;
//! for item in &found.items {
//!     println!("{item}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod decode;
pub mod error;
pub mod search;
pub mod types;
