//! Error types for all search operations.

use thiserror::Error;

use crate::types::AttrType;

/// Boxed error returned by a read capability implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type for search operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Downstream(#[from] DownstreamError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Catalog and configuration errors.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("index not found: {0}")]
    IndexNotFound(String),

    #[error("index already exists: {0}")]
    IndexAlreadyExists(String),

    #[error("index '{index}' references missing attribute '{attribute}'")]
    IndexKeyAttributeMissing { index: String, attribute: String },

    #[error("attribute already declared: {0}")]
    AttributeAlreadyExists(String),

    #[error("table '{0}' has no hash key")]
    MissingHashKey(String),
}

/// Requests the caller is not allowed to make.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("sort direction cannot be applied to a scan; add a key condition or drop the ordering")]
    ScanOrdering,

    #[error("invalid attribute path '{0}': expected 1 to 4 non-empty segments")]
    InvalidPath(String),

    #[error("operator {operator} expects {expected} operand(s), got {actual}")]
    OperandCount {
        operator: &'static str,
        expected: &'static str,
        actual: usize,
    },
}

/// A read against the store failed.
///
/// Carries the table, the operation, and the JSON-serialized request so the
/// failing call can be reproduced.
#[derive(Debug, Error)]
#[error("{operation} on table '{table}' failed: {source} (request: {request})")]
pub struct DownstreamError {
    pub table: String,
    pub operation: &'static str,
    pub request: String,
    #[source]
    pub source: BoxError,
}

/// Errors converting raw wire items into documents.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("type mismatch for attribute '{attribute}': expected {expected:?}, got {actual}")]
    TypeMismatch {
        attribute: String,
        expected: AttrType,
        actual: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
