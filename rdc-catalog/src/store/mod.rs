//! Remote store contract
//!
//! The catalog talks to a hosted relational store offering select / insert /
//! update / delete by table and filter. Bindings classify their own failures
//! into [`StoreErrorKind`] so callers never inspect diagnostic text.

pub mod postgrest;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use postgrest::PostgrestStore;

/// One remote row: field name → scalar / array / string value
pub type Row = Map<String, Value>;

/// Equality filter (`column = value`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Whether a row satisfies this filter (numbers compare by their text form)
    pub fn matches(&self, row: &Row) -> bool {
        match row.get(&self.column) {
            Some(Value::String(s)) => s == &self.value,
            Some(Value::Number(n)) => n.to_string() == self.value,
            Some(Value::Bool(b)) => b.to_string() == self.value,
            _ => false,
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// What went wrong talking to the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Network failure, timeout, or service outage
    Unavailable,
    /// The write referenced a column the table does not have
    MissingColumn { column: Option<String> },
    /// The store answered with an error status
    Rejected { status: u16, code: Option<String> },
    /// The response body could not be understood
    Decode,
}

/// Remote store failure with the store's diagnostic message attached
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn missing_column(column: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::MissingColumn { column },
            message: message.into(),
        }
    }

    pub fn rejected(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Rejected { status, code },
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Decode,
            message: message.into(),
        }
    }

    /// True when this failure means `column` is absent from the table
    ///
    /// A missing-column failure that could not name its column is treated as
    /// matching, since the caller only asks about columns it actually sent.
    pub fn is_missing_column(&self, column: &str) -> bool {
        match &self.kind {
            StoreErrorKind::MissingColumn { column: Some(c) } => c == column,
            StoreErrorKind::MissingColumn { column: None } => true,
            _ => false,
        }
    }

    /// Column the store named as missing, if it named one
    pub fn missing_column_name(&self) -> Option<&str> {
        match &self.kind {
            StoreErrorKind::MissingColumn { column } => column.as_deref(),
            _ => None,
        }
    }

    /// True when the diagnostic suggests a bad or missing API key
    pub fn mentions_api_key(&self) -> bool {
        let lower = self.message.to_lowercase();
        lower.contains("api key") || lower.contains("apikey")
    }
}

/// Hosted table store consumed by the catalog
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch rows matching every filter, optionally ordered
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> Result<Vec<Row>, StoreError>;

    /// Insert rows and return them as stored (with server-assigned fields)
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError>;

    /// Apply `patch` to every row matching the filters; returns affected rows
    async fn update(
        &self,
        table: &str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, StoreError>;

    /// Delete every row matching the filters
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), StoreError>;
}
