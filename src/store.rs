//! Execution collaborator interfaces.
//!
//! Query execution lives outside this core; these traits are the whole
//! surface it talks through. Rows come back as raw JSON values, typed
//! decoding is the caller's concern.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::statement::SelectQuery;

/// Offset/limit window applied by the relational store.
#[derive(Debug, Clone, Copy, Default)]
pub struct Page {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl Page {
    pub fn limited(limit: u64) -> Self {
        Self {
            offset: None,
            limit: Some(limit),
        }
    }
}

/// Executes rendered relational queries.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Run a select, binding the query's positional values in order.
    async fn fetch(&self, query: &SelectQuery, page: Page) -> Result<Vec<JsonValue>>;

    /// Run a count rendering of the same statement.
    async fn fetch_count(&self, query: &SelectQuery) -> Result<u64>;
}

/// Runs aggregation pipelines against the document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run `pipeline` against `collection`, returning at most `limit`
    /// documents.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[JsonValue],
        limit: u32,
    ) -> Result<Vec<JsonValue>>;
}
