//! Query collaborator port
//!
//! The engine never runs queries itself. It hands a [`RecordQuery`] to a
//! [`QueryService`] and only looks at whether anything matched, except when
//! loading a role document, where it needs the first matching record.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// A query against one record type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuery {
    /// Record type (template) to search
    pub record_type: String,

    /// Filter object, passed to the store as-is
    pub filter: Map<String, Value>,

    /// Caller role forwarded to the store; `None` for engine-internal reads
    pub role: Option<String>,

    /// Caller session, forwarded unchanged
    pub session: Value,

    /// Maximum number of records to return from `find`
    pub limit: Option<usize>,
}

impl RecordQuery {
    pub fn new(record_type: impl Into<String>, filter: Map<String, Value>) -> Self {
        Self {
            record_type: record_type.into(),
            filter,
            role: None,
            session: Value::Null,
            limit: None,
        }
    }

    /// Builder: forward the caller's role and session
    pub fn with_caller(mut self, role: impl Into<String>, session: Value) -> Self {
        self.role = Some(role.into());
        self.session = session;
        self
    }

    /// Builder: cap the number of returned records
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Failure reported by the query collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct QueryFailure(pub String);

impl QueryFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<QueryFailure> for crate::UserActionsError {
    fn from(err: QueryFailure) -> Self {
        crate::UserActionsError::Query(err.0)
    }
}

/// External storage/query engine
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Number of records matching the query
    async fn count(&self, query: &RecordQuery) -> Result<u64, QueryFailure>;

    /// Records matching the query, honoring `limit`
    async fn find(&self, query: &RecordQuery) -> Result<Vec<Value>, QueryFailure>;

    /// Whether at least one record matches
    async fn exists(&self, query: &RecordQuery) -> Result<bool, QueryFailure> {
        Ok(self.count(query).await? > 0)
    }
}
