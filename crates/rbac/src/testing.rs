//! Scripted query collaborator for unit tests
//!
//! Role documents are served from an in-memory table. Existence checks are
//! driven by the filter itself:
//! - `"fail": "<msg>"` makes the count fail with that message
//! - `"delay": <ms>` sleeps before answering
//! - `"hit": <bool>` is the answer (defaults to `true`)

use async_trait::async_trait;
use serde_json::Value;
use shared::{QueryFailure, QueryService, RecordQuery, RoleDocument};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const ROLE_TEMPLATE: &str = "roles";

#[derive(Default)]
pub struct ScriptedQuery {
    roles: HashMap<String, Value>,
    fail_role_lookups: Option<String>,
    role_lookups: AtomicUsize,
    existence_checks: AtomicUsize,
    seen: Mutex<Vec<RecordQuery>>,
}

impl ScriptedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: RoleDocument) -> Self {
        let record = serde_json::to_value(&role).unwrap();
        self.roles.insert(role.id.clone(), record);
        self
    }

    pub fn with_raw_role(mut self, id: &str, record: Value) -> Self {
        self.roles.insert(id.to_string(), record);
        self
    }

    pub fn failing_role_lookups(mut self, message: &str) -> Self {
        self.fail_role_lookups = Some(message.to_string());
        self
    }

    pub fn role_lookups(&self) -> usize {
        self.role_lookups.load(Ordering::SeqCst)
    }

    pub fn existence_checks(&self) -> usize {
        self.existence_checks.load(Ordering::SeqCst)
    }

    /// Existence queries seen so far, in arrival order
    pub fn seen(&self) -> Vec<RecordQuery> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryService for ScriptedQuery {
    async fn count(&self, query: &RecordQuery) -> Result<u64, QueryFailure> {
        self.existence_checks.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(query.clone());

        if let Some(ms) = query.filter.get("delay").and_then(Value::as_u64) {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if let Some(message) = query.filter.get("fail").and_then(Value::as_str) {
            return Err(QueryFailure::new(message));
        }
        let hit = query.filter.get("hit").and_then(Value::as_bool).unwrap_or(true);
        Ok(u64::from(hit))
    }

    async fn find(&self, query: &RecordQuery) -> Result<Vec<Value>, QueryFailure> {
        assert_eq!(query.record_type, ROLE_TEMPLATE);
        self.role_lookups.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.fail_role_lookups {
            return Err(QueryFailure::new(message.clone()));
        }
        let id = query.filter.get("_id").and_then(Value::as_str).unwrap_or_default();
        Ok(self.roles.get(id).cloned().into_iter().collect())
    }
}
