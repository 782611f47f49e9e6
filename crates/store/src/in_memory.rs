//! In-Memory Record Store
//!
//! Records are grouped by record type. A filter matches a record when every
//! top-level filter field equals the record's field of the same name. An
//! extended-JSON object id (`{"$oid": "..."}`) compares equal to the plain
//! string form of the same id.

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::{QueryFailure, QueryService, RecordQuery};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Errors raised while writing to the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record for '{record_type}' is not a JSON object")]
    NotAnObject { record_type: String },

    #[error("failed to acquire {0} lock")]
    Lock(&'static str),
}

/// In-memory record store
///
/// Thread-safe implementation using RwLock. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<String, Vec<Value>>>>,
    queries: Arc<AtomicUsize>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. `_tp` is set to the record type when the record has none.
    pub fn insert(&self, record_type: &str, record: Value) -> Result<(), StoreError> {
        let Value::Object(mut fields) = record else {
            return Err(StoreError::NotAnObject {
                record_type: record_type.to_string(),
            });
        };
        fields
            .entry("_tp")
            .or_insert_with(|| Value::String(record_type.to_string()));

        let mut records = self.records.write().map_err(|_| StoreError::Lock("write"))?;
        records
            .entry(record_type.to_string())
            .or_default()
            .push(Value::Object(fields));
        Ok(())
    }

    /// Add many records of one type
    pub fn insert_many(
        &self,
        record_type: &str,
        records: impl IntoIterator<Item = Value>,
    ) -> Result<(), StoreError> {
        for record in records {
            self.insert(record_type, record)?;
        }
        Ok(())
    }

    /// Number of stored records of a type
    pub fn len(&self, record_type: &str) -> usize {
        self.records
            .read()
            .map(|records| records.get(record_type).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of `count`/`find` calls served so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn matching(&self, query: &RecordQuery) -> Result<Vec<Value>, QueryFailure> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let records = self
            .records
            .read()
            .map_err(|_| QueryFailure::new("failed to acquire read lock"))?;
        Ok(records
            .get(&query.record_type)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| matches(record, &query.filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl QueryService for InMemoryRecordStore {
    async fn count(&self, query: &RecordQuery) -> Result<u64, QueryFailure> {
        Ok(self.matching(query)?.len() as u64)
    }

    async fn find(&self, query: &RecordQuery) -> Result<Vec<Value>, QueryFailure> {
        let mut found = self.matching(query)?;
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found)
    }
}

fn matches(record: &Value, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(field, expected)| {
        record
            .get(field)
            .map(|actual| values_equal(actual, expected))
            .unwrap_or(false)
    })
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    if oid(actual).is_none() && oid(expected).is_none() {
        return actual == expected;
    }
    match (id_str(actual), id_str(expected)) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

fn oid(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get("$oid").and_then(Value::as_str),
        _ => None,
    }
}

fn id_str(value: &Value) -> Option<&str> {
    value.as_str().or_else(|| oid(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("filter must be an object"),
        }
    }

    fn store() -> InMemoryRecordStore {
        let store = InMemoryRecordStore::new();
        store
            .insert_many(
                "articles",
                vec![
                    json!({"_id": "a1", "owner": "u1", "state": "draft"}),
                    json!({"_id": "a2", "owner": "u2", "state": "draft"}),
                ],
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_count_matches_all_fields() {
        let store = store();

        let query = RecordQuery::new("articles", filter(json!({"state": "draft"})));
        assert_eq!(store.count(&query).await.unwrap(), 2);

        let query = RecordQuery::new("articles", filter(json!({"state": "draft", "owner": "u1"})));
        assert_eq!(store.count(&query).await.unwrap(), 1);

        let query = RecordQuery::new("articles", filter(json!({"missing": true})));
        assert_eq!(store.count(&query).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_stamps_record_type() {
        let store = store();
        let query = RecordQuery::new("articles", filter(json!({"_id": "a1", "_tp": "articles"})));
        assert!(store.exists(&query).await.unwrap());
    }

    #[tokio::test]
    async fn test_object_id_matches_plain_string() {
        let store = InMemoryRecordStore::new();
        store
            .insert("5451a84c8f3c2e7e34000001", json!({"_id": "x"}))
            .unwrap();

        let query = RecordQuery::new(
            "5451a84c8f3c2e7e34000001",
            filter(json!({"_tp": {"$oid": "5451A84C8F3C2E7E34000001"}})),
        );
        assert_eq!(store.count(&query).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_plain_strings_compare_exactly() {
        let store = store();
        let query = RecordQuery::new("articles", filter(json!({"owner": "U1"})));
        assert_eq!(store.count(&query).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_honors_limit() {
        let store = store();
        let query = RecordQuery::new("articles", Map::new()).with_limit(1);
        assert_eq!(store.find(&query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_record_type_is_empty() {
        let store = store();
        let query = RecordQuery::new("comments", Map::new());
        assert_eq!(store.count(&query).await.unwrap(), 0);
        assert_eq!(store.query_count(), 1);
    }

    #[test]
    fn test_insert_rejects_non_object() {
        let store = InMemoryRecordStore::new();
        let err = store.insert("articles", json!([1])).unwrap_err();
        assert!(matches!(err, StoreError::NotAnObject { .. }));
        assert_eq!(store.len("articles"), 0);
    }

    #[test]
    fn test_clones_share_records() {
        let store = store();
        let clone = store.clone();
        clone.insert("articles", json!({"_id": "a3"})).unwrap();
        assert_eq!(store.len("articles"), 3);
    }
}
