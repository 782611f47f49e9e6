//! RoleLoader - Fetch role documents through the cache

use serde_json::{Map, Value};
use shared::{QueryService, RecordQuery, Result, RoleDocument, UserActionsError};
use std::sync::Arc;
use tracing::debug;

use crate::RoleCache;

/// Loads role documents, consulting the cache first
#[derive(Clone)]
pub struct RoleLoader {
    query: Arc<dyn QueryService>,
    cache: Arc<RoleCache>,
    role_template: String,
}

impl RoleLoader {
    pub fn new(
        query: Arc<dyn QueryService>,
        cache: Arc<RoleCache>,
        role_template: impl Into<String>,
    ) -> Self {
        Self {
            query,
            cache,
            role_template: role_template.into(),
        }
    }

    pub fn cache(&self) -> &Arc<RoleCache> {
        &self.cache
    }

    /// Load a role document by id
    pub async fn load(&self, role_id: &str) -> Result<Arc<RoleDocument>> {
        if let Some(role) = self.cache.get(role_id) {
            debug!(role_id, "role cache hit");
            return Ok(role);
        }
        debug!(role_id, template = %self.role_template, "role cache miss");

        let mut filter = Map::new();
        filter.insert("_id".to_string(), Value::String(role_id.to_string()));
        let query = RecordQuery::new(self.role_template.as_str(), filter).with_limit(1);

        let record = self
            .query
            .find(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| UserActionsError::NotFound {
                role_id: role_id.to_string(),
            })?;

        let role = RoleDocument::from_record(record).map_err(|e| {
            UserActionsError::Query(format!("malformed role document '{}': {}", role_id, e))
        })?;
        let role = Arc::new(role);

        self.cache.insert(role_id, Arc::clone(&role));
        Ok(role)
    }
}
