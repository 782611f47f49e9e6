//! Fixture files: engine config, role documents, records and canned filter hooks
//!
//! ```yaml
//! config:
//!   hookNamespace: userActions
//! roles:
//!   - _id: editor
//!     actions:
//!       - selector: "[data-action='update']"
//!         template: articles
//!         filter: mine
//! records:
//!   articles:
//!     - { _id: a1, owner: u1 }
//! hooks:
//!   mine:
//!     filter: { owner: "$session.userId" }
//! ```

use actions_core::{ActionExecutor, UserActionsService};
use anyhow::Context;
use async_trait::async_trait;
use rbac::{FilterHook, HookError, HookOutput};
use serde::Deserialize;
use serde_json::{Map, Value};
use shared::{is_yaml, EngineConfig, RequestContext, RoleDocument};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use store::InMemoryRecordStore;
use tracing::debug;

const SESSION_PREFIX: &str = "$session.";

/// Contents of a fixture file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fixture {
    pub config: EngineConfig,
    /// Role documents, stored under `config.roleTemplate`
    pub roles: Vec<Value>,
    /// Records by record type
    pub records: BTreeMap<String, Vec<Value>>,
    /// Filter hooks by name, without the namespace
    pub hooks: BTreeMap<String, HookFixture>,
}

/// Canned hook result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookFixture {
    /// Returned filter; top-level `"$session.<key>"` strings are read from the session
    pub filter: Value,
    #[serde(default)]
    pub append_id_and_tp: Option<bool>,
}

#[async_trait]
impl FilterHook for HookFixture {
    async fn compute(
        &self,
        ctx: &RequestContext,
        _role: &RoleDocument,
    ) -> Result<HookOutput, HookError> {
        let filter = match &self.filter {
            Value::Object(fields) => Value::Object(substitute_session(fields, &ctx.session)?),
            other => other.clone(),
        };
        Ok(HookOutput {
            filter,
            append_id_and_tp: self.append_id_and_tp,
        })
    }
}

fn substitute_session(fields: &Map<String, Value>, session: &Value) -> Result<Map<String, Value>, HookError> {
    fields
        .iter()
        .map(|(field, value)| {
            let resolved = match value.as_str().and_then(|s| s.strip_prefix(SESSION_PREFIX)) {
                Some(key) => session
                    .get(key)
                    .cloned()
                    .ok_or_else(|| HookError::new(format!("session has no '{}'", key)))?,
                None => value.clone(),
            };
            Ok((field.clone(), resolved))
        })
        .collect()
}

impl Fixture {
    /// Load a fixture from a JSON or YAML file (chosen by extension)
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        let fixture: Self = if is_yaml(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("invalid YAML fixture {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON fixture {}", path.display()))?
        };
        debug!(
            roles = fixture.roles.len(),
            record_types = fixture.records.len(),
            hooks = fixture.hooks.len(),
            "fixture loaded"
        );
        Ok(fixture)
    }

    /// Fill an in-memory store with the fixture's roles and records
    pub fn store(&self) -> anyhow::Result<InMemoryRecordStore> {
        let store = InMemoryRecordStore::new();
        store.insert_many(&self.config.role_template, self.roles.iter().cloned())?;
        for (record_type, records) in &self.records {
            store.insert_many(record_type, records.iter().cloned())?;
        }
        Ok(store)
    }

    /// Build a service over the fixture's store and hooks
    pub fn service(&self, executor: Option<Arc<dyn ActionExecutor>>) -> anyhow::Result<UserActionsService> {
        let mut builder = UserActionsService::builder(Arc::new(self.store()?)).config(self.config.clone());
        for (name, hook) in &self.hooks {
            builder = builder.hook(name.as_str(), Arc::new(hook.clone()));
        }
        if let Some(executor) = executor {
            builder = builder.executor(executor);
        }
        Ok(builder.build()?)
    }

    /// Parsed role documents; malformed entries are reported
    pub fn role_documents(&self) -> anyhow::Result<Vec<RoleDocument>> {
        self.roles
            .iter()
            .enumerate()
            .map(|(index, role)| {
                RoleDocument::from_record(role.clone())
                    .with_context(|| format!("role #{} is malformed", index))
            })
            .collect()
    }
}
