//! Configuration types for the user actions engine

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{IdFormat, Result, UserActionsError};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Record type holding role documents
    pub role_template: String,

    /// Prefix of dynamic filter hook names (`<namespace>:<filter>`)
    pub hook_namespace: String,

    /// Role cache entry lifetime; `None` keeps entries for the process lifetime
    pub role_cache_ttl_secs: Option<u64>,

    /// How template ids are converted before being put into a filter
    pub id_format: IdFormat,

    /// Number of audit entries kept in memory
    pub audit_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            role_template: "roles".to_string(),
            hook_namespace: "userActions".to_string(),
            role_cache_ttl_secs: None,
            id_format: IdFormat::Plain,
            audit_capacity: 1000,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON or YAML file (chosen by extension)
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.role_template.is_empty() {
            return Err(UserActionsError::Config("roleTemplate must not be empty".to_string()));
        }
        if self.hook_namespace.is_empty() {
            return Err(UserActionsError::Config("hookNamespace must not be empty".to_string()));
        }
        if self.audit_capacity == 0 {
            return Err(UserActionsError::Config("auditCapacity must be positive".to_string()));
        }
        Ok(())
    }

    pub fn role_cache_ttl(&self) -> Option<Duration> {
        self.role_cache_ttl_secs.map(Duration::from_secs)
    }
}

/// Whether a path names a YAML file
pub fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
