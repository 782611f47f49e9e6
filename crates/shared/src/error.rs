//! Error types for user actions

use serde::Serialize;
use thiserror::Error;

/// How a caller should surface an error to its user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    /// The request itself is wrong
    BadRequest,
    /// Server-side setup is wrong (missing role, broken config)
    Misconfigured,
    /// A collaborator (query service, filter hook) failed
    Upstream,
}

impl StatusClass {
    /// HTTP status code for this class
    pub fn http_status(self) -> u16 {
        match self {
            StatusClass::BadRequest => 400,
            StatusClass::Misconfigured => 500,
            StatusClass::Upstream => 502,
        }
    }
}

/// General user actions error type
#[derive(Debug, Error)]
pub enum UserActionsError {
    /// Required request fields are missing; raised before any I/O
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Role '{role_id}' not found")]
    NotFound { role_id: String },

    #[error("Invalid filter for '{selector}': {reason}")]
    InvalidFilter { selector: String, reason: String },

    #[error("Dynamic filter '{hook}' failed: {reason}")]
    DynamicResolution { hook: String, reason: String },

    #[error("Query error: {0}")]
    Query(String),

    #[error("Missing action: no action selector in request")]
    MissingAction,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl UserActionsError {
    pub fn invalid_filter(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    pub fn dynamic(hook: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DynamicResolution {
            hook: hook.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            UserActionsError::Validation(_) => "validation_error",
            UserActionsError::NotFound { .. } => "not_found",
            UserActionsError::InvalidFilter { .. } => "invalid_filter",
            UserActionsError::DynamicResolution { .. } => "dynamic_resolution_error",
            UserActionsError::Query(_) => "query_error",
            UserActionsError::MissingAction => "missing_action",
            UserActionsError::Config(_) => "config_error",
            UserActionsError::Io(_) => "io_error",
            UserActionsError::Json(_) => "json_error",
            UserActionsError::Yaml(_) => "yaml_error",
        }
    }

    pub fn status_class(&self) -> StatusClass {
        match self {
            UserActionsError::Validation(_)
            | UserActionsError::InvalidFilter { .. }
            | UserActionsError::MissingAction => StatusClass::BadRequest,
            UserActionsError::DynamicResolution { .. } | UserActionsError::Query(_) => {
                StatusClass::Upstream
            }
            UserActionsError::NotFound { .. }
            | UserActionsError::Config(_)
            | UserActionsError::Io(_)
            | UserActionsError::Json(_)
            | UserActionsError::Yaml(_) => StatusClass::Misconfigured,
        }
    }

    pub fn http_status(&self) -> u16 {
        self.status_class().http_status()
    }

    /// Structured body for callers: `{ kind, message, status }`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
            "status": self.http_status(),
        })
    }
}

pub type Result<T> = std::result::Result<T, UserActionsError>;
