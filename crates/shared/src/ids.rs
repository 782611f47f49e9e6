//! Conversion of template identifiers into the store's identifier type

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// Identifier representation used by the record store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdFormat {
    /// Identifiers are plain strings
    #[default]
    Plain,
    /// 24-hex-digit object ids, encoded as `{"$oid": "..."}`
    ObjectId,
}

fn object_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[0-9a-fA-F]{24}$").expect("valid object id pattern"))
}

impl IdFormat {
    /// Convert a raw identifier. The error is a human-readable reason.
    pub fn convert(self, raw: &str) -> Result<Value, String> {
        if raw.is_empty() {
            return Err("identifier is empty".to_string());
        }

        match self {
            IdFormat::Plain => Ok(Value::String(raw.to_string())),
            IdFormat::ObjectId => {
                if !object_id_pattern().is_match(raw) {
                    return Err(format!("'{}' is not a valid object id", raw));
                }
                Ok(serde_json::json!({ "$oid": raw.to_ascii_lowercase() }))
            }
        }
    }
}
