//! AuditLogger - Audit logging for user actions

use serde::{Deserialize, Serialize};
use shared::{RequestContext, UserActionsError, VisibilityMap};
use std::collections::VecDeque;

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: String,
    pub event_type: AuditEventType,
    pub role_id: String,
    pub item_id: Option<String>,
    pub template_id: Option<String>,
    pub action: Option<String>,
    pub success: bool,
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Types of audit events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    ControlsResolved,
    ActionAuthorized,
    ActionDenied,
    ResolutionFailed,
}

/// Audit logger
#[derive(Debug)]
pub struct AuditLogger {
    entries: VecDeque<AuditEntry>,
    max_entries: usize,
}

impl AuditLogger {
    /// Create a new AuditLogger
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    /// Log an audit entry
    pub fn log(&mut self, entry: AuditEntry) {
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    fn entry(ctx: &RequestContext, event_type: AuditEventType, action: Option<&str>) -> AuditEntry {
        AuditEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            event_type,
            role_id: ctx.role_id.clone(),
            item_id: ctx.item_id.clone(),
            template_id: ctx.template_id.clone(),
            action: action.map(|a| a.to_string()),
            success: true,
            reason: None,
            metadata: None,
        }
    }

    /// Log a resolved visibility map
    pub fn log_controls_resolved(&mut self, ctx: &RequestContext, visibility: &VisibilityMap) {
        let mut entry = Self::entry(ctx, AuditEventType::ControlsResolved, None);
        entry.metadata = Some(serde_json::json!({ "visible": visibility.visible_selectors() }));
        self.log(entry);
    }

    /// Log a gate decision
    pub fn log_gate_decision(&mut self, ctx: &RequestContext, action: &str, authorized: bool) {
        let event_type = if authorized {
            AuditEventType::ActionAuthorized
        } else {
            AuditEventType::ActionDenied
        };
        let mut entry = Self::entry(ctx, event_type, Some(action));
        entry.success = authorized;
        if !authorized {
            entry.reason = Some(format!("Action '{}' is not visible for role '{}'", action, ctx.role_id));
        }
        self.log(entry);
    }

    /// Log a failed resolution
    pub fn log_failure(&mut self, ctx: &RequestContext, action: Option<&str>, error: &UserActionsError) {
        let mut entry = Self::entry(ctx, AuditEventType::ResolutionFailed, action);
        entry.success = false;
        entry.reason = Some(error.to_string());
        entry.metadata = Some(serde_json::json!({ "kind": error.kind() }));
        self.log(entry);
    }

    /// Get recent entries
    pub fn get_recent(&self, limit: usize) -> Vec<&AuditEntry> {
        self.entries.iter().rev().take(limit).collect()
    }

    /// Get recent gate denials
    pub fn get_recent_denials(&self, limit: usize) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.event_type == AuditEventType::ActionDenied)
            .take(limit)
            .collect()
    }

    /// Get statistics
    pub fn get_stats(&self) -> AuditStats {
        let count = |kind: AuditEventType| self.entries.iter().filter(|e| e.event_type == kind).count();

        AuditStats {
            total_entries: self.entries.len(),
            denial_count: count(AuditEventType::ActionDenied),
            failure_count: count(AuditEventType::ResolutionFailed),
        }
    }

    /// Export as JSON
    pub fn export_json(&self) -> serde_json::Value {
        serde_json::to_value(self.entries.iter().collect::<Vec<_>>()).unwrap_or_default()
    }
}

/// Audit statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total_entries: usize,
    pub denial_count: usize,
    pub failure_count: usize,
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new(10000)
    }
}
