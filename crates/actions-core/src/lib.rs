//! # User Actions Core
//!
//! Integration layer with `UserActionsService`, the entry point that wires the
//! role cache, filter hooks, visibility aggregation, action gate, executor and
//! audit log together.

mod user_actions_service;

pub use user_actions_service::{UserActionsService, UserActionsServiceBuilder};

// Re-export dependencies
pub use audit::{AuditEntry, AuditEventType, AuditStats};
pub use rbac::{
    ActionExecutor, ActionRun, ChannelExecutor, FilterHook, FnHook, GateDecision, HookError,
    HookOutput, RoleCache,
};
pub use shared::{EngineConfig, RequestContext, UserActionsError, VisibilityMap};
