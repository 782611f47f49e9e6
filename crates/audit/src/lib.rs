//! # User Actions Audit
//!
//! Audit logging of visibility resolutions and action gate decisions.

mod audit_logger;

pub use audit_logger::{AuditEntry, AuditEventType, AuditLogger, AuditStats};
