//! # User Actions RBAC
//!
//! Action-visibility resolution for a caller's role.
//!
//! ## Components
//!
//! - `RoleCache` / `RoleLoader` - Role documents, cached per role id
//! - `FilterResolver` - Static filters and registered dynamic filter hooks
//! - `ActionEvaluator` - One existence check per action rule
//! - `VisibilityAggregator` - Concurrent fan-out and "true wins" merge
//! - `ActionGate` - Authorization of a single action, executor notification

pub mod action_evaluator;
pub mod action_gate;
pub mod filter_resolver;
pub mod role_cache;
pub mod role_loader;
pub mod visibility;

#[cfg(test)]
mod testing;

pub use action_evaluator::ActionEvaluator;
pub use action_gate::{ActionExecutor, ActionGate, ActionRun, ChannelExecutor, GateDecision};
pub use filter_resolver::{
    FilterHook, FilterHookRegistry, FilterResolver, FnHook, HookError, HookOutput,
};
pub use role_cache::RoleCache;
pub use role_loader::RoleLoader;
pub use visibility::{merge_verdicts, VisibilityAggregator};
