//! # User Actions Shared
//!
//! Common types and collaborator ports used across all user actions crates.

pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod query;
pub mod role;

// Re-exports
pub use config::*;
pub use context::*;
pub use error::*;
pub use ids::*;
pub use query::*;
pub use role::*;
