//! # User Actions Store
//!
//! Record store adapters for the `QueryService` port.
//!
//! ## Structure
//!
//! - `in_memory` - Thread-safe in-memory store, for tests, demos and the CLI

pub mod in_memory;

pub use in_memory::{InMemoryRecordStore, StoreError};
