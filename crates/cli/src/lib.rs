//! User Actions CLI - Library half of the `user-actions` binary

pub mod commands;
pub mod fixture;

pub use fixture::{Fixture, HookFixture};
