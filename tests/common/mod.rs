//! Shared test support for the engine test suites

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
