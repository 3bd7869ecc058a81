//! Collaborator implementations
//!
//! Production deployments bring their own `Storage` and `Notifier`; this
//! module carries the implementations the crate ships itself.

pub mod memory;

pub use memory::{MemoryStorage, RecordingNotifier};
