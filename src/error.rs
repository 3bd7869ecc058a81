//! Engine-specific error types

use thiserror::Error;

use crate::types::{AssetId, ItemId};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Placeholder not found: {placeholder}")]
    Load { placeholder: ItemId },

    #[error("Session state error: {message}")]
    State { message: String },

    #[error("Strategy '{strategy}' failed while solving {placeholder}")]
    Solve {
        strategy: String,
        placeholder: ItemId,
        #[source]
        source: Box<EngineError>,
    },

    #[error("No strategy registered under '{name}'")]
    UnknownStrategy { name: String },

    #[error("Split chain exceeded the configured maximum of {limit}")]
    TooManySplits { limit: u32 },

    #[error("Asset not found: {asset}")]
    AssetMissing { asset: AssetId },

    #[error("Storage operation failed: {message}")]
    Storage { message: String },

    #[error("Notification failed: {message}")]
    Notification { message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
