use thiserror::Error;

use crate::model::{GroupId, ItemId};

/// Failures raised by the interaction engine itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("a {active} session is already active (pointer {pointer_id})")]
    ConcurrentSession { active: &'static str, pointer_id: u64 },

    #[error("group set needs at least one free-form group to catch unmatched items")]
    NoFallbackGroup,

    #[error("duplicate group id '{0}'")]
    DuplicateGroup(GroupId),

    #[error("unknown item {0}")]
    UnknownItem(ItemId),

    #[error("unknown group '{0}'")]
    UnknownGroup(GroupId),
}

/// Failures reported by the storage collaborators (files, remote writes).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("item {0} not found")]
    NotFound(ItemId),
}
