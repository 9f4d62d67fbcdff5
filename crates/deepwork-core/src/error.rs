//! Error types for Deep Work

use std::time::Duration;
use thiserror::Error;

use crate::types::TabId;

/// Result type alias for Deep Work operations
pub type DeepWorkResult<T> = Result<T, DeepWorkError>;

/// Main error type for Deep Work
///
/// Platform calls made during a focus transition surface these errors, but
/// the controller records and drops them instead of aborting the transition.
#[derive(Error, Debug)]
pub enum DeepWorkError {
    #[error("Tab not found: {0}")]
    TabNotFound(TabId),

    #[error("Tab error: {0}")]
    Tab(String),

    #[error("Injection error: {0}")]
    Injection(String),

    #[error("Rule update error: {0}")]
    Rules(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Messaging error: {0}")]
    Messaging(String),

    #[error("Badge error: {0}")]
    Badge(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeepWorkError {
    /// Create a new tab error
    pub fn tab(msg: impl Into<String>) -> Self {
        Self::Tab(msg.into())
    }

    /// Create a new injection error
    pub fn injection(msg: impl Into<String>) -> Self {
        Self::Injection(msg.into())
    }

    /// Create a new rule update error
    pub fn rules(msg: impl Into<String>) -> Self {
        Self::Rules(msg.into())
    }

    /// Create a new storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Create a new messaging error
    pub fn messaging(msg: impl Into<String>) -> Self {
        Self::Messaging(msg.into())
    }

    /// Create a new badge error
    pub fn badge(msg: impl Into<String>) -> Self {
        Self::Badge(msg.into())
    }

    /// Get the error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            DeepWorkError::TabNotFound(_) | DeepWorkError::Tab(_) => "tab",
            DeepWorkError::Injection(_) => "injection",
            DeepWorkError::Rules(_) => "rules",
            DeepWorkError::Storage(_) => "storage",
            DeepWorkError::Notification(_) => "notification",
            DeepWorkError::Messaging(_) => "messaging",
            DeepWorkError::Badge(_) => "badge",
            DeepWorkError::Timeout(_) => "timeout",
            DeepWorkError::Io(_) => "io",
            DeepWorkError::Json(_) => "json",
        }
    }
}
