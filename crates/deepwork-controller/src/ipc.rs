//! Message protocol between the controller, extension UIs and pages.

use deepwork_core::TabId;
use serde::{Deserialize, Serialize};

/// Message received by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IncomingMessage {
    /// UI request to enter or leave focus mode
    #[serde(rename = "deepwork:toggle")]
    Toggle { enabled: bool },

    /// Page asking for the stylesheet after it loaded
    #[serde(rename = "deepwork:ensureCSS")]
    EnsureCss,

    #[serde(rename = "deepwork:getState")]
    GetState,
}

/// Message broadcast by the controller to any listening UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControllerMessage {
    #[serde(rename = "deepwork:state")]
    State { enabled: bool },
}

/// Directive sent to a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PageMessage {
    #[serde(rename = "deepwork:applyDark")]
    ApplyDark { enabled: bool },
}

/// Where a message came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageSender {
    /// Set when the sender is a page's content script
    pub tab_id: Option<TabId>,
}

impl MessageSender {
    pub fn extension() -> Self {
        Self { tab_id: None }
    }

    pub fn tab(tab_id: TabId) -> Self {
        Self {
            tab_id: Some(tab_id),
        }
    }
}

/// Reply to a handled message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpcResponse {
    Success { data: serde_json::Value },
    Error { message: String },
}

impl IpcResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        IpcResponse::Success {
            data: serde_json::to_value(data).unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        IpcResponse::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, IpcResponse::Success { .. })
    }
}
