//! Common types used throughout Deep Work

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Browser-assigned tab identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

/// Browser-assigned window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Browser tab metadata as reported by the tab inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    /// `None` for tabs the platform has not assigned an id yet (devtools, prerender)
    pub id: Option<TabId>,
    pub window_id: WindowId,
    pub url: Option<String>,
    pub active: bool,
    pub muted: bool,
}

impl TabInfo {
    /// Whether the tab's URL has an http or https scheme.
    ///
    /// Style and script injection is only attempted on these pages.
    pub fn is_web_page(&self) -> bool {
        self.url
            .as_deref()
            .map(|u| u.starts_with("http://") || u.starts_with("https://"))
            .unwrap_or(false)
    }
}
