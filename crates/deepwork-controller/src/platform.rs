//! Browser platform collaborators.
//!
//! Every call here is best-effort from the controller's point of view: a
//! failure is reported through `DeepWorkResult` and must not leave the
//! collaborator in a state that breaks later calls.

use async_trait::async_trait;
use deepwork_core::{DeepWorkResult, TabId, TabInfo, WindowId};
use deepwork_shield::RuleInstaller;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ipc::{ControllerMessage, PageMessage};

/// Tab inventory and per-tab mute setter
#[async_trait]
pub trait TabService: Send + Sync {
    /// Every open tab in every window
    async fn query_all(&self) -> DeepWorkResult<Vec<TabInfo>>;

    /// The active tab of `window`, or of the current window when `None`
    async fn active_tab(&self, window: Option<WindowId>) -> DeepWorkResult<Option<TabInfo>>;

    async fn get(&self, id: TabId) -> DeepWorkResult<TabInfo>;

    async fn set_muted(&self, id: TabId, muted: bool) -> DeepWorkResult<()>;
}

/// Per-tab style injector and page messenger
#[async_trait]
pub trait Scripting: Send + Sync {
    /// Inject a packaged stylesheet into every frame of the tab
    async fn insert_css(&self, tab: TabId, file: &str) -> DeepWorkResult<()>;

    async fn remove_css(&self, tab: TabId, file: &str) -> DeepWorkResult<()>;

    async fn send_to_tab(&self, tab: TabId, message: PageMessage) -> DeepWorkResult<()>;
}

/// Toolbar badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeState {
    pub text: String,
    pub color: String,
}

#[async_trait]
pub trait BadgeService: Send + Sync {
    async fn set_badge(&self, badge: BadgeState) -> DeepWorkResult<()>;
}

/// One-shot user notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub icon_url: String,
    pub priority: u8,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn create(&self, notification: Notification) -> DeepWorkResult<()>;
}

/// Extension-wide message bus reaching any open UI
#[async_trait]
pub trait RuntimeBus: Send + Sync {
    async fn broadcast(&self, message: ControllerMessage) -> DeepWorkResult<()>;
}

/// Page load progress reported with tab updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Loading,
    Complete,
}

/// Tab lifecycle events delivered to bound listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabEvent {
    Activated { tab_id: TabId, window_id: WindowId },
    Created(TabInfo),
    Updated { tab_id: TabId, status: Option<LoadStatus> },
}

#[async_trait]
pub trait TabEventListener: Send + Sync {
    async fn on_tab_event(&self, event: TabEvent);
}

/// Registration handle returned by [`TabEventSource::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Platform event subscription
///
/// Each `add_listener` call creates a separate registration; callers that
/// need at-most-one registration must track the returned id themselves.
pub trait TabEventSource: Send + Sync {
    fn add_listener(&self, listener: Arc<dyn TabEventListener>) -> ListenerId;

    /// Returns `false` when the id was not registered
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// The full set of browser collaborators used by the controller
#[derive(Clone)]
pub struct Platform {
    pub tabs: Arc<dyn TabService>,
    pub scripting: Arc<dyn Scripting>,
    pub rules: Arc<dyn RuleInstaller>,
    pub badge: Arc<dyn BadgeService>,
    pub notifier: Arc<dyn Notifier>,
    pub runtime: Arc<dyn RuntimeBus>,
    pub tab_events: Arc<dyn TabEventSource>,
}

/// Per-tab outcome of a call fanned out over many tabs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    pub applied: usize,
    pub failed: usize,
}

impl FanOut {
    pub(crate) fn record<T>(&mut self, result: &DeepWorkResult<T>) {
        match result {
            Ok(_) => self.applied += 1,
            Err(_) => self.failed += 1,
        }
    }
}
