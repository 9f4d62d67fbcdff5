//! In-memory browser used by the integration tests

use async_trait::async_trait;
use deepwork_controller::{
    BadgeService, BadgeState, Clock, ControllerMessage, FocusController, FocusState, ListenerId,
    LoadStatus, MemoryStore, Notification, Notifier, PageMessage, PageOverlay, Platform,
    RuntimeBus, Scripting, StateStore, TabEvent, TabEventListener, TabEventSource, TabService,
};
use deepwork_core::{
    ControllerConfig, DeepWorkError, DeepWorkResult, TabId, TabInfo, Timestamp, WindowId,
};
use deepwork_shield::{BlockRule, RuleInstaller, RuleUpdate};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Window treated as the current one by `active_tab(None)`
pub const CURRENT_WINDOW: WindowId = WindowId(1);

/// Platform calls that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    QueryTabs,
    ActiveTab,
    Rules,
    InsertCss,
    SendToTab,
    Badge,
    Notify,
    Runtime,
    /// Badge call never completes
    HangBadge,
}

#[derive(Default)]
pub struct FakeBrowser {
    tabs: Mutex<BTreeMap<TabId, TabInfo>>,
    active: Mutex<BTreeMap<WindowId, TabId>>,
    css: Mutex<BTreeSet<TabId>>,
    pages: Mutex<BTreeMap<TabId, PageOverlay>>,
    rules: Mutex<Vec<BlockRule>>,
    badge: Mutex<Option<BadgeState>>,
    notifications: Mutex<Vec<Notification>>,
    broadcasts: Mutex<Vec<ControllerMessage>>,
    listeners: Mutex<BTreeMap<u64, Arc<dyn TabEventListener>>>,
    next_listener: AtomicU64,
    faults: Mutex<HashSet<Fault>>,
}

impl FakeBrowser {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Browser with the given `(id, url)` tabs in the current window
    pub fn with_tabs(tabs: &[(i64, &str)], active: i64) -> Arc<Self> {
        let browser = Self::new();
        for &(id, url) in tabs {
            browser.insert_tab(id, CURRENT_WINDOW, url);
        }
        browser.set_active(CURRENT_WINDOW, active);
        browser
    }

    pub fn platform(self: &Arc<Self>) -> Platform {
        Platform {
            tabs: self.clone(),
            scripting: self.clone(),
            rules: self.clone(),
            badge: self.clone(),
            notifier: self.clone(),
            runtime: self.clone(),
            tab_events: self.clone(),
        }
    }

    pub fn fail(&self, fault: Fault) {
        self.faults.lock().unwrap().insert(fault);
    }

    pub fn heal(&self) {
        self.faults.lock().unwrap().clear();
    }

    fn check(&self, fault: Fault, error: impl FnOnce() -> DeepWorkError) -> DeepWorkResult<()> {
        if self.faults.lock().unwrap().contains(&fault) {
            Err(error())
        } else {
            Ok(())
        }
    }

    fn insert_tab(&self, id: i64, window: WindowId, url: &str) -> TabInfo {
        let tab = TabInfo {
            id: Some(TabId(id)),
            window_id: window,
            url: Some(url.to_string()),
            active: false,
            muted: false,
        };
        self.tabs.lock().unwrap().insert(TabId(id), tab.clone());
        self.pages.lock().unwrap().insert(TabId(id), PageOverlay::new());
        tab
    }

    fn set_active(&self, window: WindowId, id: i64) {
        self.active.lock().unwrap().insert(window, TabId(id));
        for tab in self.tabs.lock().unwrap().values_mut() {
            if tab.window_id == window {
                tab.active = tab.id == Some(TabId(id));
            }
        }
    }

    async fn emit(&self, event: TabEvent) {
        let listeners: Vec<_> = self.listeners.lock().unwrap().values().cloned().collect();
        for listener in listeners {
            listener.on_tab_event(event.clone()).await;
        }
    }

    /// Open a tab in the background and notify listeners
    pub async fn open_tab(&self, id: i64, url: &str) {
        let tab = self.insert_tab(id, CURRENT_WINDOW, url);
        self.emit(TabEvent::Created(tab)).await;
    }

    /// Switch the current window to `id` and notify listeners
    pub async fn activate(&self, id: i64) {
        self.set_active(CURRENT_WINDOW, id);
        self.emit(TabEvent::Activated {
            tab_id: TabId(id),
            window_id: CURRENT_WINDOW,
        })
        .await;
    }

    /// Navigate `id` to `url`; the page is fresh and the stylesheet is gone
    pub async fn navigate(&self, id: i64, url: &str) {
        if let Some(tab) = self.tabs.lock().unwrap().get_mut(&TabId(id)) {
            tab.url = Some(url.to_string());
        }
        self.css.lock().unwrap().remove(&TabId(id));
        self.pages.lock().unwrap().insert(TabId(id), PageOverlay::new());
        self.emit(TabEvent::Updated {
            tab_id: TabId(id),
            status: Some(LoadStatus::Loading),
        })
        .await;
        self.emit(TabEvent::Updated {
            tab_id: TabId(id),
            status: Some(LoadStatus::Complete),
        })
        .await;
    }

    pub fn muted(&self) -> Vec<i64> {
        self.tabs
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.muted)
            .filter_map(|t| t.id.map(|id| id.0))
            .collect()
    }

    pub fn styled(&self) -> Vec<i64> {
        self.css.lock().unwrap().iter().map(|id| id.0).collect()
    }

    pub fn is_dark(&self, id: i64) -> bool {
        self.pages
            .lock()
            .unwrap()
            .get(&TabId(id))
            .map(|p| p.is_dark())
            .unwrap_or(false)
    }

    pub fn rule_ids(&self) -> Vec<u32> {
        self.rules.lock().unwrap().iter().map(|r| r.id).collect()
    }

    pub fn add_foreign_rule(&self, rule: BlockRule) {
        self.rules.lock().unwrap().push(rule);
    }

    pub fn badge(&self) -> Option<BadgeState> {
        self.badge.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn broadcasts(&self) -> Vec<ControllerMessage> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

#[async_trait]
impl TabService for FakeBrowser {
    async fn query_all(&self) -> DeepWorkResult<Vec<TabInfo>> {
        self.check(Fault::QueryTabs, || DeepWorkError::tab("tabs.query failed"))?;
        tokio::task::yield_now().await;
        Ok(self.tabs.lock().unwrap().values().cloned().collect())
    }

    async fn active_tab(&self, window: Option<WindowId>) -> DeepWorkResult<Option<TabInfo>> {
        self.check(Fault::ActiveTab, || DeepWorkError::tab("no focused window"))?;
        let window = window.unwrap_or(CURRENT_WINDOW);
        let active = self.active.lock().unwrap().get(&window).copied();
        Ok(active.and_then(|id| self.tabs.lock().unwrap().get(&id).cloned()))
    }

    async fn get(&self, id: TabId) -> DeepWorkResult<TabInfo> {
        self.tabs
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(DeepWorkError::TabNotFound(id))
    }

    async fn set_muted(&self, id: TabId, muted: bool) -> DeepWorkResult<()> {
        tokio::task::yield_now().await;
        let mut tabs = self.tabs.lock().unwrap();
        let tab = tabs.get_mut(&id).ok_or(DeepWorkError::TabNotFound(id))?;
        tab.muted = muted;
        Ok(())
    }
}

#[async_trait]
impl Scripting for FakeBrowser {
    async fn insert_css(&self, tab: TabId, _file: &str) -> DeepWorkResult<()> {
        self.check(Fault::InsertCss, || DeepWorkError::injection("cannot access page"))?;
        let info = self.get(tab).await?;
        if !info.is_web_page() {
            return Err(DeepWorkError::injection("cannot access a privileged page"));
        }
        self.css.lock().unwrap().insert(tab);
        Ok(())
    }

    async fn remove_css(&self, tab: TabId, _file: &str) -> DeepWorkResult<()> {
        self.get(tab).await?;
        self.css.lock().unwrap().remove(&tab);
        Ok(())
    }

    async fn send_to_tab(&self, tab: TabId, message: PageMessage) -> DeepWorkResult<()> {
        self.check(Fault::SendToTab, || {
            DeepWorkError::messaging("Receiving end does not exist")
        })?;
        let mut pages = self.pages.lock().unwrap();
        let page = pages.get_mut(&tab).ok_or(DeepWorkError::TabNotFound(tab))?;
        page.handle(message);
        Ok(())
    }
}

#[async_trait]
impl RuleInstaller for FakeBrowser {
    async fn update_dynamic_rules(&self, update: RuleUpdate) -> DeepWorkResult<()> {
        self.check(Fault::Rules, || DeepWorkError::rules("rule update rejected"))?;
        let mut rules = self.rules.lock().unwrap();
        for rule in &update.add_rules {
            let clash = rules
                .iter()
                .any(|r| r.id == rule.id && !update.remove_rule_ids.contains(&r.id));
            if clash {
                return Err(DeepWorkError::rules(format!("Rule with id {} already exists", rule.id)));
            }
        }
        rules.retain(|r| !update.remove_rule_ids.contains(&r.id));
        rules.extend(update.add_rules);
        Ok(())
    }

    async fn dynamic_rules(&self) -> DeepWorkResult<Vec<BlockRule>> {
        Ok(self.rules.lock().unwrap().clone())
    }
}

#[async_trait]
impl BadgeService for FakeBrowser {
    async fn set_badge(&self, badge: BadgeState) -> DeepWorkResult<()> {
        if self.faults.lock().unwrap().contains(&Fault::HangBadge) {
            std::future::pending::<()>().await;
        }
        self.check(Fault::Badge, || DeepWorkError::badge("action API unavailable"))?;
        *self.badge.lock().unwrap() = Some(badge);
        Ok(())
    }
}

#[async_trait]
impl Notifier for FakeBrowser {
    async fn create(&self, notification: Notification) -> DeepWorkResult<()> {
        self.check(Fault::Notify, || DeepWorkError::notification("permission denied"))?;
        self.notifications.lock().unwrap().push(notification);
        Ok(())
    }
}

#[async_trait]
impl RuntimeBus for FakeBrowser {
    async fn broadcast(&self, message: ControllerMessage) -> DeepWorkResult<()> {
        self.check(Fault::Runtime, || {
            DeepWorkError::messaging("Could not establish connection")
        })?;
        self.broadcasts.lock().unwrap().push(message);
        Ok(())
    }
}

impl TabEventSource for FakeBrowser {
    fn add_listener(&self, listener: Arc<dyn TabEventListener>) -> ListenerId {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().unwrap().insert(id, listener);
        ListenerId(id)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.lock().unwrap().remove(&id.0).is_some()
    }
}

/// Clock moved by hand
#[derive(Debug, Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn at(ms: Timestamp) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(ms)))
    }

    pub fn set(&self, ms: Timestamp) {
        self.0.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Timestamp {
        self.0.load(Ordering::SeqCst)
    }
}

/// Memory store whose reads can be made to fail
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
}

impl FlakyStore {
    pub fn new(state: FocusState) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(state),
            fail_reads: AtomicBool::new(false),
        })
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StateStore for FlakyStore {
    async fn load(&self) -> DeepWorkResult<FocusState> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DeepWorkError::storage("storage.local unavailable"));
        }
        self.inner.load().await
    }

    async fn save(&self, state: FocusState) -> DeepWorkResult<()> {
        self.inner.save(state).await
    }
}

pub fn controller(
    browser: &Arc<FakeBrowser>,
    store: Arc<dyn StateStore>,
    clock: &Arc<ManualClock>,
) -> FocusController {
    controller_with(browser, store, clock, ControllerConfig::default())
}

pub fn controller_with(
    browser: &Arc<FakeBrowser>,
    store: Arc<dyn StateStore>,
    clock: &Arc<ManualClock>,
    config: ControllerConfig,
) -> FocusController {
    FocusController::with_clock(browser.platform(), store, config, clock.clone())
}
