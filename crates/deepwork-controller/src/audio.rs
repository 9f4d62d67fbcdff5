//! Tab audio policy.
//!
//! While focus mode is on, exactly the active tab is unmuted. While it is
//! off, no tab is muted. Calls against tabs that vanished or refuse the mute
//! change are counted and skipped.

use deepwork_core::{with_step_timeout, DeepWorkResult, TabId, TabInfo};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

use crate::platform::{FanOut, ListenerId, TabEventListener, TabEventSource, TabService};

/// Mute policy shared by the controller and its tab listener
///
/// Every mute change runs under one lock together with the `engaged` flag,
/// so a tab handler that started before `unmute_all` cannot mute anything
/// after it.
#[derive(Debug, Clone, Default)]
pub struct TabAudioPolicy {
    step_timeout: Option<Duration>,
    engaged: Arc<AsyncMutex<bool>>,
}

impl TabAudioPolicy {
    pub fn new(step_timeout: Option<Duration>) -> Self {
        Self {
            step_timeout,
            engaged: Arc::default(),
        }
    }

    /// Put the focus invariant in force
    pub async fn engage(&self) {
        *self.engaged.lock().await = true;
    }

    pub async fn is_engaged(&self) -> bool {
        *self.engaged.lock().await
    }

    async fn set_each(
        &self,
        tabs: &dyn TabService,
        all: Vec<TabInfo>,
        muted_for: impl Fn(TabId) -> bool,
    ) -> FanOut {
        let mut outcome = FanOut::default();
        for id in all.into_iter().filter_map(|t| t.id) {
            let muted = muted_for(id);
            let result = with_step_timeout(self.step_timeout, tabs.set_muted(id, muted)).await;
            if let Err(ref e) = result {
                tracing::debug!(tab = %id, muted, error = %e, "Mute change skipped");
            }
            outcome.record(&result);
        }
        outcome
    }

    /// Caller holds the `engaged` lock
    async fn mute_others(
        &self,
        tabs: &dyn TabService,
        active: Option<TabId>,
    ) -> DeepWorkResult<FanOut> {
        let all = with_step_timeout(self.step_timeout, tabs.query_all()).await?;
        Ok(self.set_each(tabs, all, |id| Some(id) != active).await)
    }

    /// Mute every tab except `active`. With no active tab, every tab is muted.
    ///
    /// Does nothing unless the policy is engaged.
    pub async fn mute_all_except(
        &self,
        tabs: &dyn TabService,
        active: Option<TabId>,
    ) -> DeepWorkResult<FanOut> {
        let engaged = self.engaged.lock().await;
        if !*engaged {
            return Ok(FanOut::default());
        }
        self.mute_others(tabs, active).await
    }

    /// Disengage and unmute every tab
    pub async fn unmute_all(&self, tabs: &dyn TabService) -> DeepWorkResult<FanOut> {
        let mut engaged = self.engaged.lock().await;
        *engaged = false;
        let all = with_step_timeout(self.step_timeout, tabs.query_all()).await?;
        Ok(self.set_each(tabs, all, |_| false).await)
    }

    /// A tab became active: it alone stays audible
    pub async fn on_tab_activated(
        &self,
        tabs: &dyn TabService,
        tab_id: TabId,
    ) -> DeepWorkResult<FanOut> {
        let engaged = self.engaged.lock().await;
        if !*engaged {
            return Ok(FanOut::default());
        }
        // Activation events can race a close; bail out if the tab is gone.
        let tab = with_step_timeout(self.step_timeout, tabs.get(tab_id)).await?;
        self.mute_others(tabs, tab.id).await
    }

    /// A new tab starts muted unless it is the active tab of its window
    pub async fn on_tab_created(&self, tabs: &dyn TabService, tab: &TabInfo) -> DeepWorkResult<()> {
        let Some(id) = tab.id else {
            return Ok(());
        };
        let engaged = self.engaged.lock().await;
        if !*engaged {
            return Ok(());
        }
        let is_active = match with_step_timeout(self.step_timeout, tabs.active_tab(Some(tab.window_id))).await {
            Ok(active) => active.and_then(|a| a.id) == Some(id),
            Err(e) => {
                tracing::debug!(tab = %id, error = %e, "Active tab lookup failed, using creation flag");
                tab.active
            }
        };
        with_step_timeout(self.step_timeout, tabs.set_muted(id, !is_active)).await
    }
}

/// At-most-one registration of a tab listener
///
/// `bind` while bound and `unbind` while unbound are no-ops, so one `unbind`
/// always fully detaches however many times `bind` ran.
#[derive(Debug, Default)]
pub struct ListenerBinding {
    registration: Mutex<Option<ListenerId>>,
}

impl ListenerBinding {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<ListenerId>> {
        match self.registration.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Returns `true` if a new registration was made
    pub fn bind(&self, source: &dyn TabEventSource, listener: Arc<dyn TabEventListener>) -> bool {
        let mut slot = self.slot();
        if slot.is_some() {
            return false;
        }
        *slot = Some(source.add_listener(listener));
        true
    }

    /// Returns `true` if a registration was removed
    pub fn unbind(&self, source: &dyn TabEventSource) -> bool {
        let Some(id) = self.slot().take() else {
            return false;
        };
        if !source.remove_listener(id) {
            tracing::debug!(?id, "Listener was already detached by the platform");
        }
        true
    }

    pub fn is_bound(&self) -> bool {
        self.slot().is_some()
    }
}
