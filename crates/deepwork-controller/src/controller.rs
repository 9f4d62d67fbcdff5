//! Focus mode lifecycle.
//!
//! Two states, DISABLED and ENABLED. Every transition runs its full side
//! effect sequence behind a single gate, so a second toggle waits for the
//! first to finish. Individual platform failures are recorded in the
//! [`TransitionReport`] and never abort the sequence: the persisted flag and
//! the badge always end up reflecting the requested state when their own
//! calls succeed.

use async_trait::async_trait;
use deepwork_core::{
    init_logging, with_step_timeout, ControllerConfig, DeepWorkError, DeepWorkResult, LogConfig,
    TabId,
};
use deepwork_shield::BlockingPolicy;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::audio::{ListenerBinding, TabAudioPolicy};
use crate::ipc::{ControllerMessage, IncomingMessage, IpcResponse, MessageSender};
use crate::overlay::OverlayBroadcaster;
use crate::platform::{BadgeState, LoadStatus, Platform, TabEvent, TabEventListener};
use crate::session::{elapsed_minutes, Clock, SessionReporter, SystemClock};
use crate::store::{FocusState, JsonFileStore, StateStore};

/// A side effect that failed and was skipped
#[derive(Debug)]
pub struct StepFailure {
    pub step: &'static str,
    pub error: DeepWorkError,
}

/// Outcome of one transition
#[derive(Debug)]
pub struct TransitionReport {
    /// The state the transition committed
    pub state: FocusState,
    /// Minutes reported for a finished session
    pub elapsed_minutes: Option<u64>,
    pub failures: Vec<StepFailure>,
}

impl TransitionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_steps(&self) -> Vec<&'static str> {
        self.failures.iter().map(|f| f.step).collect()
    }
}

/// Runs best-effort steps, collecting failures instead of propagating them
struct Steps {
    timeout: Option<Duration>,
    failures: Vec<StepFailure>,
}

impl Steps {
    fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            failures: Vec::new(),
        }
    }

    async fn run<T, F>(&mut self, step: &'static str, call: F) -> Option<T>
    where
        F: Future<Output = DeepWorkResult<T>>,
    {
        match with_step_timeout(self.timeout, call).await {
            Ok(value) => {
                debug!(step, "Step complete");
                Some(value)
            }
            Err(error) => {
                warn!(step, category = error.category(), %error, "Step failed, continuing");
                self.failures.push(StepFailure { step, error });
                None
            }
        }
    }

    fn into_report(self, state: FocusState, elapsed_minutes: Option<u64>) -> TransitionReport {
        TransitionReport {
            state,
            elapsed_minutes,
            failures: self.failures,
        }
    }
}

/// Reacts to tab events while focus mode is on
struct FocusListener {
    platform: Platform,
    store: Arc<dyn StateStore>,
    audio: TabAudioPolicy,
    overlay: OverlayBroadcaster,
}

#[async_trait]
impl TabEventListener for FocusListener {
    async fn on_tab_event(&self, event: TabEvent) {
        let tabs = self.platform.tabs.as_ref();
        match event {
            TabEvent::Activated { tab_id, .. } => {
                if let Err(e) = self.audio.on_tab_activated(tabs, tab_id).await {
                    debug!(tab = %tab_id, error = %e, "Ignoring activation");
                }
            }
            TabEvent::Created(tab) => {
                if let Err(e) = self.audio.on_tab_created(tabs, &tab).await {
                    debug!(tab = ?tab.id, error = %e, "New tab mute skipped");
                }
            }
            TabEvent::Updated {
                tab_id,
                status: Some(LoadStatus::Complete),
            } => {
                // The flag may be flipping under a running transition; the
                // persisted value is the one that counts.
                match self.store.load().await {
                    Ok(state) if state.enabled => {
                        if let Err(e) = self
                            .overlay
                            .reapply(self.platform.scripting.as_ref(), tab_id)
                            .await
                        {
                            debug!(tab = %tab_id, error = %e, "Overlay not reapplied");
                        }
                    }
                    Ok(_) => {}
                    Err(e) => debug!(tab = %tab_id, error = %e, "State read failed, not reapplying"),
                }
            }
            TabEvent::Updated { .. } => {}
        }
    }
}

struct ControllerInner {
    platform: Platform,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    config: ControllerConfig,
    blocking: BlockingPolicy,
    audio: TabAudioPolicy,
    overlay: OverlayBroadcaster,
    reporter: SessionReporter,
    listener: Arc<FocusListener>,
    binding: ListenerBinding,
    /// Last committed state, served when the store cannot be read
    last_known: Mutex<FocusState>,
    /// Held for the whole of a transition
    gate: AsyncMutex<()>,
}

/// The Deep Work lifecycle controller
#[derive(Clone)]
pub struct FocusController {
    inner: Arc<ControllerInner>,
}

impl FocusController {
    pub fn new(platform: Platform, store: Arc<dyn StateStore>, config: ControllerConfig) -> Self {
        Self::with_clock(platform, store, config, Arc::new(SystemClock))
    }

    /// Controller persisting to the JSON state file named by `config`
    ///
    /// Also installs the global log subscriber described by the config,
    /// unless one is already in place.
    pub fn from_config(platform: Platform, config: ControllerConfig) -> Self {
        if !init_logging(LogConfig::from_controller(&config)) {
            debug!("Log subscriber already installed");
        }
        let store = Arc::new(JsonFileStore::new(config.state_path()));
        info!(path = %store.path().display(), "Using focus state file");
        Self::new(platform, store, config)
    }

    pub fn with_clock(
        platform: Platform,
        store: Arc<dyn StateStore>,
        config: ControllerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let step_timeout = config.step_timeout();
        let audio = TabAudioPolicy::new(step_timeout);
        let overlay = OverlayBroadcaster::new(config.stylesheet.clone(), step_timeout);
        let listener = Arc::new(FocusListener {
            platform: platform.clone(),
            store: store.clone(),
            audio: audio.clone(),
            overlay: overlay.clone(),
        });

        Self {
            inner: Arc::new(ControllerInner {
                reporter: SessionReporter::new(config.notification.clone()),
                platform,
                store,
                clock,
                config,
                blocking: BlockingPolicy::new(),
                audio,
                overlay,
                listener,
                binding: ListenerBinding::new(),
                last_known: Mutex::new(FocusState::default()),
                gate: AsyncMutex::new(()),
            }),
        }
    }

    /// Whether the tab listeners are currently registered
    pub fn listeners_bound(&self) -> bool {
        self.inner.binding.is_bound()
    }

    /// Current persisted state, or the last committed one if the store fails
    pub async fn state(&self) -> FocusState {
        match self.inner.store.load().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Falling back to last known focus state");
                *self.last_known()
            }
        }
    }

    fn last_known(&self) -> std::sync::MutexGuard<'_, FocusState> {
        match self.inner.last_known.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn steps(&self) -> Steps {
        Steps::new(self.inner.config.step_timeout())
    }

    fn badge(&self, enabled: bool) -> BadgeState {
        let badge = &self.inner.config.badge;
        if enabled {
            BadgeState {
                text: badge.text.clone(),
                color: badge.active_color.clone(),
            }
        } else {
            BadgeState {
                text: String::new(),
                color: badge.idle_color.clone(),
            }
        }
    }

    /// Enter focus mode
    pub async fn to_enabled(&self) -> TransitionReport {
        let _gate = self.inner.gate.lock().await;
        self.enable_sequence(None).await
    }

    /// Leave focus mode and report the session length
    pub async fn to_disabled(&self) -> TransitionReport {
        let _gate = self.inner.gate.lock().await;
        self.disable_sequence().await
    }

    /// Re-enter focus mode after a process restart if it was on
    ///
    /// Returns `None` when the persisted state is disabled. The session keeps
    /// its original start time.
    pub async fn restore_on_startup(&self) -> Option<TransitionReport> {
        let _gate = self.inner.gate.lock().await;

        let persisted = match self.inner.store.load().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Cannot read focus state at startup, staying disabled");
                return None;
            }
        };
        *self.last_known() = persisted;

        if !persisted.enabled {
            debug!("Focus mode was off, nothing to restore");
            return None;
        }

        info!(session_start = ?persisted.session_start, "Restoring focus mode");
        Some(self.enable_sequence(persisted.session_start).await)
    }

    /// First install: start from a clean disabled state
    pub async fn on_installed(&self) -> TransitionReport {
        let _gate = self.inner.gate.lock().await;
        let platform = &self.inner.platform;
        let mut steps = self.steps();
        let state = FocusState::disabled();

        steps.run("persist_state", self.inner.store.save(state)).await;
        steps.run("clear_badge", platform.badge.set_badge(self.badge(false))).await;
        *self.last_known() = state;

        steps.into_report(state, None)
    }

    async fn enable_sequence(&self, keep_start: Option<i64>) -> TransitionReport {
        let inner = &self.inner;
        let platform = &inner.platform;
        let tabs = platform.tabs.as_ref();
        let mut steps = self.steps();

        steps
            .run("install_rules", inner.blocking.install(platform.rules.as_ref()))
            .await;

        let active = steps
            .run("find_active_tab", tabs.active_tab(None))
            .await
            .flatten()
            .and_then(|t| t.id);
        inner.audio.engage().await;
        steps
            .run("mute_inactive_tabs", inner.audio.mute_all_except(tabs, active))
            .await;

        if inner
            .binding
            .bind(platform.tab_events.as_ref(), inner.listener.clone())
        {
            debug!("Tab listeners bound");
        }

        steps
            .run(
                "insert_css",
                inner.overlay.insert_css_all(tabs, platform.scripting.as_ref()),
            )
            .await;
        steps
            .run(
                "broadcast_overlay",
                inner.overlay.broadcast(tabs, platform.scripting.as_ref(), true),
            )
            .await;
        steps.run("set_badge", platform.badge.set_badge(self.badge(true))).await;

        let start = keep_start.unwrap_or_else(|| inner.clock.now_ms());
        let state = FocusState::enabled_since(start);
        steps.run("persist_state", inner.store.save(state)).await;
        *self.last_known() = state;

        steps
            .run(
                "broadcast_state",
                platform.runtime.broadcast(ControllerMessage::State { enabled: true }),
            )
            .await;

        info!(session_start = start, failed = steps.failures.len(), "Focus mode enabled");
        steps.into_report(state, None)
    }

    async fn disable_sequence(&self) -> TransitionReport {
        let inner = &self.inner;
        let platform = &inner.platform;
        let tabs = platform.tabs.as_ref();
        let mut steps = self.steps();

        steps
            .run("remove_rules", inner.blocking.uninstall(platform.rules.as_ref()))
            .await;
        steps.run("unmute_tabs", inner.audio.unmute_all(tabs)).await;

        if inner.binding.unbind(platform.tab_events.as_ref()) {
            debug!("Tab listeners unbound");
        }

        steps
            .run(
                "broadcast_overlay",
                inner.overlay.broadcast(tabs, platform.scripting.as_ref(), false),
            )
            .await;
        steps
            .run(
                "remove_css",
                inner.overlay.remove_css_all(tabs, platform.scripting.as_ref()),
            )
            .await;
        steps.run("clear_badge", platform.badge.set_badge(self.badge(false))).await;

        let session_start = steps
            .run("read_session_start", inner.store.session_start())
            .await
            .flatten();
        let now = inner.clock.now_ms();
        let minutes = session_start
            .map(|start| elapsed_minutes(start, now))
            .unwrap_or(0);

        let state = FocusState::disabled();
        steps.run("persist_state", inner.store.save(state)).await;
        *self.last_known() = state;

        let notification = inner.reporter.summary(minutes, now);
        steps.run("notify_summary", platform.notifier.create(notification)).await;

        steps
            .run(
                "broadcast_state",
                platform.runtime.broadcast(ControllerMessage::State { enabled: false }),
            )
            .await;

        info!(minutes, failed = steps.failures.len(), "Focus mode disabled");
        steps.into_report(state, Some(minutes))
    }

    /// Inject the stylesheet into a page that asked for it, if focus mode is on
    pub async fn ensure_css(&self, tab: TabId) -> bool {
        if !self.state().await.enabled {
            return false;
        }
        self.inner
            .overlay
            .insert_css(self.inner.platform.scripting.as_ref(), tab)
            .await
            .is_ok()
    }

    /// Dispatch a protocol message
    pub async fn handle_message(
        &self,
        message: IncomingMessage,
        sender: MessageSender,
    ) -> IpcResponse {
        match message {
            IncomingMessage::Toggle { enabled } => {
                let report = if enabled {
                    self.to_enabled().await
                } else {
                    self.to_disabled().await
                };
                IpcResponse::success(ControllerMessage::State {
                    enabled: report.state.enabled,
                })
            }
            IncomingMessage::EnsureCss => match sender.tab_id {
                Some(tab) => {
                    let injected = self.ensure_css(tab).await;
                    IpcResponse::success(serde_json::json!({ "injected": injected }))
                }
                None => IpcResponse::error("ensureCSS must come from a page"),
            },
            IncomingMessage::GetState => {
                let state = self.state().await;
                IpcResponse::success(ControllerMessage::State {
                    enabled: state.enabled,
                })
            }
        }
    }

    /// Parse and dispatch a raw JSON message
    pub async fn handle_raw(&self, json: &str, sender: MessageSender) -> IpcResponse {
        match serde_json::from_str::<IncomingMessage>(json) {
            Ok(message) => self.handle_message(message, sender).await,
            Err(e) => {
                warn!(error = %e, "Unrecognized message");
                IpcResponse::error(format!("Invalid message: {}", e))
            }
        }
    }
}
