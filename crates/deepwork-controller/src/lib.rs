//! Deep Work focus-mode controller
//!
//! Drives the enable/disable lifecycle against a set of browser
//! collaborators (see [`platform`]): distraction blocking, tab muting, the
//! page overlay, the toolbar badge and the end-of-session summary.

pub mod audio;
pub mod controller;
pub mod ipc;
pub mod overlay;
pub mod page;
pub mod platform;
pub mod qr;
pub mod session;
pub mod store;

pub use audio::{ListenerBinding, TabAudioPolicy};
pub use controller::{FocusController, StepFailure, TransitionReport};
pub use ipc::{ControllerMessage, IncomingMessage, IpcResponse, MessageSender, PageMessage};
pub use overlay::OverlayBroadcaster;
pub use page::PageOverlay;
pub use platform::{
    BadgeService, BadgeState, FanOut, ListenerId, LoadStatus, Notification, Notifier, Platform,
    RuntimeBus, Scripting, TabEvent, TabEventListener, TabEventSource, TabService,
};
pub use session::{elapsed_minutes, Clock, SessionReporter, SystemClock};
pub use store::{FocusState, JsonFileStore, MemoryStore, StateStore};
