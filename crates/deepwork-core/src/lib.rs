//! Deep Work Core Library
//!
//! This crate provides shared types, errors, configuration and logging for
//! the Deep Work focus-mode controller.

pub mod config;
pub mod error;
pub mod logging;
pub mod timeout;
pub mod types;

pub use config::ControllerConfig;
pub use error::{DeepWorkError, DeepWorkResult};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use timeout::with_step_timeout;
pub use types::{TabId, TabInfo, Timestamp, WindowId};
