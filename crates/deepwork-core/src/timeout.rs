//! Timeout wrapper for platform calls.

use std::future::Future;
use std::time::Duration;

use crate::error::{DeepWorkError, DeepWorkResult};

/// Run a platform call, bounding it by `timeout` when one is configured.
///
/// A call that outlives the bound resolves to [`DeepWorkError::Timeout`]; the
/// underlying future is dropped.
pub async fn with_step_timeout<T, Fut>(timeout: Option<Duration>, call: Fut) -> DeepWorkResult<T>
where
    Fut: Future<Output = DeepWorkResult<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| DeepWorkError::Timeout(limit))?,
        None => call.await,
    }
}
