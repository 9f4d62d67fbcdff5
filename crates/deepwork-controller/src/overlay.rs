//! Darkening overlay broadcast to open pages.

use deepwork_core::{with_step_timeout, DeepWorkResult, TabId};
use std::time::Duration;

use crate::ipc::PageMessage;
use crate::platform::{FanOut, Scripting, TabService};

/// Pushes the overlay stylesheet and the `applyDark` directive to pages
///
/// Only http and https pages are targeted; other schemes never accept
/// injection.
#[derive(Debug, Clone)]
pub struct OverlayBroadcaster {
    stylesheet: String,
    step_timeout: Option<Duration>,
}

impl OverlayBroadcaster {
    pub fn new(stylesheet: impl Into<String>, step_timeout: Option<Duration>) -> Self {
        Self {
            stylesheet: stylesheet.into(),
            step_timeout,
        }
    }

    async fn web_tabs(&self, tabs: &dyn TabService) -> DeepWorkResult<Vec<TabId>> {
        let all = with_step_timeout(self.step_timeout, tabs.query_all()).await?;
        Ok(all
            .into_iter()
            .filter(|t| t.is_web_page())
            .filter_map(|t| t.id)
            .collect())
    }

    pub async fn insert_css_all(
        &self,
        tabs: &dyn TabService,
        scripting: &dyn Scripting,
    ) -> DeepWorkResult<FanOut> {
        let mut outcome = FanOut::default();
        for id in self.web_tabs(tabs).await? {
            let result = self.insert_css(scripting, id).await;
            outcome.record(&result);
        }
        Ok(outcome)
    }

    pub async fn remove_css_all(
        &self,
        tabs: &dyn TabService,
        scripting: &dyn Scripting,
    ) -> DeepWorkResult<FanOut> {
        let mut outcome = FanOut::default();
        for id in self.web_tabs(tabs).await? {
            let result = with_step_timeout(
                self.step_timeout,
                scripting.remove_css(id, &self.stylesheet),
            )
            .await;
            if let Err(ref e) = result {
                tracing::debug!(tab = %id, error = %e, "Stylesheet removal skipped");
            }
            outcome.record(&result);
        }
        Ok(outcome)
    }

    /// Send the directive to every open web page
    pub async fn broadcast(
        &self,
        tabs: &dyn TabService,
        scripting: &dyn Scripting,
        enabled: bool,
    ) -> DeepWorkResult<FanOut> {
        let mut outcome = FanOut::default();
        for id in self.web_tabs(tabs).await? {
            let result = self.send(scripting, id, enabled).await;
            outcome.record(&result);
        }
        Ok(outcome)
    }

    pub async fn insert_css(&self, scripting: &dyn Scripting, tab: TabId) -> DeepWorkResult<()> {
        let result =
            with_step_timeout(self.step_timeout, scripting.insert_css(tab, &self.stylesheet)).await;
        if let Err(ref e) = result {
            tracing::debug!(%tab, error = %e, "Stylesheet injection skipped");
        }
        result
    }

    async fn send(&self, scripting: &dyn Scripting, tab: TabId, enabled: bool) -> DeepWorkResult<()> {
        let result = with_step_timeout(
            self.step_timeout,
            scripting.send_to_tab(tab, PageMessage::ApplyDark { enabled }),
        )
        .await;
        if let Err(ref e) = result {
            tracing::debug!(%tab, enabled, error = %e, "Overlay directive not delivered");
        }
        result
    }

    /// Re-darken one page after it finished loading
    ///
    /// Both calls are attempted; the first failure is returned.
    pub async fn reapply(&self, scripting: &dyn Scripting, tab: TabId) -> DeepWorkResult<()> {
        let css = self.insert_css(scripting, tab).await;
        let directive = self.send(scripting, tab, true).await;
        css.and(directive)
    }
}
