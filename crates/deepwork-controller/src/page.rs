//! Page-side effect of the `applyDark` directive.
//!
//! Models what a content script does with the directive so its idempotence
//! can be checked without a DOM: one darkening class on the document root and
//! body, plus a veil and a banner element that are never duplicated.

use std::collections::BTreeSet;

use crate::ipc::PageMessage;

pub const DARK_CLASS: &str = "deepwork-dark";
pub const VEIL_ID: &str = "deepwork-veil";
pub const BANNER_ID: &str = "deepwork-banner";
pub const BANNER_HTML: &str = "<strong>Deep Work</strong> is active";

/// Element appended to the document root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayElement {
    pub id: &'static str,
    pub inner_html: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct PageOverlay {
    root_classes: BTreeSet<String>,
    /// `None` while the document has no body yet; the root stands in for it
    body_classes: Option<BTreeSet<String>>,
    elements: Vec<OverlayElement>,
}

impl PageOverlay {
    pub fn new() -> Self {
        Self {
            body_classes: Some(BTreeSet::new()),
            ..Default::default()
        }
    }

    /// A document still being parsed, before `<body>` exists
    pub fn without_body() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, message: PageMessage) {
        match message {
            PageMessage::ApplyDark { enabled } => self.apply_dark(enabled),
        }
    }

    pub fn apply_dark(&mut self, enabled: bool) {
        if enabled {
            self.root_classes.insert(DARK_CLASS.to_string());
            self.body_mut().insert(DARK_CLASS.to_string());
            self.append_once(VEIL_ID, "");
            self.append_once(BANNER_ID, BANNER_HTML);
        } else {
            self.root_classes.remove(DARK_CLASS);
            self.body_mut().remove(DARK_CLASS);
            self.elements.retain(|e| e.id != VEIL_ID && e.id != BANNER_ID);
        }
    }

    fn body_mut(&mut self) -> &mut BTreeSet<String> {
        match self.body_classes {
            Some(ref mut body) => body,
            None => &mut self.root_classes,
        }
    }

    fn append_once(&mut self, id: &'static str, inner_html: &'static str) {
        if !self.elements.iter().any(|e| e.id == id) {
            self.elements.push(OverlayElement { id, inner_html });
        }
    }

    pub fn is_dark(&self) -> bool {
        self.root_classes.contains(DARK_CLASS)
    }

    pub fn element_count(&self, id: &str) -> usize {
        self.elements.iter().filter(|e| e.id == id).count()
    }

    pub fn body_has_dark_class(&self) -> bool {
        self.body_classes
            .as_ref()
            .unwrap_or(&self.root_classes)
            .contains(DARK_CLASS)
    }
}
