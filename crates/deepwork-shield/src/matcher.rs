//! Request matching against an installed rule batch.
//!
//! Mirrors how the browser evaluates `||domain^` rules: the request host must
//! equal the rule domain or be one of its subdomains, and the request type must
//! be one the rule applies to. Matching requests are blocked outright.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

use crate::rules::{BlockRule, ResourceType};

/// Domain matcher built from a set of block rules
pub struct RuleMatcher {
    /// (domain, resource types) per rule with a parseable filter
    entries: Vec<(String, HashSet<ResourceType>)>,
    requests_blocked: AtomicU64,
}

impl RuleMatcher {
    pub fn new(rules: &[BlockRule]) -> Self {
        let entries = rules
            .iter()
            .filter_map(|rule| match rule.domain() {
                Some(domain) => Some((
                    domain,
                    rule.condition.resource_types.iter().copied().collect(),
                )),
                None => {
                    tracing::warn!(id = rule.id, filter = %rule.condition.url_filter, "Skipping unsupported rule filter");
                    None
                }
            })
            .collect();

        Self {
            entries,
            requests_blocked: AtomicU64::new(0),
        }
    }

    /// Check if a request should be blocked
    pub fn should_block(&self, url: &Url, resource_type: ResourceType) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();

        let blocked = self.entries.iter().any(|(domain, types)| {
            types.contains(&resource_type)
                && (host == *domain || host.ends_with(&format!(".{}", domain)))
        });

        if blocked {
            tracing::debug!(%url, ?resource_type, "Blocked distraction");
            self.requests_blocked.fetch_add(1, Ordering::Relaxed);
        }
        blocked
    }

    /// Get blocking statistics
    pub fn stats(&self) -> BlockingStats {
        BlockingStats {
            requests_blocked: self.requests_blocked.load(Ordering::Relaxed),
        }
    }
}

/// Statistics about blocked requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockingStats {
    pub requests_blocked: u64,
}
