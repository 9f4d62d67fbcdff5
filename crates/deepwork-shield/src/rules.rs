//! The fixed distraction rule set.

use serde::{Deserialize, Serialize};

/// Stable rule id type used by the declarative rule installer
pub type RuleId = u32;

/// Distracting domains and the rule id reserved for each.
const BLOCKED_DOMAINS: &[(RuleId, &str)] = &[
    (1001, "facebook.com"),
    (1002, "instagram.com"),
    (1003, "reddit.com"),
];

/// Priority shared by every distraction rule
pub const RULE_PRIORITY: u32 = 1;

/// Ids owned by the distraction rule set. Rules with other ids are never touched.
pub const DISTRACTION_RULE_IDS: [RuleId; 3] = [1001, 1002, 1003];

/// Request types a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Top-level document load
    MainFrame,
    /// Embedded frame load
    SubFrame,
    Script,
    Image,
    Stylesheet,
    Xmlhttprequest,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleAction {
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    /// Filter in `||domain^` form
    pub url_filter: String,
    pub resource_types: Vec<ResourceType>,
}

/// A single declarative block rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRule {
    pub id: RuleId,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

impl BlockRule {
    /// Build a block rule for a domain and all of its subdomains
    pub fn for_domain(id: RuleId, domain: &str) -> Self {
        Self {
            id,
            priority: RULE_PRIORITY,
            action: RuleAction::Block,
            condition: RuleCondition {
                url_filter: format!("||{}^", domain),
                resource_types: vec![ResourceType::MainFrame, ResourceType::SubFrame],
            },
        }
    }

    /// Domain named by an `||domain^` filter, lowercased
    pub fn domain(&self) -> Option<String> {
        let filter = self.condition.url_filter.as_str();
        let domain = filter.strip_prefix("||")?.strip_suffix('^')?;
        if domain.is_empty() || domain.contains('/') {
            return None;
        }
        Some(domain.to_ascii_lowercase())
    }

    pub fn applies_to(&self, resource_type: ResourceType) -> bool {
        self.condition.resource_types.contains(&resource_type)
    }
}

/// The complete distraction rule batch, in id order
pub fn distraction_rules() -> Vec<BlockRule> {
    BLOCKED_DOMAINS
        .iter()
        .map(|(id, domain)| BlockRule::for_domain(*id, domain))
        .collect()
}
