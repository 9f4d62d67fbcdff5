//! Distraction blocking for Deep Work
//!
//! Owns the fixed distraction rule batch and installs or removes it through
//! the browser's declarative rule installer. The batch is always replaced
//! as a whole: a removal of every owned id precedes any addition, so
//! reinstalling never produces duplicate ids.

pub mod matcher;
pub mod rules;

use async_trait::async_trait;
use deepwork_core::DeepWorkResult;

pub use matcher::{BlockingStats, RuleMatcher};
pub use rules::{
    distraction_rules, BlockRule, ResourceType, RuleAction, RuleCondition, RuleId,
    DISTRACTION_RULE_IDS,
};

/// One atomic change to the dynamic rule table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleUpdate {
    pub remove_rule_ids: Vec<RuleId>,
    pub add_rules: Vec<BlockRule>,
}

/// Declarative request-blocking rule installer provided by the browser
#[async_trait]
pub trait RuleInstaller: Send + Sync {
    /// Apply a batch update. Removals are applied before additions.
    async fn update_dynamic_rules(&self, update: RuleUpdate) -> DeepWorkResult<()>;

    /// Currently installed dynamic rules
    async fn dynamic_rules(&self) -> DeepWorkResult<Vec<BlockRule>>;
}

/// Installs and removes the distraction rule batch
#[derive(Debug, Clone)]
pub struct BlockingPolicy {
    rules: Vec<BlockRule>,
}

impl BlockingPolicy {
    pub fn new() -> Self {
        Self {
            rules: distraction_rules(),
        }
    }

    fn owned_ids(&self) -> Vec<RuleId> {
        self.rules.iter().map(|r| r.id).collect()
    }

    /// Install the full batch, replacing any earlier copy of it
    ///
    /// Sent as one update so the table never holds a partial batch.
    pub async fn install(&self, installer: &dyn RuleInstaller) -> DeepWorkResult<()> {
        installer
            .update_dynamic_rules(RuleUpdate {
                remove_rule_ids: self.owned_ids(),
                add_rules: self.rules.clone(),
            })
            .await?;
        tracing::debug!(count = self.rules.len(), "Installed distraction rules");
        Ok(())
    }

    /// Remove the batch, leaving unrelated rules untouched
    pub async fn uninstall(&self, installer: &dyn RuleInstaller) -> DeepWorkResult<()> {
        installer
            .update_dynamic_rules(RuleUpdate {
                remove_rule_ids: self.owned_ids(),
                add_rules: Vec::new(),
            })
            .await?;
        tracing::debug!("Removed distraction rules");
        Ok(())
    }
}

impl Default for BlockingPolicy {
    fn default() -> Self {
        Self::new()
    }
}
