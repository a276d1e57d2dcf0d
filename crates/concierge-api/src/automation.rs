//! Automation triggers invoked from the channel.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use concierge_core::error::ConciergeError;

/// Runs a named front-desk automation and returns a one-line summary.
#[async_trait]
pub trait AutomationHub: Send + Sync {
    async fn trigger(&self, action: &str, data: Value) -> Result<String, ConciergeError>;
}

/// Accepts a fixed set of automations and only logs them.
pub struct LoggingAutomation {
    known: Vec<(&'static str, &'static str)>,
}

impl Default for LoggingAutomation {
    fn default() -> Self {
        Self {
            known: vec![
                ("checkout_reminders", "Mementouri de check-out trimise"),
                ("cleaning_schedule", "Program de curățenie generat"),
                ("night_audit", "Audit de noapte pornit"),
                ("welcome_messages", "Mesaje de bun venit trimise"),
            ],
        }
    }
}

#[async_trait]
impl AutomationHub for LoggingAutomation {
    async fn trigger(&self, action: &str, data: Value) -> Result<String, ConciergeError> {
        let (_, summary) = self
            .known
            .iter()
            .find(|(name, _)| *name == action)
            .ok_or_else(|| {
                ConciergeError::Validation(format!("Unknown automation: {}", action))
            })?;
        info!(action = action, data = %data, "Automation triggered");
        Ok(summary.to_string())
    }
}
