//! Per-operation caller metadata.

use serde::{Deserialize, Serialize};

/// Who issued an operation and how to correlate it in logs.
///
/// The actor is recorded as the load's `acceptedBy`; when absent the
/// controller's configured role is used. Both fields are attached to the
/// tracing span of the operation.
///
/// # Examples
///
/// ```
/// use loadboard::CommandContext;
///
/// let ctx = CommandContext::default()
///     .with_actor("dispatcher")
///     .with_correlation_id("req-abc-123");
///
/// assert_eq!(ctx.actor_or("operator"), "dispatcher");
/// assert_eq!(ctx.correlation_id.as_deref(), Some("req-abc-123"));
/// assert_eq!(CommandContext::default().actor_or("operator"), "operator");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContext {
    /// Role of the caller (e.g. `"operator"`, `"shipper"`).
    pub actor: Option<String>,
    /// Correlation id for tracing a request through the controller.
    pub correlation_id: Option<String>,
}

impl CommandContext {
    /// Set the actor role.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Set the correlation id.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// The actor role, or `default` when none was given.
    pub fn actor_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.actor.as_deref().unwrap_or(default)
    }

    pub(crate) fn correlation(&self) -> &str {
        self.correlation_id.as_deref().unwrap_or("-")
    }
}
