use thiserror::Error;

/// Failures that stay inside a session: they are handed back to the model as
/// observations instead of ending the plan.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error("'{tool}' failed: {message}")]
    ProviderFailure { tool: String, message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a tool named '{0}' is already registered")]
    DuplicateToolName(String),
}

/// Session-level failures surfaced to the user.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model backend unavailable: {0}")]
    ModelBackendUnavailable(#[source] anyhow::Error),
    #[error("step budget exhausted after {steps} model requests")]
    BudgetExhausted { steps: usize },
}
