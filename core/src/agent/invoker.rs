use crate::agent::ToolRegistry;
use crate::error::ToolError;
use crate::traits::{ToolArgs, ToolCall, ToolResult, ToolSpec};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns tool-call requests into observations. Nothing here returns an error
/// to the caller: every failure becomes a [`ToolResult`] the model can read.
#[derive(Clone)]
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolInvoker {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn catalog(&self) -> Vec<ToolSpec> {
        self.registry.describe_all()
    }

    pub async fn invoke(&self, call: &ToolCall) -> ToolResult {
        let tool = match self.registry.resolve(&call.name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!(tool = %call.name, id = %call.id, "model requested an unknown tool");
                return ToolResult::error(&call.id, e);
            }
        };

        let args = match ToolArgs::bind(&tool.parameters(), &call.arguments) {
            Ok(args) => args,
            Err(reason) => {
                warn!(tool = %call.name, id = %call.id, %reason, "rejected tool arguments");
                return ToolResult::error(
                    &call.id,
                    ToolError::InvalidArguments {
                        tool: call.name.clone(),
                        reason,
                    },
                );
            }
        };

        debug!(tool = %call.name, id = %call.id, "executing tool");
        let outcome = match tokio::time::timeout(self.timeout, tool.execute(args)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ToolError::ProviderFailure {
                tool: call.name.clone(),
                message: format!("{e:#}"),
            }),
            Err(_) => Err(ToolError::ProviderFailure {
                tool: call.name.clone(),
                message: format!("timed out after {}s", self.timeout.as_secs_f32()),
            }),
        };

        if let Err(e) = &outcome {
            warn!(id = %call.id, error = %e, "tool execution failed");
        }

        ToolResult {
            call_id: call.id.clone(),
            outcome,
        }
    }

    /// Runs one turn's calls concurrently. Results come back in the order of
    /// `calls`, whatever order they finish in.
    pub async fn invoke_all(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        join_all(calls.iter().map(|call| self.invoke(call))).await
    }
}
