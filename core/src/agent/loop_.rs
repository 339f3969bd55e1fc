use crate::agent::{ContextBuilder, LoopState, PlanCompiler, ToolInvoker};
use crate::error::AgentError;
use crate::traits::{ChatMessage, ChatRequest, ChatResponse, Provider, Role, ToolCall};
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_STEPS: usize = 12;

const TOOL_CALL_OPEN_TAG: &str = "<tool_call>";
const TOOL_CALL_CLOSE_TAG: &str = "</tool_call>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    /// The model's own final answer.
    Complete,
    /// The answer came from the extra synthesis request.
    Compiled,
    /// The step budget ran out; the text is a partial report.
    Incomplete,
}

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub text: String,
    pub status: PlanStatus,
    /// Model requests issued by the loop, not counting plan compilation.
    pub model_requests: usize,
    pub history: Vec<ChatMessage>,
}

impl PlanOutcome {
    pub fn is_complete(&self) -> bool {
        self.status != PlanStatus::Incomplete
    }

    /// For callers that cannot use a partial plan.
    pub fn into_complete(self) -> Result<String, AgentError> {
        match self.status {
            PlanStatus::Incomplete => Err(AgentError::BudgetExhausted {
                steps: self.model_requests,
            }),
            _ => Ok(self.text),
        }
    }
}

pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    context_builder: ContextBuilder,
    invoker: ToolInvoker,
    compiler: Option<PlanCompiler>,
    max_steps: usize,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        context_builder: ContextBuilder,
        invoker: ToolInvoker,
    ) -> Self {
        Self {
            provider,
            context_builder,
            invoker,
            compiler: Some(PlanCompiler::default()),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    pub fn with_compiler(mut self, compiler: Option<PlanCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    /// Runs one planning session to completion.
    ///
    /// The session lives entirely inside the returned future: dropping it
    /// abandons the session between or during steps, and any in-flight tool
    /// calls are dropped with it.
    pub async fn plan(&self, request: &str) -> Result<PlanOutcome, AgentError> {
        let mut state = LoopState::new(self.context_builder.build_messages(request));
        let tools = self.invoker.catalog();

        loop {
            if !state.begin_step(self.max_steps) {
                warn!(
                    max_steps = self.max_steps,
                    "step budget exhausted, returning partial plan"
                );
                return Ok(self.partial_outcome(state));
            }

            debug!(
                step = state.steps(),
                messages = state.history().len(),
                "requesting next move from model"
            );
            let chat_request = ChatRequest {
                messages: state.history(),
                tools: if tools.is_empty() {
                    None
                } else {
                    Some(tools.as_slice())
                },
            };
            let response = self
                .provider
                .chat(chat_request)
                .await
                .map_err(AgentError::ModelBackendUnavailable)?;

            let (text, calls) = self.split_response(response);

            if calls.is_empty() {
                debug!(step = state.steps(), "model produced its final answer");
                state.finish(text);
                return Ok(self.conclude(state, request).await);
            }

            info!(
                step = state.steps(),
                tool_call_count = calls.len(),
                "model requested tools"
            );
            state.record_tool_requests(text, calls.clone());
            let results = self.invoker.invoke_all(&calls).await;
            state.record_tool_results(results);
        }
    }

    async fn conclude(&self, state: LoopState, request: &str) -> PlanOutcome {
        let model_requests = state.steps();

        if let Some(compiler) = &self.compiler
            && compiler.needs_compilation(&state)
        {
            let mut history = state.into_history();
            if let Some((instruction, text)) = compiler
                .compile(self.provider.as_ref(), &history, request)
                .await
            {
                history.push(instruction);
                history.push(ChatMessage::assistant(text.clone()));
                return PlanOutcome {
                    text,
                    status: PlanStatus::Compiled,
                    model_requests,
                    history,
                };
            }

            return Self::complete_outcome(history, model_requests);
        }

        Self::complete_outcome(state.into_history(), model_requests)
    }

    fn complete_outcome(history: Vec<ChatMessage>, model_requests: usize) -> PlanOutcome {
        let text = history
            .last()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        PlanOutcome {
            text,
            status: PlanStatus::Complete,
            model_requests,
            history,
        }
    }

    fn partial_outcome(&self, state: LoopState) -> PlanOutcome {
        let model_requests = self.max_steps.min(state.steps());
        let history = state.into_history();

        PlanOutcome {
            text: render_partial_report(&history, model_requests),
            status: PlanStatus::Incomplete,
            model_requests,
            history,
        }
    }

    fn split_response(&self, response: ChatResponse) -> (String, Vec<ToolCall>) {
        if response.has_tool_calls() {
            return (response.text.unwrap_or_default(), response.tool_calls);
        }

        match response.text {
            Some(text) => parse_tool_calls_fallback(&text),
            None => (String::new(), vec![]),
        }
    }
}

/// Everything the session gathered, for when the budget runs out before the
/// model writes its answer.
fn render_partial_report(history: &[ChatMessage], model_requests: usize) -> String {
    let mut report = format!(
        "> **Note:** planning stopped after {model_requests} model requests, so this plan may be incomplete.\n"
    );

    if let Some(last) = history
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant && !m.content.trim().is_empty())
    {
        let _ = write!(report, "\n{}\n", last.content.trim());
    }

    let tool_names: HashMap<&str, &str> = history
        .iter()
        .flat_map(|m| m.requested_calls())
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let observations: Vec<&ChatMessage> =
        history.iter().filter(|m| m.role == Role::Tool).collect();
    if !observations.is_empty() {
        report.push_str("\n## Gathered So Far\n");
        for observation in observations {
            let name = observation
                .tool_call_id
                .as_deref()
                .and_then(|id| tool_names.get(id))
                .copied()
                .unwrap_or("tool");
            let _ = write!(report, "\n### {}\n\n{}\n", name, observation.content.trim());
        }
    }

    report
}

/// Extracts `<tool_call>{"name": ..., "arguments": {...}}</tool_call>` blocks
/// that some backends emit as plain text. Returns the remaining text and the
/// calls, each with a fresh id.
fn parse_tool_calls_fallback(response: &str) -> (String, Vec<ToolCall>) {
    let mut text_parts = Vec::new();
    let mut calls = Vec::new();
    let mut remaining = response;

    while let Some(start) = remaining.find(TOOL_CALL_OPEN_TAG) {
        let after_open = &remaining[start + TOOL_CALL_OPEN_TAG.len()..];
        let Some(close_idx) = after_open.find(TOOL_CALL_CLOSE_TAG) else {
            break;
        };

        let before = remaining[..start].trim();
        if !before.is_empty() {
            text_parts.push(before.to_string());
        }

        calls.extend(
            extract_json_values(&after_open[..close_idx])
                .iter()
                .filter_map(parse_tool_call_value),
        );
        remaining = &after_open[close_idx + TOOL_CALL_CLOSE_TAG.len()..];
    }

    // A reply without usable calls is a final answer and stays byte-for-byte.
    if calls.is_empty() {
        return (response.to_string(), calls);
    }

    if !remaining.trim().is_empty() {
        text_parts.push(remaining.trim().to_string());
    }

    (text_parts.join("\n"), calls)
}

fn extract_json_values(text: &str) -> Vec<serde_json::Value> {
    let mut values = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0
                    && let Some(s) = start.take()
                    && let Ok(value) = serde_json::from_str(&text[s..=i])
                {
                    values.push(value);
                }
            }
            _ => {}
        }
    }

    values
}

fn parse_tool_call_value(value: &serde_json::Value) -> Option<ToolCall> {
    let name = value.get("name")?.as_str()?.to_string();
    let arguments = value
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));

    Some(ToolCall {
        id: format!("call_{}", uuid::Uuid::new_v4().simple()),
        name,
        arguments: serde_json::to_string(&arguments).ok()?,
    })
}
