use crate::agent::LoopState;
use crate::traits::{ChatMessage, ChatRequest, Provider};
use tracing::{debug, info, warn};

pub const DEFAULT_COMPLETENESS_THRESHOLD: usize = 700;

/// Last-resort synthesis for sessions that finished with too little on the
/// page. The size check is a crude proxy for completeness, hence tunable.
#[derive(Debug, Clone, Copy)]
pub struct PlanCompiler {
    threshold: usize,
}

impl Default for PlanCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETENESS_THRESHOLD)
    }
}

impl PlanCompiler {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn needs_compilation(&self, state: &LoopState) -> bool {
        state.conversation_size() < self.threshold
    }

    pub fn instruction(request: &str) -> String {
        format!(
            "Based on all the information gathered so far, provide a COMPLETE travel plan now. \
             Do not use tools anymore; use the information you already have to write a comprehensive plan. \
             Format the response in clean Markdown with proper headers, lists and tables, and finish with a clothing tip for the expected weather.\n\n\
             Original request: {}",
            request.trim()
        )
    }

    /// Sends one tools-disabled request over the finished history. Returns
    /// `None` when the backend fails or answers with nothing usable; the
    /// caller then keeps its original answer.
    pub async fn compile(
        &self,
        provider: &dyn Provider,
        history: &[ChatMessage],
        request: &str,
    ) -> Option<(ChatMessage, String)> {
        let instruction = ChatMessage::user(Self::instruction(request));
        let mut messages = history.to_vec();
        messages.push(instruction.clone());

        info!(
            threshold = self.threshold,
            messages = messages.len(),
            "conversation looks thin, compiling a full plan"
        );

        let response = match provider
            .chat(ChatRequest {
                messages: &messages,
                tools: None,
            })
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "plan compilation request failed, keeping original answer");
                return None;
            }
        };

        if response.has_tool_calls() {
            debug!(
                count = response.tool_calls.len(),
                "discarding tool calls requested during compilation"
            );
        }

        let text = response.text_or_empty().trim();
        if text.is_empty() {
            warn!("plan compilation returned no text, keeping original answer");
            return None;
        }

        Some((instruction, text.to_string()))
    }
}
