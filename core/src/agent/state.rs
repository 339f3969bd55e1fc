use crate::traits::{ChatMessage, Role, ToolCall, ToolResult};

/// Where a planning session currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopPhase {
    AwaitingModel,
    AwaitingTools(Vec<ToolCall>),
    Done,
    Aborted,
}

/// Mutable state of one planning session. History only ever grows.
#[derive(Debug, Clone)]
pub struct LoopState {
    history: Vec<ChatMessage>,
    steps: usize,
    phase: LoopPhase,
}

impl LoopState {
    pub fn new(initial: Vec<ChatMessage>) -> Self {
        Self {
            history: initial,
            steps: 0,
            phase: LoopPhase::AwaitingModel,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn phase(&self) -> &LoopPhase {
        &self.phase
    }

    pub fn into_history(self) -> Vec<ChatMessage> {
        self.history
    }

    /// Counts one entry into `AwaitingModel`. Returns false, and aborts, when
    /// the step would exceed `max_steps`.
    pub fn begin_step(&mut self, max_steps: usize) -> bool {
        self.steps += 1;
        if self.steps > max_steps {
            self.phase = LoopPhase::Aborted;
            return false;
        }
        self.phase = LoopPhase::AwaitingModel;
        true
    }

    pub fn record_tool_requests(&mut self, text: String, calls: Vec<ToolCall>) {
        self.history
            .push(ChatMessage::assistant_with_tool_calls(text, calls.clone()));
        self.phase = LoopPhase::AwaitingTools(calls);
    }

    /// Appends one result per pending call, in request order, and hands
    /// control back to the model.
    pub fn record_tool_results(&mut self, results: Vec<ToolResult>) {
        let LoopPhase::AwaitingTools(pending) = &self.phase else {
            return;
        };
        debug_assert_eq!(pending.len(), results.len());

        for (call, result) in pending.iter().zip(results) {
            debug_assert_eq!(call.id, result.call_id);
            self.history
                .push(ChatMessage::tool_result(&call.id, result.observation()));
        }
        self.phase = LoopPhase::AwaitingModel;
    }

    pub fn finish(&mut self, text: String) {
        self.history.push(ChatMessage::assistant(text));
        self.phase = LoopPhase::Done;
    }

    /// Serialized size of everything after the system prompt.
    pub fn conversation_size(&self) -> usize {
        self.history
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| serde_json::to_string(m).map(|s| s.chars().count()).unwrap_or(0))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: "add".into(),
            arguments: "{}".into(),
        }
    }

    fn fresh() -> LoopState {
        LoopState::new(vec![ChatMessage::system("sys"), ChatMessage::user("plan")])
    }

    #[test]
    fn step_budget_aborts_past_maximum() {
        let mut state = fresh();
        assert!(state.begin_step(2));
        assert!(state.begin_step(2));
        assert!(!state.begin_step(2));
        assert_eq!(state.phase(), &LoopPhase::Aborted);
        assert_eq!(state.steps(), 3);
    }

    #[test]
    fn tool_results_follow_requests() {
        let mut state = fresh();
        state.begin_step(12);
        state.record_tool_requests(String::new(), vec![call("a"), call("b")]);
        assert!(matches!(state.phase(), LoopPhase::AwaitingTools(calls) if calls.len() == 2));

        state.record_tool_results(vec![
            ToolResult::success("a", "3"),
            ToolResult::error("b", ToolError::UnknownTool("add".into())),
        ]);

        let history = state.history();
        assert_eq!(history.len(), 5);
        assert_eq!(history[2].requested_calls().len(), 2);
        assert_eq!(history[3].tool_call_id.as_deref(), Some("a"));
        assert_eq!(history[4].tool_call_id.as_deref(), Some("b"));
        assert_eq!(history[4].content, "Error: unknown tool 'add'");
        assert_eq!(state.phase(), &LoopPhase::AwaitingModel);
    }

    #[test]
    fn conversation_size_ignores_system_prompt() {
        let small = LoopState::new(vec![ChatMessage::system("x".repeat(5000)), ChatMessage::user("hi")]);
        assert!(small.conversation_size() < 100);
    }
}
