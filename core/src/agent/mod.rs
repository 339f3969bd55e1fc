pub mod compiler;
pub mod context;
pub mod invoker;
pub mod loop_;
pub mod registry;
pub mod state;

pub use compiler::{DEFAULT_COMPLETENESS_THRESHOLD, PlanCompiler};
pub use context::ContextBuilder;
pub use invoker::{DEFAULT_TOOL_TIMEOUT, ToolInvoker};
pub use loop_::{AgentLoop, DEFAULT_MAX_STEPS, PlanOutcome, PlanStatus};
pub use registry::ToolRegistry;
pub use state::{LoopPhase, LoopState};
