pub mod agent;
pub mod config;
pub mod error;
pub mod providers;
pub mod tools;
pub mod traits;

pub use agent::{
    AgentLoop, ContextBuilder, PlanCompiler, PlanOutcome, PlanStatus, ToolInvoker, ToolRegistry,
};
pub use config::*;
pub use error::{AgentError, RegistryError, ToolError};
pub use providers::*;
pub use tools::*;
pub use traits::*;
