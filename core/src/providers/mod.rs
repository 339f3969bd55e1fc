pub mod factory;
pub mod openai;

pub use factory::{BackendKind, create_provider};
pub use openai::OpenAIProvider;
