use crate::config::Config;
use crate::providers::OpenAIProvider;
use crate::traits::Provider;
use anyhow::{Result, anyhow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Groq,
    OpenAI,
    OpenRouter,
    Ollama,
}

impl BackendKind {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" => Ok(Self::OpenAI),
            "openrouter" => Ok(Self::OpenRouter),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!(
                "Unknown provider: {}. Available: groq, openai, openrouter, ollama",
                name
            )),
        }
    }

    fn base_url(&self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::OpenAI => "https://api.openai.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::Ollama => "http://localhost:11434/v1",
        }
    }

    fn key_env_vars(&self) -> &'static [&'static str] {
        match self {
            Self::Groq => &["GROQ_API_KEY", "WAYFARER_GROQ_API_KEY"],
            Self::OpenAI => &["OPENAI_API_KEY", "WAYFARER_OPENAI_API_KEY"],
            Self::OpenRouter => &["OPENROUTER_API_KEY", "WAYFARER_OPENROUTER_API_KEY"],
            Self::Ollama => &[],
        }
    }

    fn requires_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

pub fn create_provider(config: &Config) -> Result<Box<dyn Provider>> {
    let kind = BackendKind::parse(config.provider.as_deref().unwrap_or("groq"))?;

    let api_key = match resolve_api_key_with_fallback(kind.key_env_vars(), &config.api_key) {
        Ok(key) => key,
        Err(_) if !kind.requires_key() => String::new(),
        Err(e) => return Err(e),
    };

    let provider = OpenAIProvider::new(api_key)
        .with_model(config.model.clone())
        .with_temperature(config.temperature)
        .with_base_url(config.base_url.as_deref().unwrap_or(kind.base_url()));

    Ok(Box::new(provider))
}

fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String> {
    for var_name in env_vars {
        if let Ok(key) = resolve_api_key_from_env(var_name) {
            return Ok(key);
        }
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(anyhow!(
            "No API key found. Set {} or run 'wayfarer onboard'.",
            env_vars.first().copied().unwrap_or("api_key")
        ))
    }
}

fn resolve_api_key_from_env(var_name: &str) -> Result<String> {
    std::env::var(var_name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("Environment variable {} not set", var_name))
}
