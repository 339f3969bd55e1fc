use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const WAYFARER_DIR: &str = ".wayfarer";

/// Keys for the data providers behind the travel tools. Each one can also be
/// supplied through the environment or a `.env` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiKeys {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openweather: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serpapi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serper: Option<String>,
}

impl ApiKeys {
    const ENV_VARS: [&'static str; 4] = [
        "OPENWEATHER_API_KEY",
        "EXCHANGE_RATE_API_KEY",
        "SERPAPI_KEY",
        "SERPER_API_KEY",
    ];

    /// Environment values win over the config file; blank values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let slots = [
            &mut self.openweather,
            &mut self.exchange_rate,
            &mut self.serpapi,
            &mut self.serper,
        ];

        for (var, slot) in Self::ENV_VARS.iter().zip(slots) {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                *slot = Some(value);
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    /// Upper bound on model requests per planning session.
    pub max_steps: usize,
    /// Conversations whose serialized size stays below this many characters
    /// get one extra synthesis request.
    pub completeness_threshold: usize,
    pub tool_timeout_secs: u64,
    pub min_search_result_chars: usize,
    pub api_keys: ApiKeys,
    #[serde(skip)]
    pub workspace_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: None,
            api_key: String::new(),
            base_url: None,
            model: "qwen/qwen3-32b".to_string(),
            temperature: 0.7,
            max_steps: 12,
            completeness_threshold: 700,
            tool_timeout_secs: 30,
            min_search_result_chars: 50,
            api_keys: ApiKeys::default(),
            workspace_dir: get_wayfarer_dir().join("workspace"),
        }
    }
}

pub fn get_wayfarer_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(WAYFARER_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_wayfarer_dir().join("config.toml")
}

pub fn ensure_wayfarer_dir() -> Result<PathBuf> {
    let wayfarer_dir = get_wayfarer_dir();

    if !wayfarer_dir.exists() {
        std::fs::create_dir_all(&wayfarer_dir).with_context(|| {
            format!(
                "Failed to create wayfarer directory at {}",
                wayfarer_dir.display()
            )
        })?;
    }

    Ok(wayfarer_dir)
}

impl Config {
    /// Loads the config file when present, otherwise defaults, then layers
    /// `.env` and process environment on top.
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            load_config_from(config_path)?
        } else {
            Config::default()
        };

        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            tracing::warn!("Ignoring unreadable .env file: {}", e);
        }
        config
            .api_keys
            .apply_env_with(|var| std::env::var(var).ok());

        Ok(config)
    }

    pub fn tool_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tool_timeout_secs.max(1))
    }

    /// Wall-clock allowance for one search fallback chain, leaving headroom
    /// under the tool timeout.
    pub fn search_budget(&self) -> std::time::Duration {
        self.tool_timeout() * 4 / 5
    }
}

pub fn load_config_from(config_path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "Config file not found. Run 'wayfarer onboard' to set up your configuration."
            )
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.workspace_dir = config_path
        .parent()
        .map(|dir| dir.join("workspace"))
        .unwrap_or_else(|| get_wayfarer_dir().join("workspace"));

    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_wayfarer_dir()?;
    save_config_to(config, &get_config_path())
}

pub fn save_config_to(config: &Config, config_path: &Path) -> Result<()> {
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_planner_limits() {
        let config = Config::default();
        assert_eq!(config.max_steps, 12);
        assert_eq!(config.completeness_threshold, 700);
        assert_eq!(config.min_search_result_chars, 50);
        assert_eq!(config.tool_timeout(), std::time::Duration::from_secs(30));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "provider = \"openai\"\nmodel = \"gpt-4o\"\n\n[api_keys]\nserper = \"abc\"\n",
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.provider.as_deref(), Some("openai"));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_steps, 12);
        assert_eq!(config.api_keys.serper.as_deref(), Some("abc"));
        assert_eq!(config.workspace_dir, tmp.path().join("workspace"));
    }

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        let config = Config {
            max_steps: 8,
            api_keys: ApiKeys {
                openweather: Some("owm".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.max_steps, 8);
        assert_eq!(loaded.api_keys, config.api_keys);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_from(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.model, "qwen/qwen3-32b");
        assert_eq!(config.max_steps, 12);
        assert!(!tmp.path().join("config.toml").exists());
    }

    #[test]
    fn load_reads_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "max_steps = 6\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().max_steps, 6);
    }

    #[test]
    fn search_budget_stays_under_tool_timeout() {
        let config = Config::default();
        assert_eq!(config.search_budget(), crate::tools::DEFAULT_SEARCH_BUDGET);

        let short = Config {
            tool_timeout_secs: 10,
            ..Default::default()
        };
        assert_eq!(short.search_budget(), std::time::Duration::from_secs(8));
        assert!(short.search_budget() < short.tool_timeout());
    }

    #[test]
    fn missing_file_mentions_onboarding() {
        let tmp = TempDir::new().unwrap();
        let err = load_config_from(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("wayfarer onboard"));
    }

    #[test]
    fn env_overrides_file_keys() {
        let mut keys = ApiKeys {
            serpapi: Some("from-file".into()),
            serper: Some("keep-me".into()),
            ..Default::default()
        };

        keys.apply_env_with(|var| match var {
            "SERPAPI_KEY" => Some("from-env".into()),
            "SERPER_API_KEY" => Some("   ".into()),
            "OPENWEATHER_API_KEY" => Some("owm".into()),
            _ => None,
        });

        assert_eq!(keys.serpapi.as_deref(), Some("from-env"));
        assert_eq!(keys.serper.as_deref(), Some("keep-me"));
        assert_eq!(keys.openweather.as_deref(), Some("owm"));
        assert_eq!(keys.exchange_rate, None);
    }
}
