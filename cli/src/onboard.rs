use crate::templates::DEFAULT_TRAVELER;
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Select};
use std::path::Path;
use wayfarer_core::config::{ApiKeys, Config};

const BANNER: &str = r"
    -------------------------------------

     w a y f a r e r   ~   trip planner

    -------------------------------------
";

const BACKENDS: [(&str, &str); 4] = [
    ("groq", "qwen/qwen3-32b"),
    ("openai", "gpt-4o-mini"),
    ("openrouter", "openai/gpt-4o-mini"),
    ("ollama", "qwen3:8b"),
];

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

fn ensure_file(path: &Path, content: &str) -> Result<bool> {
    if !path.exists() {
        std::fs::write(path, content)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

fn create_traveler_profile(workspace: &Path) -> Result<bool> {
    std::fs::create_dir_all(workspace)?;
    ensure_file(&workspace.join("TRAVELER.md"), DEFAULT_TRAVELER)
}

fn setup_backend() -> Result<usize> {
    let names: Vec<&str> = BACKENDS.iter().map(|(name, _)| *name).collect();

    Select::new()
        .with_prompt("Select your model backend")
        .items(&names)
        .default(0)
        .interact()
        .context("Failed to select backend")
}

fn setup_api_key(backend: &str) -> Result<String> {
    if backend == "ollama" {
        println!("  {} Ollama runs locally, no key needed.", style("✓").green());
        return Ok(String::new());
    }

    let api_key: String = Input::new()
        .with_prompt(format!("Enter your {} API key", backend))
        .interact_text()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        return Err(anyhow::anyhow!("API key cannot be empty"));
    }

    Ok(api_key.trim().to_string())
}

fn setup_model(default_model: &str) -> Result<String> {
    Input::new()
        .with_prompt("Model")
        .default(default_model.to_string())
        .interact_text()
        .context("Failed to read model name")
}

fn optional_key(prompt: &str) -> Result<Option<String>> {
    let key: String = Input::new()
        .with_prompt(format!("{} (leave empty to skip)", prompt))
        .allow_empty(true)
        .interact_text()
        .with_context(|| format!("Failed to read {}", prompt))?;

    let key = key.trim();
    Ok((!key.is_empty()).then(|| key.to_string()))
}

fn setup_data_keys() -> Result<ApiKeys> {
    println!(
        "  {}",
        style("Search falls back to DuckDuckGo when no search key is set.").dim()
    );
    println!();

    Ok(ApiKeys {
        openweather: optional_key("OpenWeatherMap API key")?,
        exchange_rate: optional_key("exchangerate-api key")?,
        serpapi: optional_key("SerpAPI key")?,
        serper: optional_key("Serper API key")?,
    })
}

pub fn run_onboard() -> Result<Config> {
    println!("{}", style(BANNER).cyan().bold());

    println!("  {}", style("Welcome to wayfarer!").white().bold());
    println!(
        "  {}",
        style("This wizard connects the planner to a model and live travel data.").dim()
    );
    println!();

    print_step(1, 4, "Model Backend");
    let (backend, default_model) = BACKENDS[setup_backend()?];
    let api_key = setup_api_key(backend)?;

    print_step(2, 4, "Model Selection");
    let model = setup_model(default_model)?;

    print_step(3, 4, "Travel Data Keys");
    let api_keys = setup_data_keys()?;

    let config = Config {
        provider: Some(backend.to_string()),
        api_key,
        model,
        api_keys,
        ..Default::default()
    };

    print_step(4, 4, "Traveler Profile");
    match create_traveler_profile(&config.workspace_dir) {
        Ok(created) => {
            let path = config.workspace_dir.join("TRAVELER.md");
            println!(
                "  {} {} {}",
                style("✓").green(),
                if created { "Profile created at" } else { "Keeping existing profile at" },
                style(path.display()).cyan()
            );
        }
        Err(e) => eprintln!(
            "  {} Warning: Could not create traveler profile: {}",
            style("!").yellow(),
            e
        ),
    }

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(wayfarer_core::config::get_config_path().display()).cyan()
    );
    println!();
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("wayfarer plan").cyan().bold()
    );
    println!();

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn traveler_profile_is_not_overwritten() {
        let tmp = TempDir::new().unwrap();
        assert!(create_traveler_profile(tmp.path()).unwrap());

        std::fs::write(tmp.path().join("TRAVELER.md"), "Vegan").unwrap();
        assert!(!create_traveler_profile(tmp.path()).unwrap());
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("TRAVELER.md")).unwrap(),
            "Vegan"
        );
    }

    #[test]
    fn every_backend_parses() {
        for (name, _) in BACKENDS {
            assert!(wayfarer_core::providers::BackendKind::parse(name).is_ok());
        }
    }
}
