use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::Input;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wayfarer_core::{AgentError, agent, config, providers, tools};

mod onboard;
mod templates;

const EXAMPLE_REQUEST: &str = "I want to go to Venice for 5 days. My budget for the hotel is 100 USD a night and I will pay in JPY. Find the best local places to eat and what to wear.";

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(about = "wayfarer - plans complete trips with real-time data", long_about = None)]
struct Cli {
    /// Log agent steps and tool calls to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the model backend and data provider keys
    Onboard,
    /// Plan a trip from a free-text description
    Plan {
        #[arg(short, long)]
        request: Option<String>,

        /// Print the Markdown plan without terminal styling
        #[arg(long)]
        raw: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,wayfarer_core=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or_else(|| {
        if !config::config_exists() {
            Commands::Onboard
        } else {
            Commands::Plan {
                request: None,
                raw: false,
            }
        }
    });

    match command {
        Commands::Onboard => {
            let onboard_config = onboard::run_onboard().context("Onboarding failed")?;
            config::save_config(&onboard_config)?;
        }
        Commands::Plan { request, raw } => {
            let request = match request {
                Some(request) => request,
                None => Input::new()
                    .with_prompt("Where would you like to go?")
                    .default(EXAMPLE_REQUEST.to_string())
                    .interact_text()?,
            };

            if request.trim().is_empty() {
                anyhow::bail!("Please describe the trip you want to plan.");
            }

            let config = config::Config::load()?;
            let agent_loop = build_agent(&config)?;

            eprintln!("\n🧭 Planning your trip...\n");
            match agent_loop.plan(&request).await {
                Ok(outcome) => {
                    if !outcome.is_complete() {
                        eprintln!(
                            "{} Planning stopped early; showing what was gathered.",
                            style("!").yellow()
                        );
                    }
                    print_plan(&outcome.text, raw);
                }
                Err(e) => {
                    eprintln!("{}", failure_message(&e));
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn build_agent(config: &config::Config) -> Result<agent::AgentLoop> {
    let provider: Arc<dyn wayfarer_core::Provider> = providers::create_provider(config)?.into();

    let services = tools::TravelServices::from_config(config);
    let registry = tools::build_registry(
        &services,
        config.min_search_result_chars,
        config.search_budget(),
    )?;
    let invoker = agent::ToolInvoker::new(Arc::new(registry)).with_timeout(config.tool_timeout());

    let context_builder =
        agent::ContextBuilder::new(&config.workspace_dir).with_tool_specs(invoker.catalog());

    tracing::debug!(
        backend = provider.name(),
        model = %config.model,
        tools = invoker.catalog().len(),
        "agent ready"
    );

    Ok(agent::AgentLoop::new(provider, context_builder, invoker)
        .with_max_steps(config.max_steps)
        .with_compiler(Some(agent::PlanCompiler::new(config.completeness_threshold))))
}

/// Plain-text report shown in place of the plan, with the full cause chain.
fn failure_message(error: &AgentError) -> String {
    match error {
        AgentError::ModelBackendUnavailable(cause) => {
            format!("❌ Trip planning failed: model backend unavailable: {cause:#}")
        }
        other => format!("❌ Trip planning failed: {other}"),
    }
}

fn print_plan(plan: &str, raw: bool) {
    if raw {
        println!("{}", plan);
    } else {
        termimad::MadSkin::default().print_text(plan);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_is_reported_once_with_its_cause() {
        let error = AgentError::ModelBackendUnavailable(
            anyhow::anyhow!("connection refused").context("POST /chat/completions"),
        );

        let message = failure_message(&error);
        assert_eq!(
            message,
            "❌ Trip planning failed: model backend unavailable: POST /chat/completions: connection refused"
        );
        assert_eq!(message.matches("model backend unavailable").count(), 1);
    }
}
