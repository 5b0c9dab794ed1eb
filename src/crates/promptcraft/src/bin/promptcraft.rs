//! PromptCraft CLI - generate or improve prompts from the command line
//!
//! Logs go to stderr; stdout carries only the result.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use promptcraft::{
    visualize, ConfigLoader, PromptCraftConfig, PromptWorkflow, VisualizationFormat,
    WorkflowOutcome,
};
use std::path::PathBuf;
use tracing::{debug, info, Level};

#[derive(Parser, Debug)]
#[command(name = "promptcraft")]
#[command(about = "Generate and improve LLM prompts with a scored critique loop", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Extra config file layered over the user and project files
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the model identifier
    #[arg(long, global = true)]
    model: Option<String>,

    /// Override the critique round cap
    #[arg(long, global = true, value_name = "N")]
    max_rounds: Option<usize>,

    /// Print the full outcome as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a prompt for a task description
    Generate {
        /// What the prompt should accomplish
        task: String,
    },

    /// Improve an existing prompt using extra context
    Improve {
        /// Prompt to improve
        #[arg(short, long)]
        prompt: String,

        /// Guidance for the rewrite
        #[arg(short, long)]
        context: String,
    },

    /// Print the workflow graph
    Graph {
        /// Output format: mermaid (default), dot
        #[arg(short, long, default_value = "mermaid")]
        format: VisualizationFormat,
    },

    /// Print the effective configuration with the API key masked
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, sources) = load_config(&cli).await?;
    init_tracing(&cli, &config)?;
    for path in &sources {
        debug!(path = %path.display(), "Loaded config layer");
    }
    info!(
        model = %config.llm.model,
        layers = sources.len(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Generate { task } => {
            let workflow = PromptWorkflow::builder(config).build()?;
            let outcome = workflow.generate(task).await?;
            print_outcome(&outcome, cli.json)?;
        }
        Commands::Improve { prompt, context } => {
            let workflow = PromptWorkflow::builder(config).build()?;
            let outcome = workflow.improve(prompt, context).await?;
            print_outcome(&outcome, cli.json)?;
        }
        Commands::Graph { format } => {
            print!("{}", visualize(format));
        }
        Commands::Config => {
            let redacted = config.redacted();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&redacted)?);
            } else {
                print!("{}", redacted.to_toml_string()?);
            }
        }
    }

    Ok(())
}

/// Load config and apply CLI overrides. Runs before the subscriber is
/// installed, so the layer list is returned for logging afterwards.
async fn load_config(cli: &Cli) -> anyhow::Result<(PromptCraftConfig, Vec<PathBuf>)> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_explicit(path);
    }

    let (mut config, sources) = loader
        .load_with_sources()
        .await
        .context("Failed to load configuration")?;
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    if let Some(rounds) = cli.max_rounds {
        config.workflow.max_critique_rounds = rounds;
    }
    Ok((config, sources))
}

fn init_tracing(cli: &Cli, config: &PromptCraftConfig) -> anyhow::Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.logging.max_level()?
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn print_outcome(outcome: &WorkflowOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    let prompt = outcome
        .final_prompt()
        .ok_or_else(|| anyhow!("Workflow finished without producing a prompt"))?;
    println!("{}", prompt);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_config_reports_explicit_layer_last() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cli.toml");
        std::fs::write(&path, "[llm]\nmodel = \"from-file\"\n").unwrap();

        let cli = Cli::try_parse_from([
            "promptcraft",
            "--config",
            path.to_str().unwrap(),
            "--max-rounds",
            "1",
            "graph",
        ])
        .unwrap();
        let (config, sources) = load_config(&cli).await.unwrap();

        assert_eq!(config.llm.model, "from-file");
        assert_eq!(config.workflow.max_critique_rounds, 1);
        assert_eq!(sources.last(), Some(&path));
    }
}
