//! Newsroom CLI: the main entry point.
//!
//! Commands:
//! - `digest`    : Select and elaborate a digest from a candidate file
//! - `topics`    : Write a digest from a topic list, optionally with web search
//! - `providers` : List supported LLM backends
//! - `config`    : Show, validate, or initialize configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use newsroom_config::{AppConfig, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

#[derive(Parser)]
#[command(
    name = "newsroom",
    about = "Newsroom: multi-provider LLM news digest generator",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to $NEWSROOM_CONFIG, then ~/.newsroom/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a digest from a JSON file of candidate items
    Digest {
        /// JSON file with `{"primary": [...], "regional": [...]}` or a bare array
        #[arg(long)]
        candidates: PathBuf,

        /// Output language code; repeat or comma-separate for several digests
        #[arg(short, long = "language")]
        languages: Vec<String>,

        /// Write one markdown file per language here instead of printing
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Build a digest from a list of topics
    Topics {
        /// Topic to cover; repeat for several (defaults to configured topics)
        #[arg(short, long = "topic")]
        topics: Vec<String>,

        /// Let the model research with the web_search tool
        #[arg(long)]
        web_search: bool,

        /// Output language code; repeat or comma-separate for several digests
        #[arg(short, long = "language")]
        languages: Vec<String>,

        /// Write one markdown file per language here instead of printing
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// List supported LLM providers
    Providers,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets omitted)
    Show,
    /// Print the configuration file path
    Path,
    /// Validate the configuration and report the resolved settings
    Validate,
    /// Write a default configuration file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var(newsroom_config::CONFIG_PATH_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(AppConfig::default_path);

    // `config path` and `config init` must work even when the file is broken
    if let Commands::Config { action } = &cli.command {
        match action {
            ConfigAction::Path => return commands::config_cmd::path(&config_path),
            ConfigAction::Init => return commands::config_cmd::init(&config_path),
            ConfigAction::Show | ConfigAction::Validate => {}
        }
    }

    let config = AppConfig::load_with(Some(&config_path), |key| std::env::var(key).ok())
        .map_err(|e| format!("Failed to load config: {e}"))?;

    init_tracing(&config.logging, cli.verbose);

    match cli.command {
        Commands::Digest {
            candidates,
            languages,
            output_dir,
        } => commands::digest::run(&config, candidates, languages, output_dir).await?,
        Commands::Topics {
            topics,
            web_search,
            languages,
            output_dir,
        } => commands::topics::run(&config, topics, web_search, languages, output_dir).await?,
        Commands::Providers => commands::providers::run(&config)?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(&config)?,
            ConfigAction::Validate => commands::config_cmd::validate(&config, &config_path)?,
            ConfigAction::Path | ConfigAction::Init => {}
        },
    }

    Ok(())
}

/// `RUST_LOG` wins, then `--verbose`, then `logging.level`.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let fallback = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // Digests go to stdout, logs to stderr
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
