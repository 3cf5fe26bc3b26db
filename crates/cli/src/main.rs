//! promptweave CLI: the main entry point.
//!
//! Commands:
//! - `render`: Lay out a prompt under its token budget and print it
//! - `list`  : List the prompts in the prompts folder
//! - `check` : Load every prompt and report configuration errors
//! - `tokens`: Count the tokens in a piece of text
//! - `config`: Show the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::render::{OutputFormat, RenderArgs};

#[derive(Parser)]
#[command(
    name = "promptweave",
    about = "promptweave: token-budgeted prompt layout",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration from this file instead of the default locations
    #[arg(short, long, global = true, env = "PROMPTWEAVE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a prompt
    Render {
        /// Prompt name (a folder under the prompts folder)
        name: String,

        /// JSON file with the turn state (one object per scope)
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// The user's input for this turn
        #[arg(short, long)]
        input: Option<String>,

        /// Token ceiling; defaults to the prompt's max_input_tokens
        #[arg(short, long)]
        max_tokens: Option<usize>,

        /// Output form
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Register a text data source: NAME=FILE
        #[arg(short = 'd', long = "data-source")]
        data_sources: Vec<String>,
    },

    /// List available prompts
    List,

    /// Load every prompt and report errors
    Check,

    /// Count tokens
    Tokens {
        /// Text to measure; `-` reads standard input
        text: String,

        /// Also print the token ids
        #[arg(long)]
        ids: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the default configuration file path
    Path,
    /// Print a default configuration file
    Default,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Render {
            name,
            state,
            input,
            max_tokens,
            format,
            data_sources,
        } => {
            let args = RenderArgs {
                name,
                state,
                input,
                max_tokens,
                format,
                data_sources,
            };
            commands::render::run(config_path, args).await?
        }
        Commands::List => commands::list::run(config_path)?,
        Commands::Check => commands::check::run(config_path)?,
        Commands::Tokens { text, ids } => commands::tokens::run(config_path, &text, ids)?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path)?,
            ConfigAction::Path => commands::config_cmd::path(),
            ConfigAction::Default => commands::config_cmd::default(),
        },
    }

    Ok(())
}
