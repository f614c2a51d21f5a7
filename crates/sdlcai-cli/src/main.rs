mod cmd;
mod context;
mod output;
mod state_dir;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, project::ProjectSubcommand, tool::ToolSubcommand};
use context::Context;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sdlcai",
    about = "AI-assisted SDLC client: manage projects, run tools, and browse the activity feed",
    version,
    propagate_version = true
)]
struct Cli {
    /// State directory (default: ~/.sdlcai)
    #[arg(long, global = true, env = "SDLCAI_HOME")]
    state_dir: Option<PathBuf>,

    /// API base URL (overrides config)
    #[arg(long, global = true, env = "SDLCAI_BASE_URL")]
    base_url: Option<String>,

    /// Static API key sent as x-api-key (overrides config)
    #[arg(long, global = true, env = "SDLCAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, list, inspect, select, and delete projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Show the activity feed across all projects, newest first
    Feed {
        /// Show at most this many entries
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// List and run the AI tools
    Tool {
        #[command(subcommand)]
        subcommand: ToolSubcommand,
    },

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = state_dir::resolve(cli.state_dir.as_deref()).and_then(|dir| {
        let ctx = Context::new(dir, cli.base_url, cli.api_key)?;
        match cli.command {
            Commands::Project { subcommand } => cmd::project::run(&ctx, subcommand, cli.json),
            Commands::Feed { limit } => cmd::feed::run(&ctx, limit, cli.json),
            Commands::Tool { subcommand } => cmd::tool::run(&ctx, subcommand, cli.json),
            Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand, cli.json),
        }
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
