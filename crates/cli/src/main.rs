//! GenWeb CLI, the main entry point.
//!
//! Commands:
//! - `serve`    : Start the HTTP gateway and front-end
//! - `generate` : Generate one page and stream the HTML to stdout
//! - `agents`   : List configured agents

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "genweb",
    about = "GenWeb: pages generated on demand for web+gen:// links",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.genweb/config.toml)
    #[arg(short, long, global = true, env = "GENWEB_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate a page once and write the HTML to stdout
    Generate {
        /// Agent name, e.g. nike.com
        agent: String,

        /// What the page should do; words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// List the agents in the agent directory
    Agents,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so `generate` output can be piped
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(config, port, host).await?,
        Commands::Generate { agent, query } => {
            commands::generate::run(config, &agent, &query.join(" ")).await?
        }
        Commands::Agents => commands::agents::run(config).await?,
    }

    Ok(())
}
