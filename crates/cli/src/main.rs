//! sopchat CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a starter config file
//! - `chat`    — Interactive SOP chat (or a single question)
//! - `search`  — Query the vector store directly

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "sopchat",
    about = "sopchat — SOP assistant over the company vector database",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file
    Onboard,

    /// Chat with the SOP assistant
    Chat {
        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        question: Option<String>,
    },

    /// Retrieve SOP context for a query, without the chat loop
    Search {
        /// The search query
        query: String,

        /// Number of nearest documents to request
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run()?,
        Commands::Chat { question } => commands::chat::run(question).await?,
        Commands::Search { query, limit } => commands::search::run(&query, limit).await?,
    }

    Ok(())
}
