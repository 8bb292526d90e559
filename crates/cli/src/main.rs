//! Socio CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: Write a default config and create the data directories
//! - `serve`: Start the HTTP gateway for the browser extension
//! - `analyze`: Run text or an image through the moderation engine
//! - `recover`: Recover the original behind an encrypted log reference
//! - `history`: List processed texts or encryption records
//! - `status`: Show configuration and storage status

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "socio",
    about = "Socio: content safety decisions and reversible redaction",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit structured JSON logs
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the data directories
    Onboard,

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Analyze text (argument or stdin) or an image URL
    Analyze {
        /// Text to analyze; read from stdin when omitted
        text: Option<String>,

        /// Analyze this image URL instead of text
        #[arg(long, conflicts_with = "text")]
        image: Option<String>,

        /// Page the content was found on
        #[arg(long)]
        page: Option<String>,

        /// Only detect and decide; write no logs
        #[arg(long, conflicts_with = "image")]
        dry_run: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recover the original text behind a log reference
    Recover {
        /// A processing or encryption log reference
        reference: String,
    },

    /// List processed texts, newest first
    History {
        /// List encryption records instead
        #[arg(long)]
        encrypted: bool,

        /// Show at most this many entries
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration and storage status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Serve { port, host } => commands::serve::run(port, host).await?,
        Commands::Analyze {
            text,
            image,
            page,
            dry_run,
            json,
        } => {
            let request = commands::analyze::Request {
                text,
                image,
                page,
                dry_run,
                json,
            };
            commands::analyze::run(request).await?
        }
        Commands::Recover { reference } => commands::recover::run(&reference).await?,
        Commands::History {
            encrypted,
            limit,
            json,
        } => commands::history::run(encrypted, limit, json).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
