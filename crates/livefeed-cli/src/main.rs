// LiveFeed CLI
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Wire the Postgres/moka/Iggy adapters directly, there is no server to talk to.
// Design Decision: Load .env with dotenvy before reading any configuration.
// Design Decision: `shell` keeps one process alive so the in-process cache serves repeat reads.

mod commands;
mod output;
mod services;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::services::Services;

#[derive(Parser)]
#[command(name = "livefeed")]
#[command(about = "LiveFeed CLI - Ingest activity events and read subject feeds")]
#[command(version)]
pub struct Cli {
    /// Postgres connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json"])]
    pub output: String,

    /// Suppress non-essential output
    #[arg(long, short)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Persist an event, cache it and publish it to the stream
    Ingest {
        /// Subject (feed owner) ID
        subject_id: i64,

        /// Event type, e.g. "like"
        event_type: String,

        /// Event payload as a JSON object
        #[arg(long, short, default_value = "{}")]
        payload: String,
    },

    /// Read a subject's feed
    Feed {
        /// Subject (feed owner) ID
        subject_id: i64,

        /// Number of consecutive reads, to observe cache hits
        #[arg(long, default_value = "1")]
        reads: u32,
    },

    /// Look up a single event by ID
    Event {
        /// Event ID
        event_id: i64,
    },

    /// Create or update the events table
    Migrate,

    /// Serve commands from stdin with one set of connections and one cache
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "livefeed=info,livefeed_core=info,livefeed_storage=info,livefeed_cache=warn,livefeed_stream=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let output_format = output::OutputFormat::parse(&cli.output);

    if let Commands::Migrate = cli.command {
        return commands::migrate::run(&cli.database_url, cli.quiet).await;
    }

    let services = Services::connect(&cli.database_url).await?;

    match cli.command {
        Commands::Ingest {
            subject_id,
            event_type,
            payload,
        } => {
            commands::ingest::run(
                &services,
                output_format,
                cli.quiet,
                subject_id,
                event_type,
                &payload,
            )
            .await
        }
        Commands::Feed { subject_id, reads } => {
            commands::feed::run(&services, output_format, cli.quiet, subject_id, reads).await
        }
        Commands::Event { event_id } => {
            commands::event::run(&services, output_format, event_id).await
        }
        Commands::Shell => commands::shell::run(&services, output_format, cli.quiet).await,
        Commands::Migrate => Ok(()),
    }
}
