use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lostfound_api::config::AppConfig;
use lostfound_api::database::{DatabaseManager, PgItemStore};

#[derive(Parser)]
#[command(name = "lostfound-api")]
#[command(about = "Lost & Found items API server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides LOSTFOUND_API_PORT / PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Create the lost_items table and exit")]
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET, DATABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lostfound_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    tracing::info!("Starting Lost & Found API in {:?} mode", config.environment);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let state = lostfound_api::build_state(config).await?;
            lostfound_api::serve(state, port).await
        }
        Commands::Migrate => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to the database")?;
            PgItemStore::new(pool).migrate().await?;
            Ok(())
        }
    }
}
