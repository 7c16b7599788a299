use clap::{Parser, Subcommand};

use crate::app::{self, AppState};
use crate::config::AppConfig;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "bibliotheque")]
#[command(about = "Bibliotheque - personal library catalog API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API (default)")]
    Serve {
        #[arg(long, env = "API_PORT", help = "Port to listen on")]
        port: Option<u16>,

        #[arg(long, env = "DATABASE_URL", help = "Database URL")]
        database_url: Option<String>,
    },

    #[command(about = "Apply pending database migrations and exit")]
    Migrate {
        #[arg(long, env = "DATABASE_URL", help = "Database URL")]
        database_url: Option<String>,
    },
}

pub async fn run(cli: Cli, mut config: AppConfig) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Commands::Serve {
        port: None,
        database_url: None,
    });

    match command {
        Commands::Serve { port, database_url } => {
            if let Some(port) = port {
                config.api.port = port;
            }
            if let Some(url) = database_url {
                config.database.url = url;
            }
            serve(config).await
        }
        Commands::Migrate { database_url } => {
            if let Some(url) = database_url {
                config.database.url = url;
            }
            // Connecting applies the migrations
            let pool = DatabaseManager::connect(&config.database).await?;
            pool.close().await;
            tracing::info!("Migrations applied to {}", config.database.url);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    let port = config.api.port;
    tracing::info!("Starting Bibliotheque in {:?} mode", config.environment);

    let state = AppState::connect(config).await?;
    let router = app::router(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Bibliotheque listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
