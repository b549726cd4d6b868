//! Crossduel Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crossduel_engine::infrastructure::{
    clock::SystemClock,
    config::AppConfig,
    ports::PuzzleRepo,
    puzzles::{SqlitePuzzleRepo, UnavailablePuzzleRepo},
};
use crossduel_engine::{api, App};

/// Spawn a task that cancels `cancel_token` on Ctrl+C or SIGTERM.
fn setup_shutdown_signal(cancel_token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }

        cancel_token.cancel();
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crossduel_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Crossduel Engine");

    let cancel_token = CancellationToken::new();
    setup_shutdown_signal(cancel_token.clone());

    let config = AppConfig::from_env()?;

    // Sessions still start on the fallback puzzle if the store is down.
    let puzzles: Arc<dyn PuzzleRepo> = match SqlitePuzzleRepo::new(&config.puzzle_db_path).await {
        Ok(repo) => {
            tracing::info!(path = %config.puzzle_db_path, "Puzzle store opened");
            Arc::new(repo)
        }
        Err(e) => {
            tracing::warn!(
                path = %config.puzzle_db_path,
                error = %e,
                "Puzzle store unavailable, sessions will use the fallback puzzle"
            );
            Arc::new(UnavailablePuzzleRepo::new(e.to_string()))
        }
    };

    let app = Arc::new(App::new(
        puzzles,
        Arc::new(SystemClock::new()),
        &config,
        cancel_token.clone(),
    ));
    let router = api::router(app);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        cancel_token.cancelled().await;
        tracing::info!("HTTP server received shutdown signal");
    })
    .await?;

    tracing::info!("Crossduel Engine stopped");
    Ok(())
}
