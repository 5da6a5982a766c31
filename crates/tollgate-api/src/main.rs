//! Tollgate API Server
//!
//! Configuration comes from the TOML file named by `TOLLGATE_CONFIG`, with
//! environment variables taking precedence, or from the environment alone.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tollgate_api::{
    auth::{SessionCoordinator, TokenService},
    create_router,
    state::AppState,
    validation::RequestValidator,
};
use tollgate_core::{
    AppConfig, InMemorySessionStore, LoggingConfig, PgSessionStore, SessionStore, StoreBackend,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(&config.logging);

    let (store, pg_store) = open_store(&config).await?;

    let tokens = TokenService::from_config(&config.tokens).with_context(|| {
        format!(
            "loading signing keys from {} and {}",
            config.tokens.private_key_path.display(),
            config.tokens.public_key_path.display()
        )
    })?;
    let coordinator = SessionCoordinator::from_config(store.clone(), Arc::new(tokens), &config)
        .context("configuring session coordinator")?;

    let addr = config.server.bind_addr();
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    let state = Arc::new(AppState::new(
        Arc::new(coordinator),
        store,
        RequestValidator::from_config(&config.validation),
    ));

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Tollgate API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pg) = pg_store {
        if tokio::time::timeout(shutdown_timeout, pg.close()).await.is_err() {
            tracing::warn!("Timed out closing database pool");
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

fn load_config() -> anyhow::Result<AppConfig> {
    let config = match std::env::var("TOLLGATE_CONFIG") {
        Ok(path) => AppConfig::from_file(&path)
            .and_then(AppConfig::with_env_override)
            .with_context(|| format!("loading configuration from {path}"))?,
        Err(_) => AppConfig::from_env().context("loading configuration from environment")?,
    };
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", logging.level)));

    if logging.json_format {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn open_store(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn SessionStore>, Option<PgSessionStore>)> {
    match config.database.backend {
        StoreBackend::Postgres => {
            let store =
                PgSessionStore::connect(&config.database.url, config.database.max_connections)
                    .await?;
            store.migrate().await?;
            tracing::info!("Connected to PostgreSQL session store");
            let shared: Arc<dyn SessionStore> = Arc::new(store.clone());
            Ok((shared, Some(store)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory session store; sessions are lost on restart");
            let shared: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
            Ok((shared, None))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
