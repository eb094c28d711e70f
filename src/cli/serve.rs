use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use clap::Args;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::auth::TokenKeys;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, MySqlStorePool, MySqlUserStore, StoreClient};
use crate::server::{app, shutdown_signal};
use crate::state::AppState;

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Bind address (overrides API_BIND)")]
    pub bind: Option<String>,

    #[arg(short, long, help = "Port to listen on (overrides API_PORT)")]
    pub port: Option<u16>,
}

/// Any error returned from here happened before the server started serving.
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(bind) = args.bind {
        config.api.bind = bind;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    info!("Starting E-Voting Admin API in {:?} mode", config.environment);

    let pool = MySqlStorePool::connect_lazy(&config.database);
    let users = Arc::new(MySqlUserStore::connect_lazy(&config.database));
    let companions = vec![users.clone() as Arc<dyn StoreClient>];
    let database = Arc::new(DatabaseManager::new(
        pool,
        companions,
        config.database.url.target(),
    ));

    database
        .verify()
        .await
        .context("database startup probe failed")?;

    let keys = Arc::new(TokenKeys::new(
        config.security.jwt_secret.as_bytes(),
        Duration::hours(config.security.jwt_expiry_hours as i64),
    ));
    let state = AppState::new(keys, users, database.clone());
    let app = app(state, &config);

    let bind_addr = format!("{}:{}", config.api.bind, config.api.port);
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            database.shutdown().await;
            return Err(e).with_context(|| format!("failed to bind {}", bind_addr));
        }
    };

    info!("E-Voting Admin API listening on http://{}", bind_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    database.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}
