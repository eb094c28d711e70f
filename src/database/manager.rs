use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Connection, MySql};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::DatabaseConfig;
use crate::database::fault::StoreFault;

/// Anything holding store connections that must be released on shutdown
#[async_trait]
pub trait StoreClient: Send + Sync {
    fn name(&self) -> &'static str;

    async fn close(&self) -> Result<(), StoreFault>;
}

/// A bounded connection pool. Connections go back to the pool when the
/// returned handle is dropped, so every exit path releases.
#[async_trait]
pub trait StorePool: StoreClient + 'static {
    type Connection: Send;

    async fn acquire(&self) -> Result<Self::Connection, sqlx::Error>;

    /// Trivial liveness command on an already acquired connection
    async fn ping(&self, conn: &mut Self::Connection) -> Result<(), sqlx::Error>;

    /// Connections currently checked out
    fn in_use(&self) -> usize;
}

/// Health view of the store, as seen by request handlers
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreFault>;

    async fn state(&self) -> LifecycleState;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    PoolConstructed,
    Healthy,
    ShuttingDown,
    Closed,
}

/// MySQL pool used for probes and administrative statements
#[derive(Clone)]
pub struct MySqlStorePool {
    pool: MySqlPool,
    options: MySqlConnectOptions,
    acquire_timeout: Duration,
}

impl MySqlStorePool {
    /// Build the pool without connecting; the startup probe opens the first
    /// connection.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let options = config.url.connect_options();
        let acquire_timeout = Duration::from_secs(config.connection_timeout);
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy_with(options.clone());
        Self {
            pool,
            options,
            acquire_timeout,
        }
    }

    /// The pool retries refused connects until its acquire timeout, which
    /// hides the cause. One direct attempt recovers the driver's error.
    async fn connect_error(&self) -> Option<sqlx::Error> {
        let attempt = MySqlConnection::connect_with(&self.options);
        match tokio::time::timeout(self.acquire_timeout, attempt).await {
            Ok(Ok(conn)) => {
                if let Err(e) = conn.close().await {
                    debug!("Closing diagnostic connection failed: {}", e);
                }
                None
            }
            Ok(Err(e)) => Some(e),
            Err(_) => None,
        }
    }
}

#[async_trait]
impl StoreClient for MySqlStorePool {
    fn name(&self) -> &'static str {
        "connection pool"
    }

    async fn close(&self) -> Result<(), StoreFault> {
        self.pool.close().await;
        Ok(())
    }
}

#[async_trait]
impl StorePool for MySqlStorePool {
    type Connection = PoolConnection<MySql>;

    async fn acquire(&self) -> Result<Self::Connection, sqlx::Error> {
        match self.pool.acquire().await {
            Err(sqlx::Error::PoolTimedOut) if self.pool.size() == 0 => {
                Err(self.connect_error().await.unwrap_or(sqlx::Error::PoolTimedOut))
            }
            other => other,
        }
    }

    async fn ping(&self, conn: &mut Self::Connection) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&mut **conn).await?;
        Ok(())
    }

    fn in_use(&self) -> usize {
        (self.pool.size() as usize).saturating_sub(self.pool.num_idle())
    }
}

/// Owns the store clients for the life of the process.
///
/// Constructed by the entry point and shared by reference; there is no
/// process-global instance.
pub struct DatabaseManager<P: StorePool> {
    pool: Arc<P>,
    companions: Vec<Arc<dyn StoreClient>>,
    target: String,
    state: Mutex<LifecycleState>,
}

impl<P: StorePool> DatabaseManager<P> {
    /// `companions` are closed alongside the pool on shutdown.
    pub fn new(pool: P, companions: Vec<Arc<dyn StoreClient>>, target: impl Into<String>) -> Self {
        let target = target.into();
        info!("Database pool constructed for {}", target);
        Self {
            pool: Arc::new(pool),
            companions,
            target,
            state: Mutex::new(LifecycleState::PoolConstructed),
        }
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Acquire, ping, release. The connection is dropped before the result
    /// is inspected.
    async fn probe(&self) -> Result<(), StoreFault> {
        let mut conn = self.pool.acquire().await?;
        let outcome = self.pool.ping(&mut conn).await;
        drop(conn);
        outcome.map_err(StoreFault::from)
    }

    /// Startup probe. On failure the clients are closed and the fault is
    /// returned so the caller can exit.
    pub async fn verify(&self) -> Result<(), StoreFault> {
        match self.probe().await {
            Ok(()) => {
                *self.state.lock().await = LifecycleState::Healthy;
                info!("Database {} is reachable", self.target);
                Ok(())
            }
            Err(fault) => {
                error!(kind = ?fault.kind(), "{}", fault.diagnostic(&self.target));
                error!("Underlying error: {}", fault);
                self.shutdown().await;
                Err(fault)
            }
        }
    }

    /// Close every client exactly once. Later calls are no-ops. Close
    /// failures are logged, never returned.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if matches!(*state, LifecycleState::ShuttingDown | LifecycleState::Closed) {
            debug!("Database shutdown already performed");
            return;
        }
        *state = LifecycleState::ShuttingDown;
        info!("Closing database clients for {}", self.target);

        let pool: Arc<dyn StoreClient> = self.pool.clone();
        let clients = std::iter::once(pool).chain(self.companions.iter().cloned());
        let results = join_all(clients.map(|client| async move {
            let outcome = client.close().await;
            (client.name(), outcome)
        }))
        .await;

        for (name, outcome) in results {
            match outcome {
                Ok(()) => info!("Closed database {}", name),
                Err(fault) => warn!("Failed to close database {}: {}", name, fault),
            }
        }

        *state = LifecycleState::Closed;
    }
}

#[async_trait]
impl<P: StorePool> HealthProbe for DatabaseManager<P> {
    async fn health_check(&self) -> Result<(), StoreFault> {
        self.probe().await.map_err(|fault| {
            warn!("Health probe failed: {}", fault.diagnostic(&self.target));
            fault
        })
    }

    async fn state(&self) -> LifecycleState {
        *self.state.lock().await
    }
}
