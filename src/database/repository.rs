use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use crate::config::DatabaseConfig;
use crate::database::fault::StoreFault;
use crate::database::manager::StoreClient;
use crate::database::models::{AccountStatus, Identity, UserLogin, UserRecord};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    /// Clamp caller-supplied paging into a bounded window
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Account storage used by the gates and the user administration routes
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Single point read by primary key
    async fn find_identity(&self, id: u64) -> Result<Option<Identity>, StoreFault>;

    async fn find_login(&self, email: &str) -> Result<Option<UserLogin>, StoreFault>;

    async fn list_users(&self, page: Page) -> Result<Vec<UserRecord>, StoreFault>;

    async fn find_user(&self, id: u64) -> Result<Option<UserRecord>, StoreFault>;

    /// Returns the updated record, or `None` when no such user exists
    async fn set_status(
        &self,
        id: u64,
        status: AccountStatus,
    ) -> Result<Option<UserRecord>, StoreFault>;
}

/// MySQL-backed [`UserStore`] on its own pool
#[derive(Clone)]
pub struct MySqlUserStore {
    pool: MySqlPool,
}

const IDENTITY_COLUMNS: &str = "id, email, name, role, status";
const RECORD_COLUMNS: &str = "id, email, name, role, status, created_at, updated_at";

impl MySqlUserStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy_with(config.url.connect_options());
        Self::new(pool)
    }
}

#[async_trait]
impl UserStore for MySqlUserStore {
    async fn find_identity(&self, id: u64) -> Result<Option<Identity>, StoreFault> {
        let query = format!("SELECT {} FROM users WHERE id = ?", IDENTITY_COLUMNS);
        let identity = sqlx::query_as::<_, Identity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(identity)
    }

    async fn find_login(&self, email: &str) -> Result<Option<UserLogin>, StoreFault> {
        let query = format!(
            "SELECT {}, password_hash FROM users WHERE email = ?",
            IDENTITY_COLUMNS
        );
        let login = sqlx::query_as::<_, UserLogin>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(login)
    }

    async fn list_users(&self, page: Page) -> Result<Vec<UserRecord>, StoreFault> {
        let query = format!(
            "SELECT {} FROM users ORDER BY id LIMIT ? OFFSET ?",
            RECORD_COLUMNS
        );
        let users = sqlx::query_as::<_, UserRecord>(&query)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_user(&self, id: u64) -> Result<Option<UserRecord>, StoreFault> {
        let query = format!("SELECT {} FROM users WHERE id = ?", RECORD_COLUMNS);
        let user = sqlx::query_as::<_, UserRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn set_status(
        &self,
        id: u64,
        status: AccountStatus,
    ) -> Result<Option<UserRecord>, StoreFault> {
        sqlx::query("UPDATE users SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.find_user(id).await
    }
}

#[async_trait]
impl StoreClient for MySqlUserStore {
    fn name(&self) -> &'static str {
        "repository client"
    }

    async fn close(&self) -> Result<(), StoreFault> {
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(Page::default(), Page { limit: DEFAULT_PAGE_SIZE, offset: 0 });
        assert_eq!(Page::new(Some(0), Some(5)).limit, 1);
        assert_eq!(Page::new(Some(10_000), None).limit, MAX_PAGE_SIZE);
        assert_eq!(Page::new(Some(20), Some(40)), Page { limit: 20, offset: 40 });
    }
}
