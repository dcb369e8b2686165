pub mod schema;

use arc_swap::ArcSwapOption;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use umbra_dns_domain::config::DatabaseConfig;
use umbra_dns_domain::DomainError;

/// Handle to the gravity policy store.
///
/// The store can disappear at any time (it is rewritten wholesale by the
/// gravity updater), so the pool is held behind a swappable slot: callers
/// acquire a clone per operation and the handle can be closed, reopened or
/// deliberately leaked without coordinating with in-flight lookups.
pub struct GravityDb {
    config: DatabaseConfig,
    pool: ArcSwapOption<SqlitePool>,
}

impl GravityDb {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: ArcSwapOption::empty(),
        }
    }

    /// Wrap an already-connected pool. Used by tests and by callers that
    /// manage the connection themselves.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self {
            config: DatabaseConfig::default(),
            pool: ArcSwapOption::from(Some(Arc::new(pool))),
        }
    }

    pub fn is_open(&self) -> bool {
        self.pool.load().is_some()
    }

    /// Connect to the store at the configured path. The busy timeout only
    /// applies to this initial open; later lookups fail fast and degrade
    /// instead of stalling query processing.
    pub async fn open(&self) -> Result<(), DomainError> {
        let options = SqliteConnectOptions::new()
            .filename(&self.config.path)
            .busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(self.config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                warn!(error = %e, path = %self.config.path, "Failed to open policy store");
                DomainError::StoreUnavailable
            })?;

        info!(path = %self.config.path, "Policy store opened");
        self.pool.store(Some(Arc::new(pool)));
        Ok(())
    }

    /// Cheap per-operation handle. Opens lazily if the store is not
    /// currently connected.
    pub async fn acquire(&self) -> Result<SqlitePool, DomainError> {
        if let Some(pool) = self.pool.load_full() {
            return Ok((*pool).clone());
        }
        self.open().await?;
        match self.pool.load_full() {
            Some(pool) => Ok((*pool).clone()),
            None => Err(DomainError::StoreUnavailable),
        }
    }

    pub async fn close(&self) {
        if let Some(pool) = self.pool.swap(None) {
            pool.close().await;
            debug!("Policy store closed");
        }
    }

    pub async fn reopen(&self) -> Result<(), DomainError> {
        self.close().await;
        self.open().await
    }

    /// Process-replication safety: a replicated child inherits this handle
    /// but must never run its destructor, which would checkpoint and close
    /// file descriptors shared with the parent. The slot is emptied and the
    /// pool leaked; the child lazily opens its own connection on first use.
    pub fn forget_after_replication(&self) {
        if let Some(pool) = self.pool.swap(None) {
            std::mem::forget(pool);
            debug!("Inherited policy store handle discarded without closing");
        }
    }
}
