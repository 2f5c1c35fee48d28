// Datasource Node
// Binds a pool to its transaction manager and lazily detected dialect

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::db::traits::{ConnectionPool, DatabaseError, Dialect, DialectResolver, PooledGuard};
use crate::db::transaction::TransactionManager;
use crate::registry::Identified;

/// Serializable view of a registered datasource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasourceInfo {
    pub id: Option<String>,
    pub key: String,
    pub name: String,
    pub url: String,
    pub dialect: Option<Dialect>,
    pub registered_at: DateTime<Utc>,
}

/// A registered backend. Pool and transaction manager never change after construction.
pub struct DatasourceNode {
    id: Option<String>,
    key: String,
    name: String,
    pool: Arc<dyn ConnectionPool>,
    transaction_manager: TransactionManager,
    dialect: ArcSwapOption<Dialect>,
    registered_at: DateTime<Utc>,
}

impl DatasourceNode {
    pub fn new(
        id: Option<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        pool: Arc<dyn ConnectionPool>,
    ) -> Self {
        Self {
            id,
            key: key.into(),
            name: name.into(),
            transaction_manager: TransactionManager::new(Arc::clone(&pool)),
            pool,
            dialect: ArcSwapOption::empty(),
            registered_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> &Arc<dyn ConnectionPool> {
        &self.pool
    }

    pub fn transaction_manager(&self) -> &TransactionManager {
        &self.transaction_manager
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// The dialect, if it has been detected already
    pub fn cached_dialect(&self) -> Option<Dialect> {
        self.dialect.load().as_deref().copied()
    }

    /// Detect the dialect on first use and memoize it.
    ///
    /// Only successes are cached; a failure is retried on the next call.
    /// Concurrent first calls may each detect, the last store wins.
    pub async fn resolve_dialect(
        &self,
        resolver: &dyn DialectResolver,
    ) -> Result<Dialect, DatabaseError> {
        if let Some(dialect) = self.cached_dialect() {
            return Ok(dialect);
        }

        let detected = self.detect_dialect(resolver).await?;
        self.dialect.store(Some(Arc::new(detected)));
        tracing::debug!(datasource = %self.key, dialect = %detected, "dialect detected");
        Ok(detected)
    }

    /// [`resolve_dialect`](Self::resolve_dialect) bounded by a deadline
    pub async fn resolve_dialect_with_timeout(
        &self,
        resolver: &dyn DialectResolver,
        timeout: Duration,
    ) -> Result<Dialect, DatabaseError> {
        match tokio::time::timeout(timeout, self.resolve_dialect(resolver)).await {
            Ok(result) => result,
            Err(_) => Err(DatabaseError::dialect_detection(
                &self.key,
                Some(DatabaseError::Timeout),
            )),
        }
    }

    async fn detect_dialect(&self, resolver: &dyn DialectResolver) -> Result<Dialect, DatabaseError> {
        // The guard hands the connection back on every exit path below.
        let conn = PooledGuard::acquire(Arc::clone(&self.pool))
            .await
            .map_err(|e| DatabaseError::dialect_detection(&self.key, Some(e)))?;

        match resolver.infer_dialect(conn.url()) {
            Ok(Some(dialect)) => Ok(dialect),
            Ok(None) => Err(DatabaseError::dialect_detection(&self.key, None)),
            Err(e) => Err(DatabaseError::dialect_detection(&self.key, Some(e))),
        }
    }

    pub fn info(&self) -> DatasourceInfo {
        DatasourceInfo {
            id: self.id.clone(),
            key: self.key.clone(),
            name: self.name.clone(),
            url: self.pool.url().to_string(),
            dialect: self.cached_dialect(),
            registered_at: self.registered_at,
        }
    }
}

impl Identified for DatasourceNode {
    fn identity(&self) -> Option<&str> {
        self.id()
    }
}

impl std::fmt::Debug for DatasourceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasourceNode")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("name", &self.name)
            .field("url", &self.pool.url())
            .field("dialect", &self.cached_dialect())
            .finish()
    }
}
