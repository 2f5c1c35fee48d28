// SQLite Pool
// File-based connections opened on demand, bounded by a semaphore

use rusqlite::{Connection as RusqliteConnection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::PoolSettings;
use crate::db::traits::{Connection, ConnectionPool, DatabaseError};

/// Connection configuration for SQLite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Path to the SQLite database file
    pub path: String,
}

impl SqliteConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Expand `~/` to the home directory
    fn resolved_path(&self) -> Result<String, DatabaseError> {
        if self.path.is_empty() {
            return Err(DatabaseError::InvalidConfig(
                "SQLite database path is required".to_string(),
            ));
        }

        let path = match (self.path.strip_prefix("~/"), std::env::var_os("HOME")) {
            (Some(rest), Some(home)) => Path::new(&home).join(rest).to_string_lossy().to_string(),
            _ => self.path.clone(),
        };
        Ok(path)
    }
}

/// SQLite connection holding its pool permit
pub struct SqliteConnection {
    url: String,
    conn: RusqliteConnection,
    _permit: OwnedSemaphorePermit,
}

impl SqliteConnection {
    /// Underlying rusqlite connection
    pub fn raw(&self) -> &RusqliteConnection {
        &self.conn
    }
}

#[async_trait::async_trait]
impl Connection for SqliteConnection {
    fn url(&self) -> &str {
        &self.url
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))
    }
}

/// SQLite "pool": opens a connection per borrow, at most `max_size` at once
pub struct SqlitePool {
    path: String,
    url: String,
    permits: Arc<Semaphore>,
    settings: PoolSettings,
}

impl SqlitePool {
    pub fn new(config: &SqliteConfig, settings: &PoolSettings) -> Result<Self, DatabaseError> {
        let path = config.resolved_path()?;
        Ok(Self {
            url: format!("jdbc:sqlite:{}", path),
            path,
            permits: Arc::new(Semaphore::new(settings.max_size.max(1) as usize)),
            settings: settings.clone(),
        })
    }

    fn open_connection(&self) -> Result<RusqliteConnection, DatabaseError> {
        RusqliteConnection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|e| DatabaseError::ConnectionFailed(format!("Failed to open SQLite database: {}", e)))
    }

    /// Connections currently borrowed
    pub fn in_use(&self) -> usize {
        self.settings.max_size.max(1) as usize - self.permits.available_permits()
    }
}

#[async_trait::async_trait]
impl ConnectionPool for SqlitePool {
    fn url(&self) -> &str {
        &self.url
    }

    async fn get(&self) -> Result<Box<dyn Connection>, DatabaseError> {
        let permit = tokio::time::timeout(
            self.settings.connection_timeout(),
            Arc::clone(&self.permits).acquire_owned(),
        )
        .await
        .map_err(|_| DatabaseError::Timeout)?
        .map_err(|e| DatabaseError::PoolError(e.to_string()))?;

        let conn = self.open_connection()?;
        Ok(Box::new(SqliteConnection {
            url: self.url.clone(),
            conn,
            _permit: permit,
        }))
    }

    fn release(&self, conn: Box<dyn Connection>) {
        // Closing the connection returns its permit.
        drop(conn);
    }
}
