// Datasource Collaborator Traits
// Contracts for pools, connections and dialect detection, plus the shared error type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// SQL dialects that can be inferred from a connection URL
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    MariaDb,
    PostgreSql,
    Sqlite,
    SqlServer,
    Oracle,
    ClickHouse,
    Db2,
    H2,
}

impl Dialect {
    /// Display name for listings
    pub fn display_name(&self) -> &'static str {
        match self {
            Dialect::MySql => "MySQL",
            Dialect::MariaDb => "MariaDB",
            Dialect::PostgreSql => "PostgreSQL",
            Dialect::Sqlite => "SQLite",
            Dialect::SqlServer => "Microsoft SQL Server",
            Dialect::Oracle => "Oracle",
            Dialect::ClickHouse => "ClickHouse",
            Dialect::Db2 => "IBM Db2",
            Dialect::H2 => "H2",
        }
    }

    /// Default port for the dialect
    pub fn default_port(&self) -> u16 {
        match self {
            Dialect::Sqlite | Dialect::H2 => 0, // Embedded, no port
            Dialect::MySql | Dialect::MariaDb => 3306,
            Dialect::PostgreSql => 5432,
            Dialect::SqlServer => 1433,
            Dialect::Oracle => 1521,
            Dialect::ClickHouse => 8123,
            Dialect::Db2 => 50000,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Common database error type
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Datasource not found: '{0}'")]
    NotFound(String),

    #[error("Failed to detect dialect for datasource '{key}'")]
    DialectDetectionFailed {
        key: String,
        #[source]
        cause: Option<Box<DatabaseError>>,
    },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Pool error: {0}")]
    PoolError(String),

    #[error("Query execution error: {0}")]
    QueryError(String),

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Timeout error")]
    Timeout,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DatabaseError {
    pub(crate) fn dialect_detection(key: &str, cause: Option<DatabaseError>) -> Self {
        DatabaseError::DialectDetectionFailed {
            key: key.to_string(),
            cause: cause.map(Box::new),
        }
    }
}

impl<E: std::error::Error + 'static> From<bb8::RunError<E>> for DatabaseError {
    fn from(err: bb8::RunError<E>) -> Self {
        match err {
            bb8::RunError::TimedOut => DatabaseError::Timeout,
            bb8::RunError::User(e) => DatabaseError::PoolError(e.to_string()),
        }
    }
}

/// A borrowed database connection
#[async_trait::async_trait]
pub trait Connection: Send {
    /// Metadata URL of the backend this connection talks to
    fn url(&self) -> &str;

    /// Execute one or more statements without returning rows
    async fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError>;
}

/// Connection-providing resource owned outside the registry
#[async_trait::async_trait]
pub trait ConnectionPool: Send + Sync {
    /// Descriptive URL of the pooled backend
    fn url(&self) -> &str;

    /// Borrow a connection from the pool
    async fn get(&self) -> Result<Box<dyn Connection>, DatabaseError>;

    /// Return a borrowed connection to the pool
    fn release(&self, conn: Box<dyn Connection>);
}

/// Infers a dialect from a connection metadata URL
pub trait DialectResolver: Send + Sync {
    /// `Ok(None)` when the URL is not recognised
    fn infer_dialect(&self, url: &str) -> Result<Option<Dialect>, DatabaseError>;
}

/// Scoped connection: returned to its pool exactly once when dropped
pub struct PooledGuard {
    pool: Arc<dyn ConnectionPool>,
    conn: Option<Box<dyn Connection>>,
}

impl PooledGuard {
    /// Borrow a connection from `pool`
    pub async fn acquire(pool: Arc<dyn ConnectionPool>) -> Result<Self, DatabaseError> {
        let conn = pool.get().await?;
        Ok(Self {
            pool,
            conn: Some(conn),
        })
    }

    pub fn url(&self) -> &str {
        self.conn.as_deref().map(|c| c.url()).unwrap_or_default()
    }

    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError> {
        match self.conn.as_deref_mut() {
            Some(conn) => conn.execute_batch(sql).await,
            None => Err(DatabaseError::ConnectionFailed(
                "connection already released".to_string(),
            )),
        }
    }
}

impl Drop for PooledGuard {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::CountingPool;
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_dialect_metadata() {
        assert_eq!(Dialect::PostgreSql.default_port(), 5432);
        assert_eq!(Dialect::Sqlite.default_port(), 0);
        assert_eq!(Dialect::SqlServer.to_string(), "Microsoft SQL Server");
    }

    #[test]
    fn test_dialect_detection_error_wraps_cause() {
        let err = DatabaseError::dialect_detection("main", Some(DatabaseError::Timeout));

        assert!(err.to_string().contains("'main'"));
        assert_eq!(err.source().map(|s| s.to_string()), Some("Timeout error".to_string()));

        let bare = DatabaseError::dialect_detection("main", None);
        assert!(bare.source().is_none());
    }

    #[tokio::test]
    async fn test_guard_releases_on_drop() {
        let pool = CountingPool::new("jdbc:h2:mem:test");
        {
            let guard = PooledGuard::acquire(pool.clone()).await.unwrap();
            assert_eq!(guard.url(), "jdbc:h2:mem:test");
            assert_eq!(pool.released(), 0);
        }
        assert_eq!(pool.borrowed(), 1);
        assert_eq!(pool.released(), 1);
    }

    #[tokio::test]
    async fn test_guard_not_created_when_pool_fails() {
        let pool = CountingPool::failing("jdbc:h2:mem:test");
        let result = PooledGuard::acquire(pool.clone()).await;

        assert!(matches!(result, Err(DatabaseError::ConnectionFailed(_))));
        assert_eq!(pool.released(), 0);
    }
}
