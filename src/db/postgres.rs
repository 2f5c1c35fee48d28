// PostgreSQL Pool
// bb8-backed connection pool exposed through the ConnectionPool contract

use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use serde::{Deserialize, Serialize};
use tokio_postgres::NoTls;

use crate::config::PoolSettings;
use crate::db::traits::{Connection, ConnectionPool, DatabaseError, Dialect};

/// Connection configuration for PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: Option<u16>,
    pub database: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub sslmode: Option<String>,
}

impl PostgresConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| Dialect::PostgreSql.default_port())
    }

    fn database(&self) -> &str {
        if self.database.is_empty() {
            "postgres"
        } else {
            &self.database
        }
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        if self.host.is_empty() {
            return Err(DatabaseError::InvalidConfig("Host is required".to_string()));
        }
        if self.username.is_empty() {
            return Err(DatabaseError::InvalidConfig("Username is required".to_string()));
        }
        Ok(())
    }

    /// libpq-style connection string
    fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={} sslmode={}",
            self.host,
            self.port(),
            self.database(),
            self.username,
            self.password,
            self.sslmode.as_deref().unwrap_or("prefer")
        )
    }

    /// Metadata URL, without credentials
    pub fn url(&self) -> String {
        format!("jdbc:postgresql://{}:{}/{}", self.host, self.port(), self.database())
    }
}

type Manager = PostgresConnectionManager<NoTls>;

/// A pooled PostgreSQL connection
pub struct PostgresConnection {
    url: String,
    conn: bb8::PooledConnection<'static, Manager>,
}

impl PostgresConnection {
    /// Underlying tokio-postgres client
    pub fn client(&self) -> &tokio_postgres::Client {
        &self.conn
    }
}

#[async_trait::async_trait]
impl Connection for PostgresConnection {
    fn url(&self) -> &str {
        &self.url
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.conn
            .batch_execute(sql)
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))
    }
}

/// PostgreSQL pool built from a [`PostgresConfig`]
pub struct PostgresPool {
    url: String,
    pool: Pool<Manager>,
}

impl PostgresPool {
    /// Build the pool; connections are established lazily
    pub fn new(config: &PostgresConfig, settings: &PoolSettings) -> Result<Self, DatabaseError> {
        config.validate()?;

        let manager = Manager::new_from_stringlike(config.connection_string(), NoTls)
            .map_err(|e| DatabaseError::InvalidConfig(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(settings.max_size.max(1))
            .min_idle(settings.min_idle)
            .connection_timeout(settings.connection_timeout())
            .build_unchecked(manager);

        Ok(Self {
            url: config.url(),
            pool,
        })
    }

    pub fn state(&self) -> bb8::State {
        self.pool.state()
    }
}

#[async_trait::async_trait]
impl ConnectionPool for PostgresPool {
    fn url(&self) -> &str {
        &self.url
    }

    async fn get(&self) -> Result<Box<dyn Connection>, DatabaseError> {
        let conn = self.pool.get_owned().await?;
        Ok(Box::new(PostgresConnection {
            url: self.url.clone(),
            conn,
        }))
    }

    fn release(&self, conn: Box<dyn Connection>) {
        // Dropping the bb8 handle returns it to the pool.
        drop(conn);
    }
}
