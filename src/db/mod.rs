// Datasource Module
// Live datasource registry, dialect detection and the pools backing it

pub mod datasources;
pub mod dialect;
pub mod node;
pub mod postgres;
pub mod sqlite;
pub mod traits;
pub mod transaction;

pub use datasources::DatasourceRegistry;
pub use dialect::UrlDialectResolver;
pub use node::{DatasourceInfo, DatasourceNode};
pub use postgres::{PostgresConfig, PostgresPool};
pub use sqlite::{SqliteConfig, SqlitePool};
pub use traits::{
    Connection, ConnectionPool, DatabaseError, Dialect, DialectResolver, PooledGuard,
};
pub use transaction::{Transaction, TransactionManager};
