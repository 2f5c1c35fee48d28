// Dialect Detection
// Default resolver mapping connection URL schemes to SQL dialects

use crate::db::traits::{DatabaseError, Dialect, DialectResolver};

/// URL prefixes, checked in order. More specific prefixes come first.
const URL_PREFIXES: &[(&str, Dialect)] = &[
    ("jdbc:mysql:", Dialect::MySql),
    ("mysql://", Dialect::MySql),
    ("jdbc:mariadb:", Dialect::MariaDb),
    ("mariadb://", Dialect::MariaDb),
    ("jdbc:postgresql:", Dialect::PostgreSql),
    ("postgresql://", Dialect::PostgreSql),
    ("postgres://", Dialect::PostgreSql),
    ("jdbc:sqlite:", Dialect::Sqlite),
    ("sqlite:", Dialect::Sqlite),
    ("jdbc:sqlserver:", Dialect::SqlServer),
    ("jdbc:jtds:sqlserver:", Dialect::SqlServer),
    ("mssql://", Dialect::SqlServer),
    ("sqlserver://", Dialect::SqlServer),
    ("jdbc:oracle:", Dialect::Oracle),
    ("jdbc:clickhouse:", Dialect::ClickHouse),
    ("clickhouse://", Dialect::ClickHouse),
    ("jdbc:db2:", Dialect::Db2),
    ("jdbc:h2:", Dialect::H2),
];

/// Resolves dialects from JDBC-style and native connection URLs
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlDialectResolver;

impl UrlDialectResolver {
    pub fn new() -> Self {
        Self
    }
}

impl DialectResolver for UrlDialectResolver {
    fn infer_dialect(&self, url: &str) -> Result<Option<Dialect>, DatabaseError> {
        let url = url.trim().to_ascii_lowercase();
        if url.is_empty() {
            return Err(DatabaseError::InvalidConfig(
                "connection URL is empty".to_string(),
            ));
        }

        Ok(URL_PREFIXES
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix))
            .map(|(_, dialect)| *dialect))
    }
}
