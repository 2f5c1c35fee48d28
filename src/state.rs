// Registry State
// Explicitly constructed registries, shared with request and socket handlers

use std::sync::Arc;

use crate::config::RegistryConfig;
use crate::console::ConsoleSessionRegistry;
use crate::db::{DatabaseError, DatasourceRegistry, Dialect, DialectResolver, UrlDialectResolver};

/// Registries for one running service, created at start and torn down at stop
pub struct Registries<C> {
    pub config: RegistryConfig,
    pub datasources: Arc<DatasourceRegistry>,
    pub consoles: Arc<ConsoleSessionRegistry<C>>,
    pub dialect_resolver: Arc<dyn DialectResolver>,
}

impl<C: Send + Sync + 'static> Registries<C> {
    /// Empty registries using the URL-based dialect resolver
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_resolver(config, Arc::new(UrlDialectResolver::new()))
    }

    pub fn with_resolver(config: RegistryConfig, dialect_resolver: Arc<dyn DialectResolver>) -> Self {
        Self {
            config,
            datasources: Arc::new(DatasourceRegistry::new()),
            consoles: Arc::new(ConsoleSessionRegistry::new()),
            dialect_resolver,
        }
    }

    /// Dialect of the datasource under `key`, bounded by the configured deadline
    pub async fn resolve_dialect(&self, key: Option<&str>) -> Result<Dialect, DatabaseError> {
        let node = self.datasources.resolve(key)?;
        match self.config.dialect_timeout() {
            Some(timeout) => {
                node.resolve_dialect_with_timeout(self.dialect_resolver.as_ref(), timeout)
                    .await
            }
            None => node.resolve_dialect(self.dialect_resolver.as_ref()).await,
        }
    }

    /// Drop every datasource and console session
    pub fn shutdown(&self) {
        tracing::info!(
            datasources = self.datasources.len(),
            consoles = self.consoles.len(),
            "shutting down registries"
        );
        self.consoles.clear();
        self.datasources.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ChannelTransport;
    use crate::db::traits::testing::{CountingPool, CountingResolver};

    #[tokio::test]
    async fn test_resolve_dialect_uses_shared_resolver() {
        let resolver = Arc::new(CountingResolver::new(|| Ok(Some(Dialect::Oracle))));
        let registries: Registries<()> = Registries::with_resolver(RegistryConfig::default(), resolver.clone());
        registries.datasources.set_default(CountingPool::new("jdbc:oracle:thin:@db:1521:xe"));

        assert_eq!(registries.resolve_dialect(None).await.unwrap(), Dialect::Oracle);
        assert_eq!(registries.resolve_dialect(Some("")).await.unwrap(), Dialect::Oracle);
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_dialect_without_deadline() {
        let config = RegistryConfig {
            dialect_timeout_ms: 0,
            ..RegistryConfig::default()
        };
        let registries: Registries<()> = Registries::new(config);
        registries.datasources.add("pg", CountingPool::new("postgres://db/app"));

        assert_eq!(
            registries.resolve_dialect(Some("pg")).await.unwrap(),
            Dialect::PostgreSql
        );
        assert!(matches!(
            registries.resolve_dialect(Some("missing")).await,
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[test]
    fn test_shutdown_clears_registries() {
        let registries: Registries<()> = Registries::new(RegistryConfig::default());
        registries.datasources.set_default(CountingPool::new("jdbc:h2:mem:x"));
        let (conn, _rx) = ChannelTransport::new("ws-1");
        registries.consoles.from_connection(Arc::new(conn));

        registries.shutdown();

        assert!(registries.datasources.is_empty());
        assert!(registries.consoles.is_empty());
    }
}
