// Runtime registries for live datasources and debug console sessions

// Module declarations
pub mod config;
pub mod console;
pub mod db;
pub mod logging;
pub mod registry;
pub mod state;

pub use config::{default_config_path, ConfigError, PoolSettings, RegistryConfig};
pub use console::{
    ChannelTransport, ConsoleError, ConsoleSession, ConsoleSessionRegistry, ConsoleTransport,
    SessionState,
};
pub use db::{
    DatabaseError, DatasourceInfo, DatasourceNode, DatasourceRegistry, Dialect, DialectResolver,
    UrlDialectResolver,
};
pub use logging::{init_logging, try_init_logging};
pub use registry::{Identified, KeyedRegistry, DEFAULT_KEY};
pub use state::Registries;
