// Console Session
// Pairs a live transport with the script debug context it drives

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use crate::console::transport::{ConsoleError, ConsoleTransport};

/// Lifecycle of a session while it is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// Debug context created before any socket attached
    Pending,
    /// Socket attached, no debug context yet
    Attached,
    /// Socket and debug context both present
    Paired,
}

/// A debug console session. The debug context `C` is opaque here.
pub struct ConsoleSession<C> {
    session_id: String,
    correlation_key: String,
    connection: RwLock<Option<Arc<dyn ConsoleTransport>>>,
    debug_context: RwLock<Option<Arc<C>>>,
    created_at: DateTime<Utc>,
}

impl<C> ConsoleSession<C> {
    fn new(
        correlation_key: String,
        connection: Option<Arc<dyn ConsoleTransport>>,
        debug_context: Option<Arc<C>>,
    ) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            correlation_key,
            connection: RwLock::new(connection),
            debug_context: RwLock::new(debug_context),
            created_at: Utc::now(),
        }
    }

    /// Session keyed by the transport's own identifier
    pub fn with_connection(connection: Arc<dyn ConsoleTransport>) -> Self {
        Self::new(connection.id().to_string(), Some(connection), None)
    }

    /// Session created from the script side before a socket attaches
    pub fn with_debug_context(correlation_key: impl Into<String>, context: Arc<C>) -> Self {
        Self::new(correlation_key.into(), None, Some(context))
    }

    /// Internal identity, stable for the life of the session
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Registry key of the session
    pub fn correlation_key(&self) -> &str {
        &self.correlation_key
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn connection(&self) -> Option<Arc<dyn ConsoleTransport>> {
        self.connection.read().clone()
    }

    pub fn debug_context(&self) -> Option<Arc<C>> {
        self.debug_context.read().clone()
    }

    pub fn attach_connection(&self, connection: Arc<dyn ConsoleTransport>) {
        *self.connection.write() = Some(connection);
    }

    pub fn attach_debug_context(&self, context: Arc<C>) {
        *self.debug_context.write() = Some(context);
    }

    /// True when a connection is attached and reports itself open
    pub fn is_deliverable(&self) -> bool {
        self.connection
            .read()
            .as_ref()
            .map(|conn| conn.is_open())
            .unwrap_or(false)
    }

    pub fn state(&self) -> SessionState {
        let has_connection = self.connection.read().is_some();
        let has_context = self.debug_context.read().is_some();
        match (has_connection, has_context) {
            (true, true) => SessionState::Paired,
            (true, false) => SessionState::Attached,
            (false, _) => SessionState::Pending,
        }
    }

    /// Send if open. Returns `Ok(false)` when the session is not deliverable.
    pub fn send(&self, message: &str) -> Result<bool, ConsoleError> {
        let Some(conn) = self.connection() else {
            return Ok(false);
        };
        if !conn.is_open() {
            return Ok(false);
        }
        conn.send(message)?;
        Ok(true)
    }
}

impl<C> std::fmt::Debug for ConsoleSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSession")
            .field("session_id", &self.session_id)
            .field("correlation_key", &self.correlation_key)
            .field("state", &self.state())
            .finish()
    }
}
