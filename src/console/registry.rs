// Console Session Registry
// Sessions keyed by transport connection id, created on first contact

use std::sync::Arc;

use crate::console::session::ConsoleSession;
use crate::console::transport::{ConsoleError, ConsoleTransport};
use crate::registry::KeyedRegistry;

/// Registry of live debug console sessions
pub struct ConsoleSessionRegistry<C> {
    sessions: KeyedRegistry<ConsoleSession<C>>,
}

impl<C: Send + Sync + 'static> ConsoleSessionRegistry<C> {
    pub fn new() -> Self {
        Self {
            sessions: KeyedRegistry::new(),
        }
    }

    /// Session for `connection`, created on first contact.
    ///
    /// Get-or-create is atomic per connection id. A pending session started
    /// from the script side under the same id gets the connection attached.
    pub fn from_connection(&self, connection: Arc<dyn ConsoleTransport>) -> Arc<ConsoleSession<C>> {
        let key = connection.id().to_string();
        let session = self.sessions.get_or_insert_with(&key, || {
            tracing::debug!(connection = %key, "console session opened");
            Arc::new(ConsoleSession::with_connection(Arc::clone(&connection)))
        });
        if session.connection().is_none() {
            session.attach_connection(connection);
        }
        session
    }

    /// Session started from the script side under `correlation_key`.
    ///
    /// If a session already exists under that key, the context is attached
    /// to it instead, pairing it with its socket.
    pub fn from_debug_context(&self, correlation_key: &str, context: Arc<C>) -> Arc<ConsoleSession<C>> {
        let mut created = false;
        let session = self.sessions.get_or_insert_with(correlation_key, || {
            created = true;
            Arc::new(ConsoleSession::with_debug_context(correlation_key, Arc::clone(&context)))
        });
        if !created {
            session.attach_debug_context(context);
        }
        session
    }

    pub fn get(&self, correlation_key: &str) -> Option<Arc<ConsoleSession<C>>> {
        self.sessions.get(Some(correlation_key))
    }

    /// Drop the session of a closed connection
    pub fn remove(&self, connection: &dyn ConsoleTransport) -> bool {
        self.remove_key(connection.id())
    }

    pub fn remove_key(&self, correlation_key: &str) -> bool {
        let removed = self.sessions.delete(correlation_key);
        if removed {
            tracing::debug!(connection = %correlation_key, "console session closed");
        }
        removed
    }

    /// True when the session has an open connection
    pub fn deliverable(&self, session: &ConsoleSession<C>) -> bool {
        session.is_deliverable()
    }

    /// Send to the session under `correlation_key` if it is deliverable
    pub fn send_to(&self, correlation_key: &str, message: &str) -> Result<bool, ConsoleError> {
        self.get(correlation_key)
            .ok_or_else(|| ConsoleError::NotFound(correlation_key.to_string()))?
            .send(message)
    }

    /// Send to every deliverable session. Returns the number reached.
    pub fn broadcast(&self, message: &str) -> usize {
        self.sessions
            .values()
            .iter()
            .filter(|session| match session.send(message) {
                Ok(sent) => sent,
                Err(e) => {
                    tracing::warn!(connection = %session.correlation_key(), error = %e, "console broadcast failed");
                    false
                }
            })
            .count()
    }

    /// Snapshot of registered sessions
    pub fn sessions(&self) -> Vec<Arc<ConsoleSession<C>>> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn clear(&self) {
        self.sessions.clear();
    }
}

impl<C: Send + Sync + 'static> Default for ConsoleSessionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
