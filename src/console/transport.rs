// Console Transport
// Capability contract for the live socket behind a debug session

use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;

/// Console session errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Connection closed: {0}")]
    Closed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Console session not found: {0}")]
    NotFound(String),
}

/// A live transport connection, owned by the socket layer
pub trait ConsoleTransport: Send + Sync {
    /// Transport-assigned connection identifier
    fn id(&self) -> &str;

    fn is_open(&self) -> bool;

    fn send(&self, message: &str) -> Result<(), ConsoleError>;
}

/// Transport backed by an unbounded channel drained by a socket writer task
pub struct ChannelTransport {
    id: String,
    open: AtomicBool,
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    /// Create a transport and the receiver its writer task should drain
    pub fn new(id: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Self {
            id: id.into(),
            open: AtomicBool::new(true),
            tx,
        };
        (transport, rx)
    }

    /// Mark the transport closed; later sends fail
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

impl ConsoleTransport for ChannelTransport {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.tx.is_closed()
    }

    fn send(&self, message: &str) -> Result<(), ConsoleError> {
        if !self.is_open() {
            return Err(ConsoleError::Closed(self.id.clone()));
        }
        self.tx
            .send(message.to_string())
            .map_err(|e| ConsoleError::SendFailed(e.to_string()))
    }
}
