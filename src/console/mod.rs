// Debug Console Module
// Live debug sessions correlating a socket with a script debug context

pub mod registry;
pub mod session;
pub mod transport;

pub use registry::ConsoleSessionRegistry;
pub use session::{ConsoleSession, SessionState};
pub use transport::{ChannelTransport, ConsoleError, ConsoleTransport};
