pub mod client;
pub mod protocol;
pub mod queue;
pub mod server;
pub mod session;

use crate::error::SessionFault;

pub use queue::EventQueue;
pub use session::Session;

/// Events delivered by a session to its callback, possibly from the
/// background receive thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    Connected { peer_name: String },
    Disconnected,
    Move { row: usize, col: usize },
    Chat { text: String },
    UndoRequest,
    UndoResponse { accepted: bool },
    Resign,
    Error(SessionFault),
}
