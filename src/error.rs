use std::io;
use std::path::PathBuf;

/// Errors from framing and decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("peer closed the connection")]
    PeerClosed,

    #[error("payload of {length} bytes exceeds receive capacity {capacity}")]
    Oversized { length: usize, capacity: usize },

    #[error("payload of {0} bytes does not fit a frame")]
    PayloadTooLarge(usize),

    #[error("unknown frame type {0}")]
    UnknownType(u8),

    #[error("malformed {frame} payload: {reason}")]
    Malformed {
        frame: &'static str,
        reason: &'static str,
    },
}

/// Fault reported to the session callback. Cloneable so it can travel inside
/// events; `code()` gives a stable numeric form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionFault {
    #[error("transport error: {kind:?}")]
    Transport {
        kind: io::ErrorKind,
        os_code: Option<i32>,
    },

    #[error("could not resolve peer address")]
    Resolve,

    #[error("unknown frame type {0}")]
    UnknownFrame(u8),

    #[error("unexpected {0} frame after handshake")]
    UnexpectedFrame(&'static str),

    #[error("handshake failed receiving peer hello")]
    HandshakeReceive { server: bool },

    #[error("handshake failed sending local hello")]
    HandshakeSend { server: bool },
}

impl SessionFault {
    pub fn code(&self) -> i32 {
        match self {
            SessionFault::Transport { os_code, .. } => os_code.unwrap_or(-1),
            SessionFault::UnknownFrame(_) | SessionFault::UnexpectedFrame(_) => -2,
            SessionFault::HandshakeReceive { server: true } => -3,
            SessionFault::HandshakeSend { server: true } => -4,
            SessionFault::HandshakeSend { server: false } => -5,
            SessionFault::HandshakeReceive { server: false } => -6,
            SessionFault::Resolve => -7,
        }
    }
}

impl From<&io::Error> for SessionFault {
    fn from(err: &io::Error) -> Self {
        SessionFault::Transport {
            kind: err.kind(),
            os_code: err.raw_os_error(),
        }
    }
}

/// Errors returned by session constructors and senders.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("failed to resolve {host}:{port}")]
    Resolve { host: String, port: u16 },

    #[error("failed to bind port {port}: {source}")]
    Bind { port: u16, source: io::Error },

    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        source: io::Error,
    },

    #[error("handshake failed: {0}")]
    Handshake(SessionFault),

    #[error("session is not connected")]
    NotConnected,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors that can occur when loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
