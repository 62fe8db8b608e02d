use super::protocol::{NetMessage, RECV_CAPACITY};
use super::NetEvent;
use crate::error::{NetworkError, ProtocolError, SessionFault};
use once_cell::sync::OnceCell;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

pub type EventCallback = Arc<dyn Fn(NetEvent) + Send + Sync>;

/// State shared between the owning `Session` and its receive thread.
pub(crate) struct Shared {
    running: AtomicBool,
    /// Outbound half. Holding this lock is the send lock.
    stream: Mutex<Option<TcpStream>>,
    peer_name: OnceCell<String>,
    callback: EventCallback,
}

impl Shared {
    pub(crate) fn new(callback: EventCallback) -> Self {
        Self {
            running: AtomicBool::new(true),
            stream: Mutex::new(None),
            peer_name: OnceCell::new(),
            callback,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn emit(&self, event: NetEvent) {
        (self.callback)(event);
    }

    /// Faults raised after `close` are shutdown noise, not peer errors.
    pub(crate) fn fault(&self, fault: SessionFault) {
        if self.is_running() {
            warn!(code = fault.code(), "session fault: {}", fault);
            self.emit(NetEvent::Error(fault));
        } else {
            debug!("suppressed fault after close: {}", fault);
        }
    }

    fn lock_stream(&self) -> MutexGuard<'_, Option<TcpStream>> {
        self.stream.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs the connected stream. Returns false when the session was
    /// closed in the meantime; the stream is shut down in that case.
    pub(crate) fn attach(&self, stream: TcpStream) -> bool {
        let mut guard = self.lock_stream();
        if !self.is_running() {
            let _ = stream.shutdown(Shutdown::Both);
            return false;
        }
        *guard = Some(stream);
        true
    }

    pub(crate) fn write(&self, message: &NetMessage) -> Result<(), NetworkError> {
        let mut guard = self.lock_stream();
        let stream = guard.as_mut().ok_or(NetworkError::NotConnected)?;
        message.write_to(stream)?;
        Ok(())
    }

    pub(crate) fn set_peer_name(&self, name: String) -> String {
        self.peer_name.get_or_init(|| name).clone()
    }

    fn shutdown_transport(&self) {
        if let Some(stream) = self.lock_stream().take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    /// Ends a session that will never (or no longer) carry frames: the peer
    /// sees EOF and `is_running` turns false.
    pub(crate) fn abort(&self) {
        self.shutdown_transport();
        self.running.store(false, Ordering::SeqCst);
    }

    /// Receives the peer's `Hello`.
    pub(crate) fn receive_hello(&self, reader: &mut TcpStream) -> Result<String, ProtocolError> {
        match NetMessage::read_from(reader, RECV_CAPACITY)? {
            NetMessage::Hello { name } => Ok(name),
            _ => Err(ProtocolError::Malformed {
                frame: "Hello",
                reason: "expected Hello during handshake",
            }),
        }
    }
}

/// Runs after a successful handshake until the peer goes away or the session
/// is closed. Every exit path emits `Disconnected` and releases the transport.
pub(crate) fn receive_loop(shared: Arc<Shared>, mut reader: TcpStream) {
    loop {
        let message = match NetMessage::read_from(&mut reader, RECV_CAPACITY) {
            Ok(message) => message,
            Err(ProtocolError::UnknownType(tag)) => {
                shared.fault(SessionFault::UnknownFrame(tag));
                break;
            }
            Err(ProtocolError::Io(e)) => {
                shared.fault(SessionFault::from(&e));
                break;
            }
            Err(ProtocolError::PeerClosed) => {
                debug!("peer closed the connection");
                break;
            }
            Err(e) => {
                if shared.is_running() {
                    warn!("dropping session: {}", e);
                }
                break;
            }
        };

        let event = match message {
            NetMessage::Hello { .. } => {
                shared.fault(SessionFault::UnexpectedFrame("Hello"));
                break;
            }
            NetMessage::Move { row, col } => NetEvent::Move {
                row: row as usize,
                col: col as usize,
            },
            NetMessage::Chat { text } => NetEvent::Chat { text },
            NetMessage::UndoRequest => NetEvent::UndoRequest,
            NetMessage::UndoResponse { accepted } => NetEvent::UndoResponse { accepted },
            NetMessage::Resign => NetEvent::Resign,
        };
        debug!(?event, "frame received");
        shared.emit(event);
    }

    shared.emit(NetEvent::Disconnected);
    shared.abort();
    info!("receive loop finished");
}

/// One peer connection, either accepted (`server::start_server`) or dialled
/// (`client::connect`).
///
/// Events reach the callback from a background thread. Dropping the session
/// closes it.
pub struct Session {
    shared: Arc<Shared>,
    receiver: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
    local_name: String,
}

impl Session {
    pub(crate) fn new(
        shared: Arc<Shared>,
        receiver: JoinHandle<()>,
        local_addr: Option<SocketAddr>,
        local_name: String,
    ) -> Self {
        Self {
            shared,
            receiver: Some(receiver),
            local_addr,
            local_name,
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Set once the handshake has completed.
    pub fn peer_name(&self) -> Option<&str> {
        self.shared.peer_name.get().map(String::as_str)
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    fn send(&self, message: NetMessage) -> Result<(), NetworkError> {
        if self.peer_name().is_none() || !self.is_running() {
            return Err(NetworkError::NotConnected);
        }
        debug!(?message, "sending frame");
        self.shared.write(&message)
    }

    pub fn send_move(&self, row: usize, col: usize) -> Result<(), NetworkError> {
        let row = u8::try_from(row).map_err(|_| NetworkError::Protocol(ProtocolError::Malformed {
            frame: "Move",
            reason: "row out of range",
        }))?;
        let col = u8::try_from(col).map_err(|_| NetworkError::Protocol(ProtocolError::Malformed {
            frame: "Move",
            reason: "column out of range",
        }))?;
        self.send(NetMessage::Move { row, col })
    }

    pub fn send_chat(&self, text: &str) -> Result<(), NetworkError> {
        self.send(NetMessage::Chat {
            text: text.to_string(),
        })
    }

    pub fn send_undo_request(&self) -> Result<(), NetworkError> {
        self.send(NetMessage::UndoRequest)
    }

    pub fn send_undo_response(&self, accepted: bool) -> Result<(), NetworkError> {
        self.send(NetMessage::UndoResponse { accepted })
    }

    pub fn send_resign(&self) -> Result<(), NetworkError> {
        self.send(NetMessage::Resign)
    }

    /// Stops the session and joins the receive thread. Safe to call more
    /// than once and before a peer ever connected.
    pub fn close(&mut self) {
        let was_running = self.shared.running.swap(false, Ordering::SeqCst);
        self.shared.shutdown_transport();
        if let Some(handle) = self.receiver.take() {
            if handle.join().is_err() {
                warn!("session receive thread panicked");
            }
        }
        if was_running {
            info!("session closed");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
