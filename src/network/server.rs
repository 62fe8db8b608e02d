use super::protocol::NetMessage;
use super::session::{receive_loop, EventCallback, Session, Shared};
use super::NetEvent;
use crate::core::truncate_utf8;
use crate::error::{NetworkError, SessionFault};
use crate::network::protocol::NAME_MAX;
use std::io;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Interval between accept polls while waiting for the peer.
const ACCEPT_POLL: Duration = Duration::from_millis(25);

/// Listens on `0.0.0.0:port` and returns immediately. The first peer to
/// connect is accepted and handshaken on the background thread, which then
/// emits `Connected` and enters the receive loop. Port `0` picks a free port;
/// see `Session::local_addr`.
pub fn start_server<F>(port: u16, local_name: &str, callback: F) -> Result<Session, NetworkError>
where
    F: Fn(NetEvent) + Send + Sync + 'static,
{
    let listener =
        TcpListener::bind(("0.0.0.0", port)).map_err(|source| NetworkError::Bind { port, source })?;
    listener.set_nonblocking(true)?;
    let local_addr = listener.local_addr().ok();
    info!(?local_addr, "waiting for a peer");

    let local_name = truncate_utf8(local_name, NAME_MAX).to_string();
    let callback: EventCallback = Arc::new(callback);
    let shared = Arc::new(Shared::new(callback));

    let thread_shared = Arc::clone(&shared);
    let thread_name = local_name.clone();
    let receiver = thread::Builder::new()
        .name("gomoku-server".to_string())
        .spawn(move || serve(thread_shared, listener, thread_name))?;

    Ok(Session::new(shared, receiver, local_addr, local_name))
}

fn serve(shared: Arc<Shared>, listener: TcpListener, local_name: String) {
    let Some(reader) = handshake(&shared, listener, local_name) else {
        // 失敗時もソケットを閉じてセッションを終了させる
        shared.abort();
        return;
    };
    receive_loop(shared, reader);
}

/// Accepts one peer and exchanges `Hello`s. `None` on any failure; faults
/// have already been reported by then.
fn handshake(shared: &Shared, listener: TcpListener, local_name: String) -> Option<TcpStream> {
    let stream = accept_peer(shared, &listener)?;
    drop(listener);

    let mut reader = match prepare_stream(shared, stream) {
        Ok(reader) => reader?,
        Err(e) => {
            shared.fault(SessionFault::from(&e));
            return None;
        }
    };

    let peer_name = match shared.receive_hello(&mut reader) {
        Ok(name) => name,
        Err(e) => {
            debug!("server handshake receive failed: {}", e);
            shared.fault(SessionFault::HandshakeReceive { server: true });
            return None;
        }
    };
    if let Err(e) = shared.write(&NetMessage::Hello { name: local_name }) {
        debug!("server handshake send failed: {}", e);
        shared.fault(SessionFault::HandshakeSend { server: true });
        return None;
    }

    let peer_name = shared.set_peer_name(peer_name);
    info!(%peer_name, "peer connected");
    shared.emit(NetEvent::Connected { peer_name });
    Some(reader)
}

fn accept_peer(shared: &Shared, listener: &TcpListener) -> Option<TcpStream> {
    while shared.is_running() {
        match listener.accept() {
            Ok((stream, addr)) => {
                info!(%addr, "accepted connection");
                return Some(stream);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                shared.fault(SessionFault::from(&e));
                return None;
            }
        }
    }
    debug!("accept cancelled");
    None
}

/// Back to blocking mode, split into read and write handles. `None` when the
/// session was closed while accepting.
fn prepare_stream(shared: &Shared, stream: TcpStream) -> io::Result<Option<TcpStream>> {
    stream.set_nonblocking(false)?;
    let reader = stream.try_clone()?;
    if shared.attach(stream) {
        Ok(Some(reader))
    } else {
        Ok(None)
    }
}
