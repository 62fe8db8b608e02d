use super::protocol::{NetMessage, NAME_MAX};
use super::session::{receive_loop, EventCallback, Session, Shared};
use super::NetEvent;
use crate::core::truncate_utf8;
use crate::error::{NetworkError, SessionFault};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

/// Connects to `host:port` and performs the handshake on the calling thread
/// (send `Hello`, then receive the server's). On success `Connected` has been
/// emitted and the receive loop is running in the background.
///
/// Failures are reported both as an `Error` event and as the returned error.
pub fn connect<F>(host: &str, port: u16, local_name: &str, callback: F) -> Result<Session, NetworkError>
where
    F: Fn(NetEvent) + Send + Sync + 'static,
{
    let local_name = truncate_utf8(local_name, NAME_MAX).to_string();
    let callback: EventCallback = Arc::new(callback);
    let shared = Arc::new(Shared::new(callback));

    let addrs: Vec<SocketAddr> = match (host, port).to_socket_addrs() {
        Ok(addrs) => addrs.collect(),
        Err(e) => {
            debug!("resolve {}:{} failed: {}", host, port, e);
            Vec::new()
        }
    };
    if addrs.is_empty() {
        shared.fault(SessionFault::Resolve);
        return Err(NetworkError::Resolve {
            host: host.to_string(),
            port,
        });
    }

    let stream = match TcpStream::connect(addrs.as_slice()) {
        Ok(stream) => stream,
        Err(source) => {
            shared.fault(SessionFault::from(&source));
            return Err(NetworkError::Connect {
                host: host.to_string(),
                port,
                source,
            });
        }
    };
    let local_addr = stream.local_addr().ok();
    info!(%host, port, "connected");

    let mut reader = match stream.try_clone() {
        Ok(reader) => reader,
        Err(e) => {
            shared.fault(SessionFault::from(&e));
            return Err(NetworkError::Io(e));
        }
    };
    shared.attach(stream);

    if let Err(e) = shared.write(&NetMessage::Hello {
        name: local_name.clone(),
    }) {
        debug!("client handshake send failed: {}", e);
        let fault = SessionFault::HandshakeSend { server: false };
        shared.fault(fault.clone());
        shared.abort();
        return Err(NetworkError::Handshake(fault));
    }

    let peer_name = match shared.receive_hello(&mut reader) {
        Ok(name) => name,
        Err(e) => {
            debug!("client handshake receive failed: {}", e);
            let fault = SessionFault::HandshakeReceive { server: false };
            shared.fault(fault.clone());
            shared.abort();
            return Err(NetworkError::Handshake(fault));
        }
    };

    let peer_name = shared.set_peer_name(peer_name);
    info!(%peer_name, "handshake complete");
    shared.emit(NetEvent::Connected { peer_name });

    let thread_shared = Arc::clone(&shared);
    let receiver = thread::Builder::new()
        .name("gomoku-client".to_string())
        .spawn(move || receive_loop(thread_shared, reader))?;

    Ok(Session::new(shared, receiver, local_addr, local_name))
}
