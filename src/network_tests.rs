#[cfg(test)]
mod tests {
    use crate::error::{NetworkError, SessionFault};
    use crate::network::client::connect;
    use crate::network::protocol::{write_frame, FrameType, NetMessage, RECV_CAPACITY};
    use crate::network::server::start_server;
    use crate::network::{NetEvent, Session};
    use std::io::Read;
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc::{channel, Receiver};
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};

    const WAIT: Duration = Duration::from_secs(5);

    fn recorder() -> (impl Fn(NetEvent) + Send + Sync + 'static, Receiver<NetEvent>) {
        let (tx, rx) = channel();
        let tx = Mutex::new(tx);
        let callback = move |event| {
            let _ = tx.lock().unwrap().send(event);
        };
        (callback, rx)
    }

    fn next(rx: &Receiver<NetEvent>) -> NetEvent {
        rx.recv_timeout(WAIT).expect("timed out waiting for event")
    }

    fn wait_until_stopped(session: &Session) {
        let deadline = Instant::now() + WAIT;
        while session.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
    }

    fn server(name: &str) -> (Session, Receiver<NetEvent>, u16) {
        let (callback, rx) = recorder();
        let session = start_server(0, name, callback).unwrap();
        let port = session.local_addr().unwrap().port();
        (session, rx, port)
    }

    fn connected_pair() -> (Session, Receiver<NetEvent>, Session, Receiver<NetEvent>) {
        let (host, host_rx, port) = server("alice");
        let (callback, guest_rx) = recorder();
        let guest = connect("127.0.0.1", port, "bob", callback).unwrap();

        assert_eq!(
            next(&host_rx),
            NetEvent::Connected {
                peer_name: "bob".to_string()
            }
        );
        assert_eq!(
            next(&guest_rx),
            NetEvent::Connected {
                peer_name: "alice".to_string()
            }
        );
        (host, host_rx, guest, guest_rx)
    }

    #[test]
    fn test_handshake_exchanges_names() {
        let (host, _host_rx, guest, _guest_rx) = connected_pair();
        assert_eq!(host.peer_name(), Some("bob"));
        assert_eq!(guest.peer_name(), Some("alice"));
        assert_eq!(host.local_name(), "alice");
        assert!(host.is_running());
        assert!(guest.is_running());
    }

    #[test]
    fn test_events_flow_both_ways() {
        let (host, host_rx, guest, guest_rx) = connected_pair();

        guest.send_move(7, 8).unwrap();
        assert_eq!(next(&host_rx), NetEvent::Move { row: 7, col: 8 });

        host.send_chat("good luck").unwrap();
        assert_eq!(
            next(&guest_rx),
            NetEvent::Chat {
                text: "good luck".to_string()
            }
        );

        guest.send_undo_request().unwrap();
        assert_eq!(next(&host_rx), NetEvent::UndoRequest);
        host.send_undo_response(true).unwrap();
        assert_eq!(next(&guest_rx), NetEvent::UndoResponse { accepted: true });

        host.send_resign().unwrap();
        assert_eq!(next(&guest_rx), NetEvent::Resign);
    }

    #[test]
    fn test_peer_close_disconnects() {
        let (host, host_rx, mut guest, _guest_rx) = connected_pair();
        guest.close();
        assert_eq!(next(&host_rx), NetEvent::Disconnected);

        // The loop has released the transport by the time it reports.
        std::thread::sleep(Duration::from_millis(50));
        assert!(!host.is_running());
        assert!(matches!(host.send_move(1, 1), Err(NetworkError::NotConnected)));
    }

    #[test]
    fn test_unknown_frame_ends_session() {
        let (_host, host_rx, port) = server("alice");

        let mut raw = TcpStream::connect(("127.0.0.1", port)).unwrap();
        NetMessage::Hello {
            name: "raw".to_string(),
        }
        .write_to(&mut raw)
        .unwrap();
        let reply = NetMessage::read_from(&mut raw, RECV_CAPACITY).unwrap();
        assert_eq!(
            reply,
            NetMessage::Hello {
                name: "alice".to_string()
            }
        );

        use std::io::Write;
        raw.write_all(&[42, 0, 0]).unwrap();

        assert_eq!(
            next(&host_rx),
            NetEvent::Connected {
                peer_name: "raw".to_string()
            }
        );
        match next(&host_rx) {
            NetEvent::Error(fault) => {
                assert_eq!(fault, SessionFault::UnknownFrame(42));
                assert_eq!(fault.code(), -2);
            }
            other => panic!("expected error event, got {:?}", other),
        }
        assert_eq!(next(&host_rx), NetEvent::Disconnected);
    }

    #[test]
    fn test_wrong_handshake_frame_is_rejected() {
        let (host, host_rx, port) = server("alice");

        let mut raw = TcpStream::connect(("127.0.0.1", port)).unwrap();
        write_frame(&mut raw, FrameType::Move, &[1, 1]).unwrap();

        match next(&host_rx) {
            NetEvent::Error(fault) => assert_eq!(fault.code(), -3),
            other => panic!("expected handshake error, got {:?}", other),
        }
        assert!(host_rx.recv_timeout(Duration::from_millis(200)).is_err());

        // The failed session is over and the peer sees the socket closed.
        wait_until_stopped(&host);
        assert!(!host.is_running());
        assert!(host.peer_name().is_none());
        raw.set_read_timeout(Some(WAIT)).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(raw.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_client_rejects_wrong_handshake_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let fake_server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let hello = NetMessage::read_from(&mut stream, RECV_CAPACITY).unwrap();
            write_frame(&mut stream, FrameType::Move, &[3, 4]).unwrap();
            stream.set_read_timeout(Some(WAIT)).unwrap();
            let mut buf = [0u8; 8];
            let closed = stream.read(&mut buf).unwrap();
            (hello, closed)
        });

        let (callback, rx) = recorder();
        let result = connect("127.0.0.1", port, "bob", callback);
        match result {
            Err(NetworkError::Handshake(fault)) => {
                assert_eq!(fault, SessionFault::HandshakeReceive { server: false });
                assert_eq!(fault.code(), -6);
            }
            Err(e) => panic!("expected handshake error, got {}", e),
            Ok(_) => panic!("handshake should have failed"),
        }
        match next(&rx) {
            NetEvent::Error(fault) => assert_eq!(fault.code(), -6),
            other => panic!("expected error event, got {:?}", other),
        }
        assert!(rx.try_recv().is_err());

        let (hello, closed) = fake_server.join().unwrap();
        assert_eq!(
            hello,
            NetMessage::Hello {
                name: "bob".to_string()
            }
        );
        assert_eq!(closed, 0);
    }

    #[test]
    fn test_close_is_idempotent_and_safe_before_connect() {
        let (mut host, host_rx, _port) = server("alice");
        assert!(host.peer_name().is_none());
        assert!(matches!(host.send_chat("anyone?"), Err(NetworkError::NotConnected)));

        host.close();
        host.close();
        assert!(!host.is_running());
        // No peer ever connected, so nothing was reported.
        assert!(host_rx.try_recv().is_err());
    }

    #[test]
    fn test_connect_refused_reports_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let (callback, rx) = recorder();
        let result = connect("127.0.0.1", port, "bob", callback);
        assert!(matches!(result, Err(NetworkError::Connect { .. })));
        assert!(matches!(next(&rx), NetEvent::Error(SessionFault::Transport { .. })));
    }
}
