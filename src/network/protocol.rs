//! # Wire Protocol
//!
//! Every frame is `[type: u8][length: u16 big-endian][payload]`.
//!
//! | type | message        | payload                               |
//! |------|----------------|---------------------------------------|
//! | 1    | Hello          | display name + NUL                    |
//! | 2    | Move           | row, col as `u8`                      |
//! | 3    | Chat           | UTF-8 text (≤255 bytes) + NUL         |
//! | 4    | UndoRequest    | empty                                 |
//! | 5    | UndoResponse   | one byte, non-zero = accepted         |
//! | 6    | Resign         | empty                                 |
//!
//! Names and chat text are truncated to their limits when encoded and again
//! when decoded, so an oversized field never leaks past the codec.

use crate::core::truncate_utf8;
use crate::error::ProtocolError;
use std::io::{self, Read, Write};

pub const HEADER_LEN: usize = 3;
/// Largest payload a frame can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;
/// Receive buffer size used by sessions.
pub const RECV_CAPACITY: usize = 512;
/// Display name limit in bytes, excluding the terminator.
pub const NAME_MAX: usize = 31;
/// Chat text limit in bytes, excluding the terminator.
pub const CHAT_MAX: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    Hello = 1,
    Move = 2,
    Chat = 3,
    UndoRequest = 4,
    UndoResponse = 5,
    Resign = 6,
}

impl FrameType {
    pub fn name(self) -> &'static str {
        match self {
            FrameType::Hello => "Hello",
            FrameType::Move => "Move",
            FrameType::Chat => "Chat",
            FrameType::UndoRequest => "UndoRequest",
            FrameType::UndoResponse => "UndoResponse",
            FrameType::Resign => "Resign",
        }
    }
}

impl TryFrom<u8> for FrameType {
    type Error = ProtocolError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Ok(match tag {
            1 => FrameType::Hello,
            2 => FrameType::Move,
            3 => FrameType::Chat,
            4 => FrameType::UndoRequest,
            5 => FrameType::UndoResponse,
            6 => FrameType::Resign,
            other => return Err(ProtocolError::UnknownType(other)),
        })
    }
}

/// A raw frame as read off the wire. The tag is kept unparsed so unknown
/// types can still be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub tag: u8,
    pub payload: Vec<u8>,
}

/// Writes header and payload with a single `write_all`.
pub fn write_frame<W: Write>(writer: &mut W, frame_type: FrameType, payload: &[u8]) -> Result<(), ProtocolError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(ProtocolError::PayloadTooLarge(payload.len()));
    }
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.push(frame_type as u8);
    buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    buf.extend_from_slice(payload);
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

/// Reads one frame. A payload longer than `capacity` is drained from the
/// stream and reported as `Oversized`, leaving the stream at the next frame
/// boundary.
pub fn read_frame<R: Read>(reader: &mut R, capacity: usize) -> Result<Frame, ProtocolError> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ProtocolError::PeerClosed,
        _ => ProtocolError::Io(e),
    })?;
    let tag = header[0];
    let length = u16::from_be_bytes([header[1], header[2]]) as usize;

    if length > capacity {
        let drained = io::copy(&mut reader.by_ref().take(length as u64), &mut io::sink())?;
        if drained < length as u64 {
            return Err(ProtocolError::PeerClosed);
        }
        return Err(ProtocolError::Oversized { length, capacity });
    }

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ProtocolError::PeerClosed,
        _ => ProtocolError::Io(e),
    })?;
    Ok(Frame { tag, payload })
}

/// Typed application message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetMessage {
    Hello { name: String },
    Move { row: u8, col: u8 },
    Chat { text: String },
    UndoRequest,
    UndoResponse { accepted: bool },
    Resign,
}

impl NetMessage {
    pub fn frame_type(&self) -> FrameType {
        match self {
            NetMessage::Hello { .. } => FrameType::Hello,
            NetMessage::Move { .. } => FrameType::Move,
            NetMessage::Chat { .. } => FrameType::Chat,
            NetMessage::UndoRequest => FrameType::UndoRequest,
            NetMessage::UndoResponse { .. } => FrameType::UndoResponse,
            NetMessage::Resign => FrameType::Resign,
        }
    }

    pub fn encode_payload(&self) -> Vec<u8> {
        match self {
            NetMessage::Hello { name } => encode_text(name, NAME_MAX),
            NetMessage::Move { row, col } => vec![*row, *col],
            NetMessage::Chat { text } => encode_text(text, CHAT_MAX),
            NetMessage::UndoRequest | NetMessage::Resign => Vec::new(),
            NetMessage::UndoResponse { accepted } => vec![u8::from(*accepted)],
        }
    }

    pub fn decode(frame: &Frame) -> Result<NetMessage, ProtocolError> {
        let frame_type = FrameType::try_from(frame.tag)?;
        let payload = frame.payload.as_slice();
        Ok(match frame_type {
            FrameType::Hello => NetMessage::Hello {
                name: decode_text(payload, NAME_MAX),
            },
            FrameType::Move => match payload {
                [row, col, ..] => NetMessage::Move { row: *row, col: *col },
                _ => {
                    return Err(ProtocolError::Malformed {
                        frame: "Move",
                        reason: "expected 2 bytes",
                    })
                }
            },
            FrameType::Chat => NetMessage::Chat {
                text: decode_text(payload, CHAT_MAX),
            },
            FrameType::UndoRequest => NetMessage::UndoRequest,
            FrameType::UndoResponse => match payload.first() {
                Some(&flag) => NetMessage::UndoResponse { accepted: flag != 0 },
                None => {
                    return Err(ProtocolError::Malformed {
                        frame: "UndoResponse",
                        reason: "expected 1 byte",
                    })
                }
            },
            FrameType::Resign => NetMessage::Resign,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), ProtocolError> {
        write_frame(writer, self.frame_type(), &self.encode_payload())
    }

    pub fn read_from<R: Read>(reader: &mut R, capacity: usize) -> Result<NetMessage, ProtocolError> {
        let frame = read_frame(reader, capacity)?;
        Self::decode(&frame)
    }
}

/// Text truncated to `max` bytes plus a NUL terminator.
fn encode_text(text: &str, max: usize) -> Vec<u8> {
    let mut bytes = truncate_utf8(text, max).as_bytes().to_vec();
    bytes.push(0);
    bytes
}

/// Text up to the first NUL, cut to `max` bytes; invalid UTF-8 is replaced.
fn decode_text(payload: &[u8], max: usize) -> String {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    let text = String::from_utf8_lossy(&payload[..end]);
    truncate_utf8(&text, max).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encoded(msg: &NetMessage) -> Vec<u8> {
        let mut buf = Vec::new();
        msg.write_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_chat_frame_layout_and_decode() {
        let buf = encoded(&NetMessage::Chat {
            text: "hello".to_string(),
        });
        assert_eq!(buf, [3, 0, 6, b'h', b'e', b'l', b'l', b'o', 0]);

        let frame = read_frame(&mut Cursor::new(&buf), RECV_CAPACITY).unwrap();
        assert_eq!(FrameType::try_from(frame.tag).unwrap(), FrameType::Chat);
        assert_eq!(
            NetMessage::decode(&frame).unwrap(),
            NetMessage::Chat {
                text: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_move_and_undo_payloads() {
        assert_eq!(encoded(&NetMessage::Move { row: 7, col: 14 }), [2, 0, 2, 7, 14]);
        assert_eq!(encoded(&NetMessage::UndoResponse { accepted: true }), [5, 0, 1, 1]);
        assert_eq!(encoded(&NetMessage::Resign), [6, 0, 0]);
        assert_eq!(encoded(&NetMessage::UndoRequest), [4, 0, 0]);
    }

    #[test]
    fn test_oversized_payload_keeps_stream_aligned() {
        let mut stream = Vec::new();
        write_frame(&mut stream, FrameType::Chat, &[b'a'; 600]).unwrap();
        NetMessage::Move { row: 1, col: 2 }.write_to(&mut stream).unwrap();

        let mut cursor = Cursor::new(stream);
        match read_frame(&mut cursor, RECV_CAPACITY) {
            Err(ProtocolError::Oversized { length, capacity }) => {
                assert_eq!(length, 600);
                assert_eq!(capacity, RECV_CAPACITY);
            }
            other => panic!("expected oversized error, got {:?}", other),
        }
        let next = NetMessage::read_from(&mut cursor, RECV_CAPACITY).unwrap();
        assert_eq!(next, NetMessage::Move { row: 1, col: 2 });
    }

    #[test]
    fn test_truncated_stream_is_peer_closed() {
        let mut cursor = Cursor::new(vec![2u8, 0]);
        assert!(matches!(
            read_frame(&mut cursor, RECV_CAPACITY),
            Err(ProtocolError::PeerClosed)
        ));

        let mut cursor = Cursor::new(vec![2u8, 0, 2, 9]);
        assert!(matches!(
            read_frame(&mut cursor, RECV_CAPACITY),
            Err(ProtocolError::PeerClosed)
        ));
    }

    #[test]
    fn test_unknown_and_malformed_frames() {
        let unknown = Frame { tag: 42, payload: vec![] };
        assert!(matches!(
            NetMessage::decode(&unknown),
            Err(ProtocolError::UnknownType(42))
        ));

        let short_move = Frame { tag: 2, payload: vec![3] };
        assert!(matches!(
            NetMessage::decode(&short_move),
            Err(ProtocolError::Malformed { frame: "Move", .. })
        ));

        let empty_response = Frame { tag: 5, payload: vec![] };
        assert!(NetMessage::decode(&empty_response).is_err());
    }

    #[test]
    fn test_name_truncated_on_both_sides() {
        let long = "n".repeat(80);
        let payload = NetMessage::Hello { name: long.clone() }.encode_payload();
        assert_eq!(payload.len(), NAME_MAX + 1);

        let frame = Frame {
            tag: FrameType::Hello as u8,
            payload: long.into_bytes(),
        };
        match NetMessage::decode(&frame).unwrap() {
            NetMessage::Hello { name } => assert_eq!(name.len(), NAME_MAX),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_payload_too_large_to_send() {
        let mut sink = Vec::new();
        let err = write_frame(&mut sink, FrameType::Chat, &vec![0u8; MAX_PAYLOAD + 1]).unwrap_err();
        assert!(matches!(err, ProtocolError::PayloadTooLarge(_)));
        assert!(sink.is_empty());
    }
}
