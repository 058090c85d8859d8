use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequence number. Always interpreted modulo `MAX_SEQ + 1`.
pub type Seq = u32;

/// Opaque payload exchanged with the network layer.
///
/// The protocol never looks inside; cloning only bumps a reference count, so
/// the sender can keep a copy in its outbound buffer for retransmission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Packet {
    data: Bytes,
}

impl Packet {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for Packet {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&'static [u8]> for Packet {
    fn from(data: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(data))
    }
}

impl From<&'static str> for Packet {
    fn from(data: &'static str) -> Self {
        Self::new(Bytes::from_static(data.as_bytes()))
    }
}

impl From<Bytes> for Packet {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Data,
    Ack,
    Nak,
}

impl FrameKind {
    /// One-byte code used by wire encodings.
    pub fn code(self) -> u8 {
        match self {
            FrameKind::Data => 0,
            FrameKind::Ack => 1,
            FrameKind::Nak => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(FrameKind::Data),
            1 => Some(FrameKind::Ack),
            2 => Some(FrameKind::Nak),
            _ => None,
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameKind::Data => "DATA",
            FrameKind::Ack => "ACK",
            FrameKind::Nak => "NAK",
        };
        f.write_str(name)
    }
}

/// Unit of transmission between the two peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub kind: FrameKind,
    /// Sequence number of the carried payload. Only meaningful for DATA.
    pub seq: Seq,
    /// Piggybacked acknowledgment: last sequence number received in order.
    pub ack: Seq,
    /// Empty unless `kind` is DATA.
    pub payload: Packet,
}

impl Frame {
    pub fn data(seq: Seq, ack: Seq, payload: Packet) -> Self {
        Self {
            kind: FrameKind::Data,
            seq,
            ack,
            payload,
        }
    }

    pub fn ack(ack: Seq) -> Self {
        Self {
            kind: FrameKind::Ack,
            seq: 0,
            ack,
            payload: Packet::empty(),
        }
    }

    pub fn nak(ack: Seq) -> Self {
        Self {
            kind: FrameKind::Nak,
            seq: 0,
            ack,
            payload: Packet::empty(),
        }
    }

    pub fn is_data(&self) -> bool {
        self.kind == FrameKind::Data
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} seq={} ack={} ({} bytes)",
            self.kind,
            self.seq,
            self.ack,
            self.payload.len()
        )
    }
}
