//! Byte encoding used on the simulated link.
//!
//! ```text
//!  0      1          5          9          11
//!  +------+----------+----------+----------+-------------+
//!  | kind | seq (BE) | ack (BE) | checksum | payload ... |
//!  +------+----------+----------+----------+-------------+
//! ```
//!
//! The checksum is the 16-bit ones' complement sum over the whole frame with
//! the checksum field zeroed, so any single flipped bit is detected.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use swp_abstract::{Frame, FrameKind, Packet};
use thiserror::Error;

pub const HEADER_LEN: usize = 11;
const CHECKSUM_OFFSET: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("frame of {0} bytes is shorter than the header")]
    Truncated(usize),
    #[error("checksum mismatch (carried {carried:04X}, computed {computed:04X})")]
    ChecksumMismatch { carried: u16, computed: u16 },
    #[error("unknown frame kind {0}")]
    UnknownKind(u8),
}

/// 16-bit ones' complement sum, as used by the Internet protocols.
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);

    for chunk in &mut chunks {
        let value = u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
        sum = sum.wrapping_add(value);
    }

    if let Some(&byte) = chunks.remainder().first() {
        sum = sum.wrapping_add((byte as u32) << 8);
    }

    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !(sum as u16)
}

pub fn encode(frame: &Frame) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + frame.payload.len());
    buf.put_u8(frame.kind.code());
    buf.put_u32(frame.seq);
    buf.put_u32(frame.ack);
    buf.put_u16(0);
    buf.put_slice(frame.payload.as_bytes());

    let checksum = internet_checksum(&buf);
    buf[CHECKSUM_OFFSET..HEADER_LEN].copy_from_slice(&checksum.to_be_bytes());
    buf.freeze()
}

pub fn decode(bytes: &Bytes) -> Result<Frame, WireError> {
    if bytes.len() < HEADER_LEN {
        return Err(WireError::Truncated(bytes.len()));
    }

    let carried = u16::from_be_bytes([bytes[CHECKSUM_OFFSET], bytes[CHECKSUM_OFFSET + 1]]);
    let mut zeroed = BytesMut::from(&bytes[..]);
    zeroed[CHECKSUM_OFFSET..HEADER_LEN].fill(0);
    let computed = internet_checksum(&zeroed);
    if carried != computed {
        return Err(WireError::ChecksumMismatch { carried, computed });
    }

    let mut header = &bytes[..HEADER_LEN];
    let code = header.get_u8();
    let kind = FrameKind::from_code(code).ok_or(WireError::UnknownKind(code))?;
    let seq = header.get_u32();
    let ack = header.get_u32();

    let payload = match kind {
        FrameKind::Data => Packet::from(bytes.slice(HEADER_LEN..)),
        FrameKind::Ack | FrameKind::Nak => Packet::empty(),
    };
    Ok(Frame {
        kind,
        seq,
        ack,
        payload,
    })
}
