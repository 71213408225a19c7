//! Length-prefixed MessagePack codec for report records.
//!
//! Framing: `[4 bytes: payload length, big-endian u32][N bytes: MessagePack payload]`

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::protocol::{MAX_RECORD_SIZE, Record};

const HEADER_LEN: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("record too large: {0} bytes (max {MAX_RECORD_SIZE})")]
    PayloadTooLarge(usize),
    #[error("report ends inside a record ({0} trailing bytes)")]
    Truncated(usize),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("MessagePack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("MessagePack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Encodes and decodes [`Record`] frames.
///
/// Stateless: a frame is only consumed once it is complete, so a
/// partial header or payload stays in the buffer untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportCodec;

impl ReportCodec {
    pub fn new() -> Self {
        Self
    }
}

/// Payload length announced by the header at the front of `src`.
fn peek_len(src: &[u8]) -> Option<usize> {
    match src.get(..HEADER_LEN) {
        Some(&[a, b, c, d]) => Some(u32::from_be_bytes([a, b, c, d]) as usize),
        _ => None,
    }
}

impl Decoder for ReportCodec {
    type Item = Record;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(len) = peek_len(src) else {
            return Ok(None);
        };
        if len > MAX_RECORD_SIZE {
            return Err(CodecError::PayloadTooLarge(len));
        }

        let frame_len = HEADER_LEN + len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let payload = src.split_to(len);
        Ok(Some(rmp_serde::from_slice(&payload)?))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(record) => Ok(Some(record)),
            None if src.is_empty() => Ok(None),
            None => Err(CodecError::Truncated(src.len())),
        }
    }
}

impl Encoder<Record> for ReportCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Record, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = rmp_serde::to_vec_named(&item)?;
        if payload.len() > MAX_RECORD_SIZE {
            return Err(CodecError::PayloadTooLarge(payload.len()));
        }
        dst.reserve(HEADER_LEN + payload.len());
        dst.put_u32(payload.len() as u32);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}
