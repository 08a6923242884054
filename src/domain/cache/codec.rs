//! Binary encoding of cached embedding vectors
//!
//! Frame layout: one version byte, a little-endian `u32` element count, then
//! each element as a little-endian `f32`. Decoding restores the exact bits.

use bytes::{Buf, BufMut, BytesMut};

use crate::domain::DomainError;

const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = 1 + 4;

/// Serializes a vector into a cache frame
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + vector.len() * 4);
    buf.put_u8(FORMAT_VERSION);
    buf.put_u32_le(vector.len() as u32);

    for value in vector {
        buf.put_f32_le(*value);
    }

    buf.to_vec()
}

/// Deserializes a cache frame produced by [`encode_vector`]
pub fn decode_vector(data: &[u8]) -> Result<Vec<f32>, DomainError> {
    if data.len() < HEADER_LEN {
        return Err(DomainError::internal(format!(
            "Cached vector frame too short: {} bytes",
            data.len()
        )));
    }

    let mut buf = data;
    let version = buf.get_u8();

    if version != FORMAT_VERSION {
        return Err(DomainError::internal(format!(
            "Unsupported cached vector format version {}",
            version
        )));
    }

    let len = buf.get_u32_le() as usize;

    if buf.remaining() != len * 4 {
        return Err(DomainError::internal(format!(
            "Cached vector frame declares {} elements but carries {} bytes",
            len,
            buf.remaining()
        )));
    }

    let mut vector = Vec::with_capacity(len);

    while buf.has_remaining() {
        vector.push(buf.get_f32_le());
    }

    Ok(vector)
}
