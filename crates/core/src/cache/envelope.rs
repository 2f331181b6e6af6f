//! Self-describing on-disk record for a [`CachedBlob`].
//!
//! Layout:
//!
//! ```text
//! "LOUPE" 0x01 | header_len: u32 BE | header: JSON BlobMeta | body bytes
//! ```
//!
//! The header carries the source URL and ETag so a disk hit can be revalidated
//! without any side index.

use super::blob::{BlobMeta, CachedBlob};
use bytes::{BufMut, Bytes, BytesMut};

const MAGIC: &[u8; 6] = b"LOUPE\x01";
const LEN_BYTES: usize = 4;

/// Errors decoding a stored envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("bad magic: not a loupe cache record")]
    BadMagic,

    #[error("truncated record: {0}")]
    Truncated(&'static str),

    #[error("invalid header: {0}")]
    Header(#[from] serde_json::Error),
}

/// Encode a blob into its on-disk form.
pub fn encode(blob: &CachedBlob) -> Result<Bytes, EnvelopeError> {
    let header = serde_json::to_vec(&blob.meta())?;
    let mut buf = BytesMut::with_capacity(MAGIC.len() + LEN_BYTES + header.len() + blob.data.len());
    buf.put_slice(MAGIC);
    buf.put_u32(header.len() as u32);
    buf.put_slice(&header);
    buf.put_slice(&blob.data);
    Ok(buf.freeze())
}

/// Decode an on-disk record. The body is a zero-copy slice of `raw`.
pub fn decode(raw: Bytes) -> Result<CachedBlob, EnvelopeError> {
    if raw.len() < MAGIC.len() || &raw[..MAGIC.len()] != MAGIC {
        return Err(EnvelopeError::BadMagic);
    }

    let len_start = MAGIC.len();
    let header_start = len_start + LEN_BYTES;
    if raw.len() < header_start {
        return Err(EnvelopeError::Truncated("header length"));
    }

    let mut len_bytes = [0u8; LEN_BYTES];
    len_bytes.copy_from_slice(&raw[len_start..header_start]);
    let header_len = u32::from_be_bytes(len_bytes) as usize;

    let body_start = header_start
        .checked_add(header_len)
        .filter(|end| *end <= raw.len())
        .ok_or(EnvelopeError::Truncated("header"))?;

    let meta: BlobMeta = serde_json::from_slice(&raw[header_start..body_start])?;
    Ok(CachedBlob::from_parts(meta, raw.slice(body_start..)))
}
