//! Shared decode errors and big-endian / little-endian field helpers used by
//! the DDP and Art-Net codecs.
//!
//! Encoding never fails: the encoders only write fixed-width fields whose
//! values are bounded by the caller's slice lengths. Decoding is where bytes
//! from the network are untrusted, so every decoder returns
//! [`ProtocolError`] instead of panicking on short or inconsistent input.

use thiserror::Error;

/// Errors that can occur while decoding a datagram.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The packet does not start with the expected protocol identifier.
    #[error("bad protocol identifier")]
    BadMagic,

    /// The opcode is not one this codec understands.
    #[error("unsupported opcode: 0x{0:04X}")]
    UnsupportedOpcode(u16),

    /// A header field holds a value this codec does not accept.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The length field in the header disagrees with the bytes actually present.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },
}

// ── Field helpers ─────────────────────────────────────────────────────────────

pub(crate) fn require_len(buf: &[u8], needed: usize) -> Result<(), ProtocolError> {
    if buf.len() < needed {
        Err(ProtocolError::InsufficientData {
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

pub(crate) fn read_u16_be(buf: &[u8], offset: usize) -> Result<u16, ProtocolError> {
    require_len(buf, offset + 2)?;
    Ok(u16::from_be_bytes([buf[offset], buf[offset + 1]]))
}

pub(crate) fn read_u16_le(buf: &[u8], offset: usize) -> Result<u16, ProtocolError> {
    require_len(buf, offset + 2)?;
    Ok(u16::from_le_bytes([buf[offset], buf[offset + 1]]))
}

pub(crate) fn read_u32_be(buf: &[u8], offset: usize) -> Result<u32, ProtocolError> {
    require_len(buf, offset + 4)?;
    Ok(u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]))
}
