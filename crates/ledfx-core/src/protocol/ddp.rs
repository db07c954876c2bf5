//! DDP (Distributed Display Protocol) pixel-stream codec.
//!
//! Wire format (all multi-byte integers big-endian):
//! ```text
//! [flags:1][sequence:1][data_type:1][destination:1][offset:4][length:2][payload:length]
//! ```
//! A panel's pixels form one continuous RGB byte stream. Streams longer than
//! [`MAX_LEDS_PER_PACKET`] LEDs are split into fragments; each fragment
//! carries the byte `offset` of its first payload byte. Only the final
//! fragment sets the push flag, which tells the receiver to latch the frame.
//! Every fragment of one frame carries the same sequence number.

use crate::protocol::codec::{read_u16_be, read_u32_be, require_len, ProtocolError};

/// Size of the fixed DDP header in bytes.
pub const DDP_HEADER_LEN: usize = 10;

/// Flag bit telling the receiver to display the accumulated frame.
pub const DDP_FLAG_PUSH: u8 = 0x40;

/// Data type for 8-bit RGB pixel data.
pub const DDP_DATA_TYPE_RGB: u8 = 0x01;

/// Destination id of the receiver's default output.
pub const DDP_DEST_DEFAULT: u8 = 0x01;

/// LEDs per fragment.
pub const MAX_LEDS_PER_PACKET: usize = 480;

/// Payload bytes per fragment (`MAX_LEDS_PER_PACKET * 3`).
pub const MAX_PAYLOAD_BYTES: usize = MAX_LEDS_PER_PACKET * 3;

/// UDP port DDP receivers listen on by default.
pub const DEFAULT_DDP_PORT: u16 = 4048;

/// The 10-byte header at the front of every DDP datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdpHeader {
    pub flags: u8,
    pub sequence: u8,
    pub data_type: u8,
    pub destination: u8,
    /// Byte offset of this fragment's payload within the frame's stream.
    pub offset: u32,
    /// Payload length in bytes.
    pub length: u16,
}

impl DdpHeader {
    /// Header for one RGB fragment.
    pub fn rgb(sequence: u8, offset: u32, length: u16, push: bool) -> Self {
        Self {
            flags: if push { DDP_FLAG_PUSH } else { 0x00 },
            sequence,
            data_type: DDP_DATA_TYPE_RGB,
            destination: DDP_DEST_DEFAULT,
            offset,
            length,
        }
    }

    pub fn is_push(&self) -> bool {
        self.flags & DDP_FLAG_PUSH != 0
    }

    /// Appends the encoded header to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.flags);
        buf.push(self.sequence);
        buf.push(self.data_type);
        buf.push(self.destination);
        buf.extend_from_slice(&self.offset.to_be_bytes());
        buf.extend_from_slice(&self.length.to_be_bytes());
    }

    /// Parses the header from the start of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InsufficientData`] if fewer than
    /// [`DDP_HEADER_LEN`] bytes are available.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        require_len(bytes, DDP_HEADER_LEN)?;
        Ok(Self {
            flags: bytes[0],
            sequence: bytes[1],
            data_type: bytes[2],
            destination: bytes[3],
            offset: read_u32_be(bytes, 4)?,
            length: read_u16_be(bytes, 8)?,
        })
    }
}

/// Number of fragments needed for `led_count` LEDs: `ceil(led_count / 480)`.
pub fn fragment_count(led_count: usize) -> usize {
    led_count.div_ceil(MAX_LEDS_PER_PACKET)
}

/// Encodes one frame of packed RGB bytes into DDP datagrams.
///
/// `rgb` is `[R, G, B, R, G, B, ...]` in the panel's serialization order; a
/// trailing partial triplet is ignored. An empty stream produces no
/// datagrams.
///
/// # Examples
///
/// ```rust
/// use ledfx_core::protocol::ddp::{encode_frame, DdpHeader};
///
/// let rgb = vec![0u8; 600 * 3];
/// let packets = encode_frame(&rgb, 7);
/// assert_eq!(packets.len(), 2);
/// let last = DdpHeader::decode(&packets[1]).unwrap();
/// assert!(last.is_push());
/// assert_eq!(last.offset, 1440);
/// ```
pub fn encode_frame(rgb: &[u8], sequence: u8) -> Vec<Vec<u8>> {
    let usable = rgb.len() - rgb.len() % 3;
    let chunks: Vec<&[u8]> = rgb[..usable].chunks(MAX_PAYLOAD_BYTES).collect();
    let last = chunks.len().saturating_sub(1);

    chunks
        .iter()
        .enumerate()
        .map(|(i, payload)| {
            let header = DdpHeader::rgb(
                sequence,
                (i * MAX_PAYLOAD_BYTES) as u32,
                payload.len() as u16,
                i == last,
            );
            let mut packet = Vec::with_capacity(DDP_HEADER_LEN + payload.len());
            header.encode_into(&mut packet);
            packet.extend_from_slice(payload);
            packet
        })
        .collect()
}

/// Splits a datagram into its header and payload.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] for a datagram shorter than the
/// header, or [`ProtocolError::PayloadLengthMismatch`] when the length field
/// disagrees with the bytes that follow.
pub fn decode_packet(bytes: &[u8]) -> Result<(DdpHeader, &[u8]), ProtocolError> {
    let header = DdpHeader::decode(bytes)?;
    let payload = &bytes[DDP_HEADER_LEN..];
    if payload.len() != header.length as usize {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared: header.length as usize,
            available: payload.len(),
        });
    }
    Ok((header, payload))
}
