//! Art-Net OpDmx codec.
//!
//! Each panel is addressed as its own universe and receives exactly one
//! datagram per frame:
//!
//! ```text
//! offset  size  field
//!      0     8  "Art-Net\0"
//!      8     2  opcode 0x5000, little-endian   (00 50)
//!     10     2  protocol version 14, big-endian (00 0E)
//!     12     1  sequence (always 0: sequencing disabled)
//!     13     1  physical port (0)
//!     14     2  universe, little-endian
//!     16     2  data length, big-endian = 1 + led_count * 3
//!     18     1  DMX start code (0)
//!     19     N  pixel bytes, each pixel passed through the panel's ColorMapping
//! ```
//!
//! The data length counts the start code, which is why pixel data begins one
//! byte after the 18-byte header.

use crate::domain::color::Rgb;
use crate::protocol::codec::{read_u16_be, read_u16_le, require_len, ProtocolError};
use crate::protocol::color_mapping::ColorMapping;

/// Protocol identifier at the start of every Art-Net packet.
pub const ARTNET_ID: [u8; 8] = *b"Art-Net\0";

/// OpDmx opcode.
pub const OP_DMX: u16 = 0x5000;

/// Art-Net protocol revision.
pub const PROTOCOL_VERSION: u16 = 14;

/// Bytes before the start code.
pub const ARTNET_HEADER_LEN: usize = 18;

/// Index of the first pixel byte (header + start code).
pub const PIXEL_DATA_OFFSET: usize = ARTNET_HEADER_LEN + 1;

/// Port the reference WLED deployment listens on for Art-Net.
pub const DEFAULT_ARTNET_PORT: u16 = 5568;

/// Largest LED count whose data length still fits the 16-bit length field.
pub const MAX_LEDS: usize = (u16::MAX as usize - 1) / 3;

/// A decoded OpDmx packet, borrowing from the datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtDmx<'a> {
    pub universe: u16,
    /// Pixel bytes after the start code, still in wire (mapped) order.
    pub data: &'a [u8],
}

impl ArtDmx<'_> {
    /// Recovers canonical pixels by inverting `mapping`.
    pub fn pixels(&self, mapping: ColorMapping) -> Vec<Rgb> {
        self.data
            .chunks_exact(3)
            .map(|w| mapping.unmap([w[0], w[1], w[2]]))
            .collect()
    }
}

/// Encodes one OpDmx packet carrying `led_count` pixels.
///
/// `rgb` is the panel's packed canonical stream. Pixels beyond the end of
/// `rgb` are sent as black; extra bytes in `rgb` are ignored. `led_count` is
/// capped at [`MAX_LEDS`]; the encoder never splits a panel across universes.
///
/// # Examples
///
/// ```rust
/// use ledfx_core::protocol::artnet::{encode_dmx, PIXEL_DATA_OFFSET};
/// use ledfx_core::ColorMapping;
///
/// let packet = encode_dmx(3, ColorMapping::Gbr, &[255, 0, 0], 1);
/// assert_eq!(&packet[14..16], &[3, 0]);
/// assert_eq!(&packet[PIXEL_DATA_OFFSET..], &[0, 0, 255]);
/// ```
pub fn encode_dmx(universe: u16, mapping: ColorMapping, rgb: &[u8], led_count: usize) -> Vec<u8> {
    let mut packet = Vec::new();
    encode_dmx_into(universe, mapping, rgb, led_count, &mut packet);
    packet
}

/// Like [`encode_dmx`] but writes into a caller-provided buffer, clearing it
/// first. Lets a channel reuse one allocation across frames.
pub fn encode_dmx_into(
    universe: u16,
    mapping: ColorMapping,
    rgb: &[u8],
    led_count: usize,
    packet: &mut Vec<u8>,
) {
    let led_count = led_count.min(MAX_LEDS);
    let data_length = (1 + led_count * 3) as u16;

    packet.clear();
    packet.reserve(ARTNET_HEADER_LEN + data_length as usize);
    packet.extend_from_slice(&ARTNET_ID);
    packet.extend_from_slice(&OP_DMX.to_le_bytes());
    packet.extend_from_slice(&PROTOCOL_VERSION.to_be_bytes());
    packet.push(0); // sequence
    packet.push(0); // physical
    packet.extend_from_slice(&universe.to_le_bytes());
    packet.extend_from_slice(&data_length.to_be_bytes());
    packet.push(0); // start code

    let available = (rgb.len() / 3).min(led_count);
    mapping.apply_slice(&rgb[..available * 3], packet);
    packet.resize(ARTNET_HEADER_LEN + data_length as usize, 0);
}

/// Parses an OpDmx packet.
///
/// # Errors
///
/// - [`ProtocolError::InsufficientData`] if the datagram is shorter than the
///   header plus start code.
/// - [`ProtocolError::BadMagic`] if it does not start with `"Art-Net\0"`.
/// - [`ProtocolError::UnsupportedOpcode`] for anything other than OpDmx.
/// - [`ProtocolError::PayloadLengthMismatch`] if the length field disagrees
///   with the bytes present.
/// - [`ProtocolError::MalformedPayload`] for a non-zero start code.
pub fn decode_dmx(bytes: &[u8]) -> Result<ArtDmx<'_>, ProtocolError> {
    require_len(bytes, PIXEL_DATA_OFFSET)?;
    if bytes[..8] != ARTNET_ID {
        return Err(ProtocolError::BadMagic);
    }
    let opcode = read_u16_le(bytes, 8)?;
    if opcode != OP_DMX {
        return Err(ProtocolError::UnsupportedOpcode(opcode));
    }
    let universe = read_u16_le(bytes, 14)?;
    let declared = read_u16_be(bytes, 16)? as usize;
    let available = bytes.len() - ARTNET_HEADER_LEN;
    if declared != available {
        return Err(ProtocolError::PayloadLengthMismatch { declared, available });
    }
    if bytes[ARTNET_HEADER_LEN] != 0 {
        return Err(ProtocolError::MalformedPayload(format!(
            "unexpected DMX start code {}",
            bytes[ARTNET_HEADER_LEN]
        )));
    }
    Ok(ArtDmx {
        universe,
        data: &bytes[PIXEL_DATA_OFFSET..],
    })
}
