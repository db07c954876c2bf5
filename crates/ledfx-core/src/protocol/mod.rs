//! Wire codecs for the two LED streaming protocols plus the pieces they share.

pub mod artnet;
pub mod codec;
pub mod color_mapping;
pub mod ddp;
pub mod sequence;

pub use artnet::{decode_dmx, encode_dmx, ArtDmx, DEFAULT_ARTNET_PORT};
pub use codec::ProtocolError;
pub use color_mapping::{ColorMapping, ParseColorMappingError};
pub use ddp::{decode_packet, encode_frame, DdpHeader, DEFAULT_DDP_PORT};
pub use sequence::FrameSequence;
