//! Binary packet codec
//!
//! Fixed 28-byte header followed by interleaved payload samples in the
//! declared wire format. The decode side exists for the remote receiver
//! and for tests; the streaming core only encodes.

pub mod decoder;
pub mod encoder;
pub mod packet;

pub use decoder::{decode_packet, DecodedPacket};
pub use encoder::PacketEncoder;
pub use packet::{PacketHeader, SampleFormat, HEADER_SIZE, MAGIC};
