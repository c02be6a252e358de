//! Audio packet wire format
//!
//! ```text
//! magic:u32 | sequence:u32 | timestamp_ns:u64 | sample_rate:u32 |
//! channels:u16 | frame_count:u16 | format:u16 | flags:u16 | payload...
//! ```
//!
//! All fields little-endian. Receivers must discard packets whose magic
//! does not match before trusting any length field.

use bytes::{Buf, BufMut};

use crate::error::CodecError;

/// Protocol magic, `b"AUDS"` on the wire
pub const MAGIC: u32 = 0x5344_5541;

/// Fixed header size in bytes
pub const HEADER_SIZE: usize = 28;

/// Payload sample format tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 32-bit IEEE float, bit-exact
    Float32,
    /// 16-bit signed integer, scaled and clamped
    Int16,
}

impl SampleFormat {
    /// Wire tag for this format
    pub fn tag(self) -> u16 {
        match self {
            SampleFormat::Float32 => 1,
            SampleFormat::Int16 => 2,
        }
    }

    /// Parse a wire tag
    pub fn from_tag(tag: u16) -> Result<Self, CodecError> {
        match tag {
            1 => Ok(SampleFormat::Float32),
            2 => Ok(SampleFormat::Int16),
            other => Err(CodecError::UnknownFormat(other)),
        }
    }

    /// Bytes per sample on the wire
    pub fn sample_size(self) -> usize {
        match self {
            SampleFormat::Float32 => 4,
            SampleFormat::Int16 => 2,
        }
    }
}

/// Decoded packet header fields (magic is validated, not stored)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Monotonically increasing, wraps at u32::MAX
    pub sequence: u32,
    /// Capture-relative timestamp in nanoseconds
    pub timestamp_ns: u64,
    pub sample_rate: u32,
    pub channels: u16,
    pub frame_count: u16,
    pub format: SampleFormat,
    pub flags: u16,
}

impl PacketHeader {
    /// Serialize the header, magic first
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32_le(MAGIC);
        buf.put_u32_le(self.sequence);
        buf.put_u64_le(self.timestamp_ns);
        buf.put_u32_le(self.sample_rate);
        buf.put_u16_le(self.channels);
        buf.put_u16_le(self.frame_count);
        buf.put_u16_le(self.format.tag());
        buf.put_u16_le(self.flags);
    }

    /// Parse and validate a header from the front of a datagram
    pub fn read_from(mut buf: &[u8]) -> Result<Self, CodecError> {
        if buf.len() < HEADER_SIZE {
            return Err(CodecError::Truncated(buf.len()));
        }

        let magic = buf.get_u32_le();
        if magic != MAGIC {
            return Err(CodecError::BadMagic(magic));
        }

        let sequence = buf.get_u32_le();
        let timestamp_ns = buf.get_u64_le();
        let sample_rate = buf.get_u32_le();
        let channels = buf.get_u16_le();
        let frame_count = buf.get_u16_le();
        let format = SampleFormat::from_tag(buf.get_u16_le())?;
        let flags = buf.get_u16_le();

        Ok(Self {
            sequence,
            timestamp_ns,
            sample_rate,
            channels,
            frame_count,
            format,
            flags,
        })
    }

    /// Payload length in bytes implied by the header fields
    pub fn payload_len(&self) -> usize {
        self.frame_count as usize * self.channels as usize * self.format.sample_size()
    }
}

/// Total packet size for a given configuration
pub fn packet_size(frames_per_packet: u16, channels: u16, format: SampleFormat) -> usize {
    HEADER_SIZE + frames_per_packet as usize * channels as usize * format.sample_size()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn sample_header() -> PacketHeader {
        PacketHeader {
            sequence: 42,
            timestamp_ns: 1_234_567_890,
            sample_rate: 48000,
            channels: 2,
            frame_count: 128,
            format: SampleFormat::Float32,
            flags: 0,
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample_header();
        let mut buf = BytesMut::new();
        header.write_to(&mut buf);
        assert_eq!(buf.len(), HEADER_SIZE);

        let parsed = PacketHeader::read_from(&buf).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut buf = BytesMut::new();
        sample_header().write_to(&mut buf);
        buf[0] ^= 0xff;

        assert!(matches!(
            PacketHeader::read_from(&buf),
            Err(CodecError::BadMagic(_))
        ));
    }

    #[test]
    fn test_truncated_header_rejected() {
        let mut buf = BytesMut::new();
        sample_header().write_to(&mut buf);

        assert!(matches!(
            PacketHeader::read_from(&buf[..HEADER_SIZE - 1]),
            Err(CodecError::Truncated(_))
        ));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let mut buf = BytesMut::new();
        sample_header().write_to(&mut buf);
        // format tag lives at offset 24
        buf[24] = 9;
        buf[25] = 0;

        assert!(matches!(
            PacketHeader::read_from(&buf),
            Err(CodecError::UnknownFormat(9))
        ));
    }

    #[test]
    fn test_packet_size() {
        assert_eq!(packet_size(128, 2, SampleFormat::Float32), 28 + 1024);
        assert_eq!(packet_size(128, 2, SampleFormat::Int16), 28 + 512);
    }
}
