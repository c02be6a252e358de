//! Packet decoder
//!
//! Receiver-side counterpart of the encoder. Validates the magic before
//! trusting any length field, then converts the payload back to f32.

use bytes::Buf;

use crate::codec::packet::{PacketHeader, SampleFormat, HEADER_SIZE};
use crate::error::CodecError;

/// One decoded audio packet
#[derive(Debug, Clone)]
pub struct DecodedPacket {
    pub header: PacketHeader,
    /// Interleaved samples, converted to f32 regardless of wire format
    pub samples: Vec<f32>,
}

/// Decode a datagram into header fields and f32 samples.
///
/// Rejects datagrams with a bad magic, a truncated header, an unknown
/// format tag, or a payload length that disagrees with the header.
pub fn decode_packet(datagram: &[u8]) -> Result<DecodedPacket, CodecError> {
    let header = PacketHeader::read_from(datagram)?;

    let mut payload = &datagram[HEADER_SIZE..];
    let expected = header.payload_len();
    if payload.len() != expected {
        return Err(CodecError::PayloadMismatch {
            expected,
            actual: payload.len(),
        });
    }

    let sample_count = header.frame_count as usize * header.channels as usize;
    let mut samples = Vec::with_capacity(sample_count);
    match header.format {
        SampleFormat::Float32 => {
            for _ in 0..sample_count {
                samples.push(payload.get_f32_le());
            }
        }
        SampleFormat::Int16 => {
            for _ in 0..sample_count {
                samples.push(payload.get_i16_le() as f32 / i16::MAX as f32);
            }
        }
    }

    Ok(DecodedPacket { header, samples })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};

    fn encode_raw(frame_count: u16, payload_samples: usize) -> BytesMut {
        let header = PacketHeader {
            sequence: 1,
            timestamp_ns: 2,
            sample_rate: 48000,
            channels: 2,
            frame_count,
            format: SampleFormat::Float32,
            flags: 0,
        };
        let mut buf = BytesMut::new();
        header.write_to(&mut buf);
        for _ in 0..payload_samples {
            buf.put_f32_le(0.0);
        }
        buf
    }

    #[test]
    fn test_payload_length_must_match_header() {
        // Header claims 4 frames of stereo = 8 samples, payload has 6
        let buf = encode_raw(4, 6);
        assert!(matches!(
            decode_packet(&buf),
            Err(CodecError::PayloadMismatch { expected: 32, actual: 24 })
        ));
    }

    #[test]
    fn test_garbage_datagram_rejected() {
        let garbage = [0x55u8; 64];
        assert!(matches!(
            decode_packet(&garbage),
            Err(CodecError::BadMagic(_))
        ));
    }

    #[test]
    fn test_short_datagram_rejected() {
        let short = [0u8; 10];
        assert!(matches!(decode_packet(&short), Err(CodecError::Truncated(10))));
    }
}
