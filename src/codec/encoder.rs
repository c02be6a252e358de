//! Packet encoder
//!
//! Serializes one packet per call into a buffer that is allocated once and
//! reused, so the sender loop never allocates per packet.

use bytes::{BufMut, BytesMut};

use crate::codec::packet::{PacketHeader, SampleFormat, HEADER_SIZE};
use crate::config::SenderConfig;
use crate::constants::MAX_PACKET_SIZE;
use crate::error::CodecError;

/// Encoder for audio packets with a fixed per-stream configuration
pub struct PacketEncoder {
    sample_rate: u32,
    channels: u16,
    frame_count: u16,
    format: SampleFormat,
    /// Encoding buffer (reused to avoid allocations)
    buf: BytesMut,
    /// Packets produced since the last reset
    packets_encoded: u64,
    /// Total bytes produced
    bytes_produced: u64,
}

impl PacketEncoder {
    /// Create an encoder for the given sender configuration.
    ///
    /// The configuration is assumed validated (`SenderConfig::validate`
    /// rejects packet sizes over the wire maximum when the config is set).
    pub fn new(config: &SenderConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: config.channels,
            frame_count: config.frames_per_packet,
            format: config.format,
            buf: BytesMut::with_capacity(MAX_PACKET_SIZE),
            packets_encoded: 0,
            bytes_produced: 0,
        }
    }

    /// Encode one packet from interleaved f32 samples.
    ///
    /// `samples` must hold exactly `frames_per_packet * channels` samples.
    /// Returns the serialized packet, valid until the next call.
    pub fn encode(
        &mut self,
        sequence: u32,
        timestamp_ns: u64,
        samples: &[f32],
    ) -> Result<&[u8], CodecError> {
        let expected = self.samples_per_packet();
        if samples.len() != expected {
            return Err(CodecError::PayloadMismatch {
                expected,
                actual: samples.len(),
            });
        }

        self.buf.clear();

        let header = PacketHeader {
            sequence,
            timestamp_ns,
            sample_rate: self.sample_rate,
            channels: self.channels,
            frame_count: self.frame_count,
            format: self.format,
            flags: 0,
        };
        header.write_to(&mut self.buf);

        match self.format {
            SampleFormat::Float32 => {
                for &sample in samples {
                    self.buf.put_f32_le(sample);
                }
            }
            SampleFormat::Int16 => {
                for &sample in samples {
                    let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                    self.buf.put_i16_le(scaled);
                }
            }
        }

        self.packets_encoded += 1;
        self.bytes_produced += self.buf.len() as u64;

        Ok(&self.buf[..])
    }

    /// Interleaved samples expected per packet
    pub fn samples_per_packet(&self) -> usize {
        self.frame_count as usize * self.channels as usize
    }

    /// Serialized size of one packet in bytes
    pub fn packet_size(&self) -> usize {
        HEADER_SIZE + self.samples_per_packet() * self.format.sample_size()
    }

    /// Get statistics
    pub fn stats(&self) -> EncoderStats {
        EncoderStats {
            packets_encoded: self.packets_encoded,
            bytes_produced: self.bytes_produced,
        }
    }

    /// Reset statistics
    pub fn reset_stats(&mut self) {
        self.packets_encoded = 0;
        self.bytes_produced = 0;
    }
}

/// Encoder statistics
#[derive(Debug, Clone)]
pub struct EncoderStats {
    pub packets_encoded: u64,
    pub bytes_produced: u64,
}
