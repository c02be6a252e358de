//! # UDP Audio Streamer
//!
//! Low-latency streaming of real-time capture audio to a remote endpoint.
//!
//! A hard-real-time producer (the host's render callback) hands interleaved
//! frames to a lock-free ring buffer; a dedicated sender thread drains the
//! buffer, packetizes, and transmits over a non-blocking UDP socket. When the
//! network cannot keep up, frames are dropped — the producer is never blocked.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        CAPTURE HOST                              │
//! │  ┌────────────────────┐                                          │
//! │  │  Render callback   │  real-time thread (external)             │
//! │  │  (interleaved f32) │                                          │
//! │  └─────────┬──────────┘                                          │
//! │            │ write() — wait-free, no locks, no syscalls          │
//! │            ▼                                                     │
//! │  ┌────────────────────┐      ┌─────────────────────────────┐     │
//! │  │     RingBuffer     │◄─────┤      SessionController      │     │
//! │  │   (audio::buffer)  │      │  Idle/Running, config, IO   │     │
//! │  └─────────┬──────────┘      └──────────────┬──────────────┘     │
//! │            │ read()                         │ start()/stop()     │
//! │            ▼                                ▼                    │
//! │  ┌────────────────────┐      ┌─────────────────────────────┐     │
//! │  │   Sender thread    │─────►│  PacketEncoder (codec)      │     │
//! │  │  (network::sender) │      │  [magic|seq|ts|fmt|samples] │     │
//! │  └─────────┬──────────┘      └─────────────────────────────┘     │
//! │            │ send_to() — non-blocking, drops on backpressure     │
//! └────────────┼─────────────────────────────────────────────────────┘
//!              │ UDP
//!              ▼
//!       remote receiver (validates magic, tracks sequence gaps)
//! ```

pub mod audio;
pub mod codec;
pub mod config;
pub mod error;
pub mod network;
pub mod session;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Default sample rate for audio processing
    pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

    /// Sample rates the session accepts
    pub const SUPPORTED_SAMPLE_RATES: [u32; 2] = [44100, 48000];

    /// Default channel count (stereo)
    pub const DEFAULT_CHANNELS: u16 = 2;

    /// Default UDP port for audio streaming
    pub const DEFAULT_UDP_PORT: u16 = 19620;

    /// Maximum packet size for UDP
    pub const MAX_PACKET_SIZE: usize = 1472; // MTU - IP/UDP headers

    /// Frames per packet (28-byte header + 128*2*4 payload = 1052 bytes)
    pub const DEFAULT_FRAMES_PER_PACKET: u16 = 128;

    /// Ring buffer capacity request in frames (~1 second at 48 kHz;
    /// rounds up to the next power of two internally)
    pub const RING_BUFFER_FRAMES: usize = 48000;

    /// Host IO buffer frame size bounds
    pub const MIN_BUFFER_FRAME_SIZE: u32 = 64;
    pub const MAX_BUFFER_FRAME_SIZE: u32 = 512;

    /// Default host IO buffer frame size
    pub const DEFAULT_BUFFER_FRAME_SIZE: u32 = 256;

    /// Requested socket send buffer size (best-effort)
    pub const SOCKET_SEND_BUFFER_BYTES: usize = 262_144;
}
