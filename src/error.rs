//! Error types for the audio streaming core
//!
//! Transient network conditions (send-would-block, transmission failures)
//! are deliberately absent: they surface as statistics, never as errors.

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors — rejected synchronously, prior valid state retained
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unsupported sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("Unsupported channel count: {0}")]
    InvalidChannelCount(u16),

    #[error("Invalid destination address: {0}")]
    InvalidAddress(String),

    #[error("No destination address")]
    MissingAddress,

    #[error("Packet of {bytes} bytes exceeds maximum of {max}")]
    PacketTooLarge { bytes: usize, max: usize },

    #[error("Configuration cannot change while the sender is running")]
    SenderRunning,

    #[error("Failed to read configuration: {0}")]
    ReadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Bad packet magic: {0:#010x}")]
    BadMagic(u32),

    #[error("Truncated packet: {0} bytes")]
    Truncated(usize),

    #[error("Unknown sample format tag: {0}")]
    UnknownFormat(u16),

    #[error("Payload length {actual} does not match header ({expected})")]
    PayloadMismatch { expected: usize, actual: usize },
}

/// Network errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Socket creation failed: {0}")]
    SocketCreate(String),

    #[error("Sender is already running")]
    AlreadyRunning,

    #[error("Failed to spawn sender thread: {0}")]
    ThreadSpawn(String),
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;
