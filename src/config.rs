//! Configuration for the streaming session
//!
//! `SenderConfig` is the validated runtime configuration the sender thread
//! bakes into packet headers. `DestinationSource` abstracts where the
//! destination address comes from — discovery itself (file, IPC, API) is a
//! collaborator concern, not part of the streaming core.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::codec::packet::{packet_size, SampleFormat};
use crate::constants::{
    DEFAULT_BUFFER_FRAME_SIZE, DEFAULT_CHANNELS, DEFAULT_FRAMES_PER_PACKET, DEFAULT_SAMPLE_RATE,
    DEFAULT_UDP_PORT, MAX_PACKET_SIZE, SUPPORTED_SAMPLE_RATES,
};
use crate::error::ConfigError;

/// Runtime configuration for the network sender.
///
/// Mutable only while the sender is stopped; the running loop's packet
/// sizing is derived from these fields.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Sample rate in Hz, member of `SUPPORTED_SAMPLE_RATES`
    pub sample_rate: u32,
    /// Interleaved channels per frame
    pub channels: u16,
    /// Frames carried by one packet
    pub frames_per_packet: u16,
    /// Destination UDP port
    pub dest_port: u16,
    /// Payload sample format
    pub format: SampleFormat,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            frames_per_packet: DEFAULT_FRAMES_PER_PACKET,
            dest_port: DEFAULT_UDP_PORT,
            format: SampleFormat::Float32,
        }
    }
}

impl SenderConfig {
    /// Validate the configuration.
    ///
    /// Oversized packet layouts are rejected here, when the configuration is
    /// set, never at send time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.channels == 0 {
            return Err(ConfigError::InvalidChannelCount(self.channels));
        }
        let bytes = self.packet_bytes();
        if bytes > MAX_PACKET_SIZE {
            return Err(ConfigError::PacketTooLarge {
                bytes,
                max: MAX_PACKET_SIZE,
            });
        }
        Ok(())
    }

    /// Interleaved samples per packet
    pub fn samples_per_packet(&self) -> usize {
        self.frames_per_packet as usize * self.channels as usize
    }

    /// Serialized packet size in bytes
    pub fn packet_bytes(&self) -> usize {
        packet_size(self.frames_per_packet, self.channels, self.format)
    }
}

/// Source of the destination address consulted at session start.
///
/// Implemented by the host's configuration layer; the session only sees
/// this trait.
pub trait DestinationSource: Send {
    /// Current destination IPv4 address, if one is configured
    fn destination(&self) -> Option<String>;
}

/// Fixed destination, for tests and programmatic hosts
pub struct StaticDestination(Option<String>);

impl StaticDestination {
    pub fn new(address: impl Into<String>) -> Self {
        Self(Some(address.into()))
    }

    /// A source that never yields a destination
    pub fn none() -> Self {
        Self(None)
    }
}

impl DestinationSource for StaticDestination {
    fn destination(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads the destination address from the first line of a plain-text file,
/// the hand-off used by the host's companion app.
pub struct FileDestinationSource {
    path: PathBuf,
}

impl FileDestinationSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DestinationSource for FileDestinationSource {
    fn destination(&self) -> Option<String> {
        let contents = fs::read_to_string(&self.path).ok()?;
        let line = contents.lines().next()?.trim();
        if line.is_empty() {
            None
        } else {
            Some(line.to_string())
        }
    }
}

/// On-disk configuration for the demo binaries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Destination IPv4 address; absent means stream with transmission
    /// disabled until one is set
    pub destination_address: Option<String>,
    pub destination_port: u16,
    pub sample_rate: u32,
    /// Host IO buffer size in frames
    pub buffer_frame_size: u32,
    pub frames_per_packet: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            destination_address: None,
            destination_port: DEFAULT_UDP_PORT,
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_frame_size: DEFAULT_BUFFER_FRAME_SIZE,
            frames_per_packet: DEFAULT_FRAMES_PER_PACKET,
        }
    }
}

impl AppConfig {
    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed(e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Derive the sender configuration
    pub fn sender_config(&self) -> SenderConfig {
        SenderConfig {
            sample_rate: self.sample_rate,
            frames_per_packet: self.frames_per_packet,
            dest_port: self.destination_port,
            ..SenderConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.packet_bytes(), 28 + 128 * 2 * 4);
    }

    #[test]
    fn test_unsupported_sample_rate_rejected() {
        let config = SenderConfig {
            sample_rate: 44101,
            ..SenderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSampleRate(44101))
        ));
    }

    #[test]
    fn test_oversized_packet_rejected_at_set_time() {
        // 28 + 200*2*4 = 1628 bytes, over the 1472 wire maximum
        let config = SenderConfig {
            frames_per_packet: 200,
            ..SenderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PacketTooLarge { bytes: 1628, .. })
        ));

        // The same layout fits in int16
        let config = SenderConfig {
            frames_per_packet: 200,
            format: SampleFormat::Int16,
            ..SenderConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_toml_roundtrip() {
        let config = AppConfig {
            destination_address: Some("192.168.1.20".to_string()),
            destination_port: 19620,
            ..AppConfig::default()
        };

        let serialized = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.destination_address.as_deref(), Some("192.168.1.20"));
        assert_eq!(parsed.destination_port, 19620);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: AppConfig = toml::from_str("sample_rate = 44100\n").unwrap();
        assert_eq!(parsed.sample_rate, 44100);
        assert_eq!(parsed.destination_port, DEFAULT_UDP_PORT);
        assert!(parsed.destination_address.is_none());
    }

    #[test]
    fn test_file_destination_source_trims_newline() {
        let path = std::env::temp_dir().join("udp-audio-streamer-dest-test.txt");
        fs::write(&path, "10.0.0.7\n").unwrap();

        let source = FileDestinationSource::new(&path);
        assert_eq!(source.destination().as_deref(), Some("10.0.0.7"));

        fs::write(&path, "\n").unwrap();
        assert_eq!(source.destination(), None);

        let _ = fs::remove_file(&path);

        let missing = FileDestinationSource::new("/nonexistent/dest.txt");
        assert_eq!(missing.destination(), None);
    }
}
