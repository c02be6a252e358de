//! Streaming session lifecycle
//!
//! Two-state controller coordinating the ring buffer, the network sender,
//! and validated configuration changes. The host architecture expects
//! exactly one session instance, constructed explicitly and injected into
//! the host adapter layer.
//!
//! Only `write_frames` is safe to call from the real-time context; every
//! other operation may block (stop joins the sender thread).

use crate::audio::buffer::{create_shared_buffer, SharedRingBuffer};
use crate::config::{DestinationSource, SenderConfig};
use crate::constants::{
    MAX_BUFFER_FRAME_SIZE, MIN_BUFFER_FRAME_SIZE, RING_BUFFER_FRAMES, SUPPORTED_SAMPLE_RATES,
};
use crate::error::ConfigError;
use crate::network::sender::{NetworkSender, SenderStats};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No sender thread, no socket
    Idle,
    /// Sender thread alive, buffer actively drained
    Running,
}

/// Owner of the streaming pipeline.
///
/// The ring buffer is created once, sized for about one second of audio,
/// and lives for the whole session; it is zeroed only at start boundaries.
/// The sender's thread and socket exist only while Running.
pub struct SessionController {
    state: SessionState,
    sample_rate: u32,
    buffer_frame_size: u32,
    ring: SharedRingBuffer,
    sender: NetworkSender,
    destination_source: Box<dyn DestinationSource>,
}

impl SessionController {
    /// Create a session with the default configuration.
    pub fn new(destination_source: Box<dyn DestinationSource>) -> Result<Self, ConfigError> {
        Self::with_config(SenderConfig::default(), destination_source)
    }

    /// Create a session with an explicit sender configuration.
    pub fn with_config(
        config: SenderConfig,
        destination_source: Box<dyn DestinationSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let ring = create_shared_buffer(RING_BUFFER_FRAMES, config.channels as usize);
        let sample_rate = config.sample_rate;
        let sender = NetworkSender::new(ring.clone(), config)?;

        tracing::info!(
            "session created: ring capacity {} frames",
            ring.capacity()
        );

        Ok(Self {
            state: SessionState::Idle,
            sample_rate,
            buffer_frame_size: crate::constants::DEFAULT_BUFFER_FRAME_SIZE,
            ring,
            sender,
            destination_source,
        })
    }

    /// Start streaming. Idempotent.
    ///
    /// Pulls the destination from the configured source, resets the ring
    /// buffer, and starts the sender. A sender that fails to start leaves
    /// the session Running with transmission disabled — capture correctness
    /// never depends on network availability.
    pub fn start(&mut self) {
        if self.state == SessionState::Running {
            tracing::debug!("session already running");
            return;
        }

        tracing::info!("starting session");

        match self.destination_source.destination() {
            Some(address) => {
                if let Err(e) = self.sender.set_destination(Some(&address)) {
                    tracing::warn!("destination rejected, streaming without one: {}", e);
                }
            }
            None => {
                tracing::info!("no destination configured");
                let _ = self.sender.set_destination(None);
            }
        }

        self.ring.reset();

        if let Err(e) = self.sender.start() {
            tracing::warn!("sender failed to start, capture continues: {}", e);
        }

        self.state = SessionState::Running;
    }

    /// Stop streaming. Idempotent.
    ///
    /// The ring buffer storage stays allocated for reuse.
    pub fn stop(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }

        tracing::info!("stopping session");
        self.sender.stop();
        self.state = SessionState::Idle;
    }

    /// Copy interleaved frames from the real-time producer.
    ///
    /// Wait-free: never allocates, locks, blocks, or fails.
    pub fn write_frames(&self, samples: &[f32]) -> usize {
        self.ring.write(samples)
    }

    /// Set the sample rate.
    ///
    /// Accepted only from the supported set and only while Idle; the prior
    /// value is retained on rejection.
    pub fn set_sample_rate(&mut self, rate: u32) -> Result<(), ConfigError> {
        if !SUPPORTED_SAMPLE_RATES.contains(&rate) {
            return Err(ConfigError::InvalidSampleRate(rate));
        }
        if self.state == SessionState::Running {
            return Err(ConfigError::SenderRunning);
        }

        let mut config = self.sender.config().clone();
        config.sample_rate = rate;
        self.sender.update_config(config)?;
        self.sample_rate = rate;

        tracing::info!("sample rate set to {} Hz", rate);
        Ok(())
    }

    /// Set the host IO buffer frame size, clamped into the valid range.
    ///
    /// Never errors; returns the value actually stored.
    pub fn set_buffer_frame_size(&mut self, frames: u32) -> u32 {
        let clamped = frames.clamp(MIN_BUFFER_FRAME_SIZE, MAX_BUFFER_FRAME_SIZE);
        self.buffer_frame_size = clamped;
        tracing::info!("buffer frame size set to {}", clamped);
        clamped
    }

    /// Push a new destination to the sender, mid-stream or idle.
    pub fn destination_changed(&self, address: Option<&str>) -> Result<(), ConfigError> {
        self.sender.set_destination(address)
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if the session is running
    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Current sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current host IO buffer frame size
    pub fn buffer_frame_size(&self) -> u32 {
        self.buffer_frame_size
    }

    /// Producer-side handle to the ring buffer
    pub fn ring(&self) -> &SharedRingBuffer {
        &self.ring
    }

    /// Telemetry snapshot
    pub fn stats(&self) -> SenderStats {
        self.sender.stats()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}
