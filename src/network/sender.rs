//! Paced UDP audio packet sender
//!
//! Owns a dedicated thread that drains the ring buffer, packetizes, and
//! transmits over a non-blocking socket. Backpressure — no destination,
//! full socket buffer, unreachable network — is absorbed by dropping and
//! counting, never by blocking or queueing.

use parking_lot::RwLock;
use socket2::{SockAddr, Socket};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::audio::buffer::SharedRingBuffer;
use crate::codec::PacketEncoder;
use crate::config::SenderConfig;
use crate::error::{ConfigError, NetworkError};
use crate::network::socket::create_send_socket;

/// Sleep while no destination is configured
const NO_DESTINATION_SLEEP: Duration = Duration::from_millis(1);
/// Sleep while fewer than a packet's frames are buffered
const UNDERRUN_SLEEP: Duration = Duration::from_micros(500);
/// Pacing sleep after each iteration, keeps the loop off a full core
const SEND_SLEEP: Duration = Duration::from_micros(100);

/// State shared between the control side and the sender thread
struct SenderShared {
    /// Destination snapshot, swapped whole so the thread never observes a
    /// partially-written address
    destination: RwLock<Option<SocketAddrV4>>,
    has_destination: AtomicBool,
    running: AtomicBool,
    should_stop: AtomicBool,
    sequence: AtomicU32,
    packets_sent: AtomicU64,
    packets_dropped: AtomicU64,
    frames_dropped: AtomicU64,
}

/// Telemetry snapshot.
///
/// Counters are independent atomics; there is no cross-counter
/// transactional guarantee.
#[derive(Debug, Clone)]
pub struct SenderStats {
    pub running: bool,
    pub has_destination: bool,
    pub sequence: u32,
    pub packets_sent: u64,
    pub packets_dropped: u64,
    pub frames_dropped: u64,
    pub ring_high_water: usize,
}

/// UDP audio packet sender
///
/// Holds a shared handle to a ring buffer it does not own; the session
/// controller owning the buffer guarantees it outlives the sender.
pub struct NetworkSender {
    ring: SharedRingBuffer,
    config: SenderConfig,
    shared: Arc<SenderShared>,
    thread: Option<JoinHandle<()>>,
}

impl NetworkSender {
    /// Create a sender draining `ring` with the given configuration.
    pub fn new(ring: SharedRingBuffer, config: SenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        tracing::info!(
            "sender initialized: {} Hz, {} ch, {} frames/packet",
            config.sample_rate,
            config.channels,
            config.frames_per_packet
        );

        Ok(Self {
            ring,
            config,
            shared: Arc::new(SenderShared {
                destination: RwLock::new(None),
                has_destination: AtomicBool::new(false),
                running: AtomicBool::new(false),
                should_stop: AtomicBool::new(false),
                sequence: AtomicU32::new(0),
                packets_sent: AtomicU64::new(0),
                packets_dropped: AtomicU64::new(0),
                frames_dropped: AtomicU64::new(0),
            }),
            thread: None,
        })
    }

    /// Start the sender thread.
    ///
    /// Creates the socket before spawning, so a socket failure reports
    /// without leaving a thread behind. Sequence and statistics reset to
    /// zero on every start.
    pub fn start(&mut self) -> Result<(), NetworkError> {
        if self.shared.running.load(Ordering::Acquire) {
            return Err(NetworkError::AlreadyRunning);
        }

        let socket = create_send_socket()?;

        self.shared.should_stop.store(false, Ordering::Release);
        self.shared.sequence.store(0, Ordering::Relaxed);
        self.shared.packets_sent.store(0, Ordering::Relaxed);
        self.shared.packets_dropped.store(0, Ordering::Relaxed);
        self.shared.frames_dropped.store(0, Ordering::Relaxed);

        let ring = self.ring.clone();
        let config = self.config.clone();
        let shared = self.shared.clone();

        let handle = thread::Builder::new()
            .name("udp-sender".to_string())
            .spawn(move || sender_loop(socket, ring, config, shared))
            .map_err(|e| NetworkError::ThreadSpawn(e.to_string()))?;

        self.thread = Some(handle);
        self.shared.running.store(true, Ordering::Release);

        tracing::info!("sender started");
        Ok(())
    }

    /// Stop the sender thread.
    ///
    /// Idempotent. Joins synchronously — never call from the real-time
    /// path. The socket is closed when the thread exits.
    pub fn stop(&mut self) {
        if !self.shared.running.load(Ordering::Acquire) {
            return;
        }

        self.shared.should_stop.store(true, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
        self.shared.running.store(false, Ordering::Release);

        tracing::info!(
            "sender stopped (sent: {}, dropped: {})",
            self.shared.packets_sent.load(Ordering::Relaxed),
            self.shared.packets_dropped.load(Ordering::Relaxed)
        );
    }

    /// Set or clear the destination address.
    ///
    /// Validates IPv4 syntax; `None`, empty, or malformed input clears the
    /// destination and reports failure. Safe to call while the sender
    /// thread is running — the address is swapped as one snapshot.
    pub fn set_destination(&self, address: Option<&str>) -> Result<(), ConfigError> {
        let trimmed = address.map(str::trim).filter(|s| !s.is_empty());

        let Some(text) = trimmed else {
            *self.shared.destination.write() = None;
            self.shared.has_destination.store(false, Ordering::Release);
            tracing::info!("destination cleared");
            return Err(ConfigError::MissingAddress);
        };

        match text.parse::<Ipv4Addr>() {
            Ok(ip) => {
                let addr = SocketAddrV4::new(ip, self.config.dest_port);
                *self.shared.destination.write() = Some(addr);
                self.shared.has_destination.store(true, Ordering::Release);
                tracing::info!("destination set to {}", addr);
                Ok(())
            }
            Err(_) => {
                *self.shared.destination.write() = None;
                self.shared.has_destination.store(false, Ordering::Release);
                tracing::error!("invalid destination address: {}", text);
                Err(ConfigError::InvalidAddress(text.to_string()))
            }
        }
    }

    /// Replace the configuration.
    ///
    /// Rejected while running: the live loop's packet sizing is derived
    /// from the current configuration.
    pub fn update_config(&mut self, config: SenderConfig) -> Result<(), ConfigError> {
        if self.shared.running.load(Ordering::Acquire) {
            return Err(ConfigError::SenderRunning);
        }
        config.validate()?;

        self.config = config;

        // Keep an already-set destination on the new port
        let mut destination = self.shared.destination.write();
        if let Some(addr) = destination.as_mut() {
            addr.set_port(self.config.dest_port);
        }

        tracing::info!(
            "sender config updated: {} Hz, {} ch",
            self.config.sample_rate,
            self.config.channels
        );
        Ok(())
    }

    /// Check if the sender thread is running
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Check if a valid destination is set
    pub fn has_destination(&self) -> bool {
        self.shared.has_destination.load(Ordering::Acquire)
    }

    /// Current packet sequence number
    pub fn current_sequence(&self) -> u32 {
        self.shared.sequence.load(Ordering::Relaxed)
    }

    /// Current configuration
    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// Peak ring buffer fill level in frames
    pub fn ring_high_water(&self) -> usize {
        self.ring.high_water_mark()
    }

    /// Reset the ring buffer high-water mark
    pub fn reset_ring_high_water(&self) {
        self.ring.reset_high_water_mark();
    }

    /// Telemetry snapshot
    pub fn stats(&self) -> SenderStats {
        SenderStats {
            running: self.is_running(),
            has_destination: self.has_destination(),
            sequence: self.current_sequence(),
            packets_sent: self.shared.packets_sent.load(Ordering::Relaxed),
            packets_dropped: self.shared.packets_dropped.load(Ordering::Relaxed),
            frames_dropped: self.shared.frames_dropped.load(Ordering::Relaxed),
            ring_high_water: self.ring.high_water_mark(),
        }
    }
}

impl Drop for NetworkSender {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sender thread body.
///
/// Cancellation is cooperative: the stop flag is polled once per iteration,
/// so worst-case stop latency is one sleep interval.
fn sender_loop(
    socket: Socket,
    ring: SharedRingBuffer,
    config: SenderConfig,
    shared: Arc<SenderShared>,
) {
    tracing::info!("sender thread started");

    let frames_per_packet = config.frames_per_packet as usize;
    let mut samples = vec![0.0f32; config.samples_per_packet()];
    let mut encoder = PacketEncoder::new(&config);
    let started = Instant::now();

    while !shared.should_stop.load(Ordering::Acquire) {
        if !shared.has_destination.load(Ordering::Acquire) {
            // Nowhere to send: drain everything so frames never go stale
            let available = ring.available_for_read();
            if available > 0 {
                ring.drop_frames(available);
                shared.frames_dropped.fetch_add(available as u64, Ordering::Relaxed);
            }
            thread::sleep(NO_DESTINATION_SLEEP);
            continue;
        }

        // Never send a partial packet; the frames stay buffered until a
        // full packet's worth has arrived
        if ring.available_for_read() < frames_per_packet {
            thread::sleep(UNDERRUN_SLEEP);
            continue;
        }

        let frames = ring.read(&mut samples);
        debug_assert_eq!(frames, frames_per_packet);

        let destination = *shared.destination.read();
        let Some(dest) = destination else {
            // Destination cleared between the check and the read
            shared.frames_dropped.fetch_add(frames as u64, Ordering::Relaxed);
            continue;
        };

        let sequence = shared.sequence.fetch_add(1, Ordering::Relaxed);
        let timestamp_ns = started.elapsed().as_nanos() as u64;

        let packet = match encoder.encode(sequence, timestamp_ns, &samples) {
            Ok(packet) => packet,
            Err(e) => {
                shared.packets_dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("encode failed: {}", e);
                thread::sleep(SEND_SLEEP);
                continue;
            }
        };

        match socket.send_to(packet, &SockAddr::from(dest)) {
            Ok(_) => {
                shared.packets_sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                // Socket buffer full: drop, no retry beyond normal pacing
                shared.packets_dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                shared.packets_dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("send failed: {}", e);
            }
        }

        thread::sleep(SEND_SLEEP);
    }

    tracing::info!("sender thread exiting");
}
