//! Audio receiver demo
//!
//! Binds the streaming port, validates incoming packets, and tracks loss
//! by sequence gap. Packets with a bad magic are discarded, per protocol.

use anyhow::Result;
use std::net::UdpSocket;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use udp_audio_streamer::codec::decode_packet;
use udp_audio_streamer::constants::DEFAULT_UDP_PORT;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_UDP_PORT);

    let socket = UdpSocket::bind(("0.0.0.0", port))?;
    socket.set_read_timeout(Some(Duration::from_millis(200)))?;
    tracing::info!("Listening on port {}", port);

    let mut buf = [0u8; 2048];
    let mut next_sequence: Option<u32> = None;
    let mut packets_received: u64 = 0;
    let mut packets_lost: u64 = 0;
    let mut packets_rejected: u64 = 0;
    let mut bytes_received: u64 = 0;
    let mut last_report = Instant::now();

    loop {
        match socket.recv_from(&mut buf) {
            Ok((len, from)) => match decode_packet(&buf[..len]) {
                Ok(packet) => {
                    packets_received += 1;
                    bytes_received += len as u64;

                    if let Some(expected) = next_sequence {
                        let gap = packet.header.sequence.wrapping_sub(expected);
                        // A huge gap means the sender restarted, not loss
                        if gap > 0 && gap < u32::MAX / 2 {
                            packets_lost += gap as u64;
                        }
                    }
                    next_sequence = Some(packet.header.sequence.wrapping_add(1));
                }
                Err(e) => {
                    packets_rejected += 1;
                    tracing::debug!("discarded packet from {}: {}", from, e);
                }
            },
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => return Err(e.into()),
        }

        if last_report.elapsed() >= Duration::from_secs(1) {
            tracing::info!(
                "Stats: {} received, {} lost, {} rejected, {:.1} KB",
                packets_received,
                packets_lost,
                packets_rejected,
                bytes_received as f64 / 1024.0
            );
            last_report = Instant::now();
        }
    }
}
