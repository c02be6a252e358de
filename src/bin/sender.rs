//! Audio sender demo
//!
//! Drives the full streaming pipeline the way a capture host would: a paced
//! producer thread stands in for the real-time render callback, synthesizing
//! a stereo test tone and writing it to the session's ring buffer.

use anyhow::Result;
use crossbeam_channel::tick;
use std::thread;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use udp_audio_streamer::{
    config::{AppConfig, StaticDestination},
    session::SessionController,
};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting UDP audio sender");

    // Load config if present, otherwise defaults
    let app_config = AppConfig::load("streamer.toml").unwrap_or_default();

    // Destination from args or config file; absent means drain mode
    let destination = std::env::args()
        .nth(1)
        .or_else(|| app_config.destination_address.clone());

    let source = match &destination {
        Some(address) => {
            tracing::info!("Target receiver: {}:{}", address, app_config.destination_port);
            StaticDestination::new(address.clone())
        }
        None => {
            tracing::warn!("No destination configured - frames will be dropped");
            StaticDestination::none()
        }
    };

    let mut session = SessionController::with_config(app_config.sender_config(), Box::new(source))?;
    let block_frames = session.set_buffer_frame_size(app_config.buffer_frame_size) as usize;
    let sample_rate = session.sample_rate();

    session.start();
    tracing::info!("Session running");

    // Synthetic real-time producer: one IO cycle per block, paced like a
    // render callback at the configured sample rate
    let ring = session.ring().clone();
    thread::Builder::new()
        .name("demo-producer".to_string())
        .spawn(move || {
            let channels = ring.channels();
            let mut samples = vec![0.0f32; block_frames * channels];
            let mut phase = 0.0f32;
            let step = 440.0 * 2.0 * std::f32::consts::PI / sample_rate as f32;
            let period = Duration::from_nanos(
                block_frames as u64 * 1_000_000_000 / sample_rate as u64,
            );

            loop {
                for frame in samples.chunks_mut(channels) {
                    let value = phase.sin() * 0.25;
                    for sample in frame.iter_mut() {
                        *sample = value;
                    }
                    phase += step;
                    if phase > 2.0 * std::f32::consts::PI {
                        phase -= 2.0 * std::f32::consts::PI;
                    }
                }
                ring.write(&samples);
                thread::sleep(period);
            }
        })?;

    // Periodic stats logging
    let ticker = tick(Duration::from_secs(1));
    loop {
        ticker.recv()?;
        let stats = session.stats();
        tracing::info!(
            "Stats: seq {}, {} packets sent, {} packets dropped, {} frames dropped, high water {}",
            stats.sequence,
            stats.packets_sent,
            stats.packets_dropped,
            stats.frames_dropped,
            stats.ring_high_water
        );
    }
}
