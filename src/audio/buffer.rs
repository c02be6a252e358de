//! Lock-free ring buffer for audio samples
//!
//! Single-producer single-consumer (SPSC) ring buffer of interleaved
//! multi-channel frames, safe to write from a real-time render callback:
//! no allocation after construction, no locks, no syscalls.
//!
//! Overwrite policy: the writer NEVER blocks. If the consumer falls behind,
//! the oldest unread frames are silently overwritten.

use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Lock-free SPSC ring buffer of interleaved audio frames
///
/// Capacity is rounded up to the next power of two so index arithmetic is
/// a masked add. The writer publishes its index with release ordering after
/// copying samples; the reader acquires it before computing availability,
/// which is the only synchronization between the two threads.
///
/// The concurrency contract is exactly one producer thread and one consumer
/// thread. `reset` is additionally restricted to start/stop boundaries when
/// neither side is active.
pub struct RingBuffer {
    /// Interleaved sample storage, allocated once
    storage: Box<[UnsafeCell<f32>]>,
    /// Frame capacity (power of two)
    frame_capacity: usize,
    /// Mask for index arithmetic
    mask: usize,
    /// Interleaved channels per frame
    channels: usize,
    /// Producer index, in frames (keep the indices on separate cache lines)
    write_index: CachePadded<AtomicUsize>,
    /// Consumer index, in frames
    read_index: CachePadded<AtomicUsize>,
    /// Peak observed fill level since the last reset
    high_water_mark: AtomicUsize,
}

// Safety: the storage is only touched through the SPSC protocol above —
// the single producer writes slots it owns before the release-store of
// `write_index`, and the single consumer reads slots only after the
// matching acquire-load.
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Create a ring buffer holding `frame_capacity` frames of `channels`
    /// interleaved samples. Capacity is rounded up to the next power of two.
    pub fn new(frame_capacity: usize, channels: usize) -> Self {
        assert!(channels > 0, "channel count must be non-zero");
        assert!(frame_capacity > 1, "frame capacity must exceed one frame");

        let frame_capacity = frame_capacity.next_power_of_two();
        let sample_capacity = frame_capacity * channels;

        let storage = (0..sample_capacity)
            .map(|_| UnsafeCell::new(0.0f32))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            storage,
            frame_capacity,
            mask: frame_capacity - 1,
            channels,
            write_index: CachePadded::new(AtomicUsize::new(0)),
            read_index: CachePadded::new(AtomicUsize::new(0)),
            high_water_mark: AtomicUsize::new(0),
        }
    }

    /// Write interleaved frames from the producer thread.
    ///
    /// `samples.len()` must be a multiple of the channel count; any trailing
    /// partial frame is ignored. Always succeeds without blocking and may
    /// overwrite unread frames if the consumer has fallen behind. A single
    /// write larger than the buffer keeps only the newest `capacity - 1`
    /// frames (advancing the index a full turn would make the data
    /// unobservable).
    ///
    /// Returns the number of frames copied into the buffer.
    pub fn write(&self, samples: &[f32]) -> usize {
        let total_frames = samples.len() / self.channels;
        let frames = total_frames.min(self.frame_capacity - 1);
        let src = &samples[(total_frames - frames) * self.channels..];

        let write_idx = self.write_index.load(Ordering::Relaxed);

        for i in 0..frames {
            let slot = ((write_idx + i) & self.mask) * self.channels;
            for ch in 0..self.channels {
                // Safety: producer-owned slots, published by the store below
                unsafe {
                    *self.storage[slot + ch].get() = src[i * self.channels + ch];
                }
            }
        }

        self.write_index
            .store((write_idx + frames) & self.mask, Ordering::Release);

        frames
    }

    /// Read interleaved frames from the consumer thread.
    ///
    /// Fills `out` with up to `out.len() / channels` frames and returns the
    /// number of frames actually read, which is bounded by what the producer
    /// has published.
    pub fn read(&self, out: &mut [f32]) -> usize {
        let max_frames = out.len() / self.channels;

        let write_idx = self.write_index.load(Ordering::Acquire);
        let read_idx = self.read_index.load(Ordering::Relaxed);

        let available = write_idx.wrapping_sub(read_idx) & self.mask;
        let to_read = max_frames.min(available);
        if to_read == 0 {
            return 0;
        }

        for i in 0..to_read {
            let slot = ((read_idx + i) & self.mask) * self.channels;
            for ch in 0..self.channels {
                // Safety: slots at or past `read_idx` were published by the
                // acquire-load of `write_index` above
                out[i * self.channels + ch] = unsafe { *self.storage[slot + ch].get() };
            }
        }

        self.read_index
            .store((read_idx + to_read) & self.mask, Ordering::Release);

        to_read
    }

    /// Number of frames available for reading.
    ///
    /// Also raises the high-water mark statistic when the current fill level
    /// exceeds the recorded peak.
    pub fn available_for_read(&self) -> usize {
        let write_idx = self.write_index.load(Ordering::Acquire);
        let read_idx = self.read_index.load(Ordering::Relaxed);
        let available = write_idx.wrapping_sub(read_idx) & self.mask;

        // Raise-only CAS; relaxed is fine, this is just stats
        let mut current = self.high_water_mark.load(Ordering::Relaxed);
        while available > current {
            match self.high_water_mark.compare_exchange_weak(
                current,
                available,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }

        available
    }

    /// Number of frames writable before overwriting unread data.
    ///
    /// One slot is reserved by convention, so this is a statistic rather
    /// than a limit `write` enforces.
    pub fn available_for_write(&self) -> usize {
        self.frame_capacity - self.available_for_read() - 1
    }

    /// Advance the read index by `frames` without copying, discarding
    /// backlog when there is nowhere to send it.
    pub fn drop_frames(&self, frames: usize) {
        let read_idx = self.read_index.load(Ordering::Relaxed);
        self.read_index
            .store((read_idx + frames) & self.mask, Ordering::Release);
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.available_for_read() == 0
    }

    /// Total frame capacity (power of two)
    pub fn capacity(&self) -> usize {
        self.frame_capacity
    }

    /// Interleaved channels per frame
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Peak buffer fill level in frames since the last reset
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark.load(Ordering::Relaxed)
    }

    /// Reset the high-water mark (call periodically for a per-window peak)
    pub fn reset_high_water_mark(&self) {
        self.high_water_mark.store(0, Ordering::Relaxed);
    }

    /// Zero the storage and reset both indices and the high-water mark.
    ///
    /// Precondition: no concurrent writer or reader is active. Only call at
    /// start/stop boundaries.
    pub fn reset(&self) {
        for cell in self.storage.iter() {
            // Safety: precondition above — no concurrent access
            unsafe {
                *cell.get() = 0.0;
            }
        }
        self.write_index.store(0, Ordering::Relaxed);
        self.read_index.store(0, Ordering::Relaxed);
        self.high_water_mark.store(0, Ordering::Relaxed);
    }
}

/// Thread-safe handle to a ring buffer
pub type SharedRingBuffer = Arc<RingBuffer>;

/// Create a new shared ring buffer
pub fn create_shared_buffer(frame_capacity: usize, channels: usize) -> SharedRingBuffer {
    Arc::new(RingBuffer::new(frame_capacity, channels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Interleaved stereo frames numbered `start..start + count`,
    /// right channel offset by 0.5
    fn stereo_frames(start: usize, count: usize) -> Vec<f32> {
        let mut samples = Vec::with_capacity(count * 2);
        for n in start..start + count {
            samples.push(n as f32);
            samples.push(n as f32 + 0.5);
        }
        samples
    }

    fn assert_stereo_frames(samples: &[f32], start: usize) {
        for (i, pair) in samples.chunks(2).enumerate() {
            assert_eq!(pair[0], (start + i) as f32, "left sample {}", i);
            assert_eq!(pair[1], (start + i) as f32 + 0.5, "right sample {}", i);
        }
    }

    #[test]
    fn test_write_then_read_in_order() {
        let buffer = RingBuffer::new(16, 2);

        assert_eq!(buffer.write(&stereo_frames(0, 6)), 6);
        assert_eq!(buffer.available_for_read(), 6);

        let mut out = vec![0.0; 6 * 2];
        assert_eq!(buffer.read(&mut out), 6);
        assert_stereo_frames(&out, 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_wraparound_preserves_order() {
        let buffer = RingBuffer::new(8, 2);

        buffer.write(&stereo_frames(0, 6));
        let mut out = vec![0.0; 4 * 2];
        assert_eq!(buffer.read(&mut out), 4);
        assert_stereo_frames(&out, 0);

        // 2 unread + 5 new = 7 = capacity - 1, write index wraps past zero
        buffer.write(&stereo_frames(6, 5));
        assert_eq!(buffer.available_for_read(), 7);

        let mut out = vec![0.0; 8 * 2];
        assert_eq!(buffer.read(&mut out), 7);
        assert_stereo_frames(&out[..7 * 2], 4);
    }

    #[test]
    fn test_capacity_rounds_to_power_of_two() {
        let buffer = RingBuffer::new(48000, 2);
        assert_eq!(buffer.capacity(), 65536);
        assert_eq!(buffer.available_for_write(), 65535);
        assert_eq!(buffer.available_for_read(), 0);
    }

    #[test]
    fn test_oversized_write_keeps_newest() {
        let buffer = RingBuffer::new(8, 1);

        let samples: Vec<f32> = (0..20).map(|n| n as f32).collect();
        assert_eq!(buffer.write(&samples), 7);
        assert_eq!(buffer.available_for_read(), 7);

        let mut out = vec![0.0; 8];
        assert_eq!(buffer.read(&mut out), 7);
        let expected: Vec<f32> = (13..20).map(|n| n as f32).collect();
        assert_eq!(&out[..7], expected.as_slice());
    }

    #[test]
    fn test_drop_frames_discards_oldest() {
        let buffer = RingBuffer::new(16, 2);

        buffer.write(&stereo_frames(0, 10));
        buffer.drop_frames(4);
        assert_eq!(buffer.available_for_read(), 6);

        let mut out = vec![0.0; 6 * 2];
        assert_eq!(buffer.read(&mut out), 6);
        assert_stereo_frames(&out, 4);
    }

    #[test]
    fn test_reset_clears_state() {
        let buffer = RingBuffer::new(16, 2);

        buffer.write(&stereo_frames(0, 10));
        buffer.available_for_read();
        assert_eq!(buffer.high_water_mark(), 10);

        buffer.reset();
        assert_eq!(buffer.available_for_read(), 0);
        assert_eq!(buffer.high_water_mark(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_high_water_mark_only_rises() {
        let buffer = RingBuffer::new(16, 1);

        buffer.write(&[0.0; 5]);
        assert_eq!(buffer.available_for_read(), 5);
        assert_eq!(buffer.high_water_mark(), 5);

        let mut out = vec![0.0; 5];
        buffer.read(&mut out);
        buffer.write(&[0.0; 3]);
        assert_eq!(buffer.available_for_read(), 3);
        assert_eq!(buffer.high_water_mark(), 5);

        buffer.reset_high_water_mark();
        assert_eq!(buffer.high_water_mark(), 0);
    }

    #[test]
    fn test_concurrent_producer_consumer() {
        const TOTAL_FRAMES: usize = 100_000;
        const CHUNK: usize = 128;

        let buffer = RingBuffer::new(1024, 1);

        std::thread::scope(|s| {
            s.spawn(|| {
                let mut next = 0usize;
                while next < TOTAL_FRAMES {
                    if buffer.available_for_write() < CHUNK {
                        std::hint::spin_loop();
                        continue;
                    }
                    let count = CHUNK.min(TOTAL_FRAMES - next);
                    let chunk: Vec<f32> = (next..next + count).map(|n| n as f32).collect();
                    buffer.write(&chunk);
                    next += count;
                }
            });

            s.spawn(|| {
                let mut out = vec![0.0f32; CHUNK];
                let mut expected = 0usize;
                while expected < TOTAL_FRAMES {
                    let frames = buffer.read(&mut out);
                    if frames == 0 {
                        std::hint::spin_loop();
                        continue;
                    }
                    for &sample in &out[..frames] {
                        assert_eq!(sample, expected as f32);
                        expected += 1;
                    }
                }
            });
        });
    }

    proptest! {
        /// Any chunking of writes totaling at most capacity - 1 frames is
        /// read back in order, across wraparound.
        #[test]
        fn prop_chunked_writes_read_in_order(
            chunks in proptest::collection::vec(1usize..=31, 0..8),
            read_request in 0usize..300,
        ) {
            let buffer = RingBuffer::new(256, 1);

            // Pre-wind the indices so wraparound is exercised
            let prewind: Vec<f32> = vec![0.0; 200];
            buffer.write(&prewind);
            buffer.drop_frames(200);

            let mut written = 0usize;
            for chunk in &chunks {
                let samples: Vec<f32> =
                    (written..written + chunk).map(|n| n as f32).collect();
                buffer.write(&samples);
                written += chunk;
            }
            prop_assert!(written <= buffer.capacity() - 1);
            prop_assert_eq!(buffer.available_for_read(), written);

            let mut out = vec![0.0f32; read_request];
            let frames = buffer.read(&mut out);
            prop_assert_eq!(frames, read_request.min(written));
            for (i, &sample) in out[..frames].iter().enumerate() {
                prop_assert_eq!(sample, i as f32);
            }
        }
    }
}
