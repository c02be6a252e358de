//! Throughput of the SPSC hand-off, the only hot-path operation pair.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use udp_audio_streamer::audio::buffer::RingBuffer;

fn bench_write_read(c: &mut Criterion) {
    let ring = RingBuffer::new(4096, 2);
    let samples = vec![0.0f32; 256 * 2];
    let mut out = vec![0.0f32; 256 * 2];

    let mut group = c.benchmark_group("ring_buffer");
    group.throughput(Throughput::Elements(256));

    group.bench_function("write_read_256_frames", |b| {
        b.iter(|| {
            ring.write(black_box(&samples));
            ring.read(black_box(&mut out));
        })
    });

    group.finish();
}

criterion_group!(benches, bench_write_read);
criterion_main!(benches);
