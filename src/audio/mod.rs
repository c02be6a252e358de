//! Audio subsystem module

pub mod buffer;

pub use buffer::{create_shared_buffer, RingBuffer, SharedRingBuffer};
