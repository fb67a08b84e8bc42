//! Output staging between the producer and an interrupt-driven sink.
//!
//! ## Components
//!
//! | Type | Context | Description |
//! |------|---------|-------------|
//! | [`StreamBuffer`] | producer + ISR | Lock-free SPSC ring of packed stereo frames |
//! | [`AudioOutputStream`] | ISR | Refills the sink's transfer buffer, auto-start |
//! | [`StreamConfig`] | setup | Chunk size, watermark, refill mode |
//!
//! ## Utilities
//!
//! - [`interleave`]: frame packing for I2S words, PWM downmix
//!
//! ## Transfer Buffer Layout
//!
//! The refill ISR works on a transfer buffer of `u32` words:
//! - Each `u32` = one stereo frame (left in lower 16 bits, right in upper 16)
//! - Ping-pong mode splits the buffer into two `chunk_frames` halves
//! - DMA fires a completion interrupt per half
//! - ISR fills the released half while DMA reads the other one

pub mod config;
pub mod interleave;
pub mod output_stream;
pub mod stream_buffer;

pub use config::{ConfigError, RefillMode, StreamConfig};
pub use output_stream::{AudioOutputStream, DmaHalf};
pub use stream_buffer::{BufferLevel, BufferStats, StreamBuffer};
