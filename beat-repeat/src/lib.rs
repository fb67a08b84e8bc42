//! # beat-repeat
//!
//! A `no_std`, zero-allocation beat-repeat slicer for 16-bit stereo PCM,
//! plus the interrupt-drained output buffer that carries its result to an
//! I2S or PWM sink. Written for small Cortex-M boards that receive audio
//! over Bluetooth and play it out in real time.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Trait | [`node`] | `AudioNode`: in-place interleaved processing |
//! | DSP | [`dsp`] / [`effect`] | Saturating math; slice capture, history, repeat playback (feature-gated) |
//! | I/O | [`io`] | SPSC frame ring, interrupt refill, sink word formats |
//! | Glue | [`pipeline`] | Process a PCM batch and queue it for output |
//!
//! ## Quick start
//!
//! ```ignore
//! use beat_repeat::constants::OUTPUT_BUFFER_FRAMES;
//! use beat_repeat::effect::{DefaultBeatRepeat, EffectParameters};
//! use beat_repeat::io::{AudioOutputStream, DmaHalf, StreamBuffer, StreamConfig};
//! use beat_repeat::pipeline::Pipeline;
//!
//! static BUFFER: StreamBuffer<OUTPUT_BUFFER_FRAMES> = StreamBuffer::new();
//! static mut ENGINE: DefaultBeatRepeat = DefaultBeatRepeat::new();
//!
//! let engine = unsafe { &mut *core::ptr::addr_of_mut!(ENGINE) };
//! engine.init(44_100);
//! engine.set_params(EffectParameters { repeat_count: 8, ..engine.params() });
//!
//! let output = AudioOutputStream::new(&BUFFER, StreamConfig::for_capacity(OUTPUT_BUFFER_FRAMES)?);
//! let mut pipeline = Pipeline::new(engine, &BUFFER);
//!
//! // In the PCM callback:
//! pipeline.push(&mut pcm);
//! output.poll_auto_start();
//!
//! // In the DMA ISR:
//! output.isr(&mut DMA_TX_BUFFER, half);
//!
//! // On disconnect:
//! output.stop();
//! output.clear();
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `effect` | yes | Mixing, interpolation, RNG helpers and the beat-repeat engine |
//!
//! ## Audio parameters
//!
//! - **Sample rate:** 44 100 Hz nominal ([`constants::AUDIO_SAMPLE_RATE`])
//! - **Sample format:** `i16` (signed 16-bit), interleaved stereo
//! - **Slice history:** 3 slots of a quarter second ([`constants::NUM_SLICES`], [`constants::MAX_SLICE_FRAMES`])
//! - **Output buffer:** two seconds ([`constants::OUTPUT_BUFFER_FRAMES`])
//! - **RAM:** engine plus output buffer stay under [`constants::AUDIO_RAM_BUDGET`]

#![no_std]

pub mod constants;
pub mod dsp;
pub mod node;
pub mod io;
pub mod pipeline;

#[cfg(feature = "effect")]
pub mod effect;
