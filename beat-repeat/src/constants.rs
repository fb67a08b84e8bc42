/// Nominal audio sample rate in Hz (A2DP SBC streams arrive at 44.1 kHz).
pub const AUDIO_SAMPLE_RATE: u32 = 44_100;

/// Samples per stereo frame.
pub const CHANNELS: usize = 2;

/// Default slice capacity in frames: a quarter second at [`AUDIO_SAMPLE_RATE`],
/// the default `slice_length`.
pub const MAX_SLICE_FRAMES: usize = AUDIO_SAMPLE_RATE as usize / 4;

/// Default number of slots in the slice history.
pub const NUM_SLICES: usize = 3;

/// Shortest normal slice, in frames (about 3 ms at 44.1 kHz).
pub const MIN_SLICE_LENGTH: usize = 128;

/// Shortest stutter slice, in frames.
pub const MIN_STUTTER_LENGTH: usize = 64;

/// Largest repeat count per captured slice.
pub const MAX_REPEAT_COUNT: u8 = 16;

/// Pitch multiplier bounds.
pub const MIN_PITCH_SHIFT: f32 = 0.25;
pub const MAX_PITCH_SHIFT: f32 = 4.0;

/// Smallest loop window, as a fraction of the slice, when `loop_size_decay`
/// shrinks the window on successive repeats.
pub const LOOP_DECAY_FLOOR: f32 = 0.1;

/// Depth of the scratch-mode pitch wobble around 1.0.
pub const SCRATCH_DEPTH: f32 = 0.3;

/// Rate of the scratch-mode pitch wobble in Hz.
pub const SCRATCH_RATE_HZ: f32 = 4.0;

/// Default output buffer depth in frames: two seconds of audio.
pub const OUTPUT_BUFFER_FRAMES: usize = AUDIO_SAMPLE_RATE as usize * 2;

/// RAM the default engine and output buffer may occupy together, in bytes.
///
/// Leaves about 40 KB of a 520 KB SRAM part for the radio stack.
pub const AUDIO_RAM_BUDGET: usize = 480 * 1024;

/// Default refill chunk, in frames, requested by the sink per interrupt.
pub const DMA_CHUNK_FRAMES: usize = 512;

/// Seed used by engines built with [`BeatRepeat::new`](crate::effect::BeatRepeat::new).
pub const DEFAULT_RNG_SEED: u32 = 0x2545_F491;
