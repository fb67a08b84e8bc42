//! Stereo frame packing for sink buffers.
//!
//! ## Sink word format
//!
//! Each `u32` handed to an I2S sink contains one stereo frame:
//! - Lower 16 bits (bits 0–15): left channel sample (`i16`)
//! - Upper 16 bits (bits 16–31): right channel sample (`i16`)
//!
//! On little-endian cores this is `[left, right]` as consecutive `i16` values
//! in memory, the same layout as the interleaved PCM the producer delivers.
//!
//! PWM sinks take one unsigned duty value per frame instead: the stereo pair
//! is downmixed to mono and offset into `0..2^bits`.

use crate::dsp::intrinsics::pack_16b_16b;

/// Pack one stereo frame into a sink word: `(right << 16) | left`.
#[inline(always)]
pub fn pack_frame(frame: [i16; 2]) -> u32 {
    pack_16b_16b(frame[1] as i32, frame[0] as i32)
}

/// Split a sink word back into `[left, right]`.
#[inline(always)]
pub fn unpack_frame(word: u32) -> [i16; 2] {
    [word as i16, (word >> 16) as i16]
}

/// Fill a region of a sink buffer with silence (zero for both channels).
pub fn silence(dest: &mut [u32]) {
    dest.fill(0);
}

/// Downmix a stereo frame to an unsigned PWM duty value `bits` wide.
///
/// `bits` is clamped to `1..=16`. Full negative scale maps to 0, silence to
/// [`pwm_silence`].
#[inline]
pub fn pwm_sample(frame: [i16; 2], bits: u32) -> u16 {
    let bits = bits.clamp(1, 16);
    let mono = (frame[0] as i32 + frame[1] as i32) / 2;
    ((mono + 32768) >> (16 - bits)) as u16
}

/// Mid-scale PWM duty value: the level an idle PWM sink should hold.
#[inline]
pub const fn pwm_silence(bits: u32) -> u16 {
    let bits = if bits < 1 {
        1
    } else if bits > 16 {
        16
    } else {
        bits
    };
    1 << (bits - 1)
}
