//! Per-sample helpers for the slicer: dry/wet mixing, fractional reads and
//! the repeat window envelope.

use super::intrinsics::{saturate16, saturate16_f32};

/// Blend `dry` and `wet` by `wet_percent` (0–100).
///
/// Each weighted term is saturated to `i16` before the sum, and the sum is
/// saturated again.
#[inline(always)]
pub fn mix_dry_wet(dry: i16, wet: i16, wet_percent: u8) -> i16 {
    let wet_percent = wet_percent.min(100) as i32;
    let dry_part = saturate16(dry as i32 * (100 - wet_percent) / 100);
    let wet_part = saturate16(wet as i32 * wet_percent / 100);
    saturate16(dry_part as i32 + wet_part as i32)
}

/// Read one channel of `frames` at fractional position `pos`.
///
/// Positions outside `0..len` read as silence. The sample after the last one
/// is taken to be the last sample itself, so reads near the end never reach
/// past `len`. Integral positions return the stored sample unchanged.
#[inline]
pub fn read_interpolated(frames: &[[i16; 2]], len: usize, pos: f32, channel: usize) -> i16 {
    let len = len.min(frames.len());
    if !(pos >= 0.0) || pos >= len as f32 {
        return 0;
    }
    let index = pos as usize;
    let frac = pos - index as f32;
    let a = frames[index][channel];
    if frac == 0.0 {
        return a;
    }
    let b = if index + 1 < len { frames[index + 1][channel] } else { a };
    saturate16_f32(a as f32 * (1.0 - frac) + b as f32 * frac)
}

/// Trapezoid envelope for offset `pos` within a window of `len` samples.
///
/// Ramps 0→1 over the first `shape × len` samples, holds 1, and ramps back
/// to 0 over the last `shape × len` samples. A shape of 0 (or a fade that
/// rounds down to no samples) yields a constant 1.
#[inline]
pub fn window_envelope(pos: usize, len: usize, shape: f32) -> f32 {
    if shape <= 0.0 || len == 0 {
        return 1.0;
    }
    let fade = ((len as f32 * shape) as usize).min(len);
    if fade == 0 {
        return 1.0;
    }
    let mut gain: f32 = 1.0;
    if pos < fade {
        gain = gain.min(pos as f32 / fade as f32);
    }
    if pos + fade >= len {
        gain = gain.min(len.saturating_sub(pos) as f32 / fade as f32);
    }
    gain
}
