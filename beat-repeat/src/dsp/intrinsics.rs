//! ARM DSP instruction wrappers with pure-Rust fallbacks.
//!
//! On `thumbv7em` targets (Cortex-M4/M7 with DSP extension) these compile to
//! single-cycle instructions. Host builds and cores without the DSP extension
//! use the portable bodies.

/// Saturate an `i32` to `i16` range (`-32768..=32767`).
///
/// Maps to ARM `SSAT #16`.
#[inline(always)]
pub fn saturate16(val: i32) -> i16 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: i32;
        unsafe {
            core::arch::asm!(
                "ssat {out}, #16, {val}",
                out = out(reg) out,
                val = in(reg) val,
            );
        }
        out as i16
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        if val > i16::MAX as i32 {
            i16::MAX
        } else if val < i16::MIN as i32 {
            i16::MIN
        } else {
            val as i16
        }
    }
}

/// Saturate a float sample to `i16`, truncating toward zero.
///
/// NaN maps to 0.
#[inline(always)]
pub fn saturate16_f32(val: f32) -> i16 {
    // `as` on floats already saturates at the i32 bounds and maps NaN to 0.
    saturate16(val as i32)
}

/// Pack the low halfword of `hi` into bits 31:16 and the low halfword of `lo`
/// into bits 15:0.
///
/// Maps to ARM `PKHBT`.
#[inline(always)]
pub fn pack_16b_16b(hi: i32, lo: i32) -> u32 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: u32;
        unsafe {
            core::arch::asm!(
                "pkhbt {out}, {lo}, {hi}, lsl #16",
                out = out(reg) out,
                hi = in(reg) hi,
                lo = in(reg) lo,
            );
        }
        out
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        ((hi as u32) << 16) | (lo as u32 & 0x0000_FFFF)
    }
}
