//! Beat-repeat parameter set and its validate-and-clamp rules.
//!
//! A candidate [`EffectParameters`] is never rejected. Every field is checked
//! on its own against the range table below, out-of-range values are pulled to
//! the nearest legal value, and the engine then swaps in the whole set at once.
//! The returned [`ClampReport`] says which fields were adjusted.
//!
//! | field | range |
//! |-------|-------|
//! | `slice_length` | `MIN_SLICE_LENGTH..=MAX_SLICE` frames |
//! | `repeat_count` | `1..=16` |
//! | `wet_mix` | `0..=100` % |
//! | `pitch_shift` | `0.25..=4.0` |
//! | `stutter_slice_length` | `MIN_STUTTER_LENGTH..=MAX_SLICE` frames |
//! | `window_shape`, `loop_start`, `loop_size_decay`, `slice_probability` | `0.0..=1.0` |
//! | `slice_select` | `0..NUM_SLICES` |
//! | `clock_divider` | one of 1, 2, 4, 8 |

use crate::constants::{
    AUDIO_SAMPLE_RATE, MAX_PITCH_SHIFT, MAX_REPEAT_COUNT, MIN_PITCH_SHIFT, MIN_SLICE_LENGTH,
    MIN_STUTTER_LENGTH,
};

/// Trajectory of the playback speed over one repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PitchMode {
    /// Constant `pitch_shift`; direction comes from `reverse`.
    #[default]
    FixedReverse,
    /// Speed falls linearly from 1.0 to 0.5 across the repeat.
    Decreasing,
    /// Speed rises linearly from 0.5 to 1.0 across the repeat.
    Increasing,
    /// Speed wobbles sinusoidally ±0.3 around 1.0.
    Scratch,
}

/// Complete beat-repeat configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParameters {
    /// Normal slice length in frames.
    pub slice_length: usize,
    /// Repeats played per captured slice.
    pub repeat_count: u8,
    /// Dry/wet blend in percent.
    pub wet_mix: u8,
    /// Playback speed multiplier.
    pub pitch_shift: f32,
    /// Read the slice tail to head.
    pub reverse: bool,
    /// Use `stutter_slice_length` instead of `slice_length`.
    pub stutter_enabled: bool,
    pub stutter_slice_length: usize,
    /// Fade length at each end of a repeat, as a fraction of the loop window.
    pub window_shape: f32,
    /// Fractional offset into the slice where the loop window begins.
    pub loop_start: f32,
    /// How far the loop window shrinks by the last repeat.
    pub loop_size_decay: f32,
    /// History slot to play back, 0 being the slice that just completed.
    pub slice_select: usize,
    /// Chance that a completed slice starts repeating.
    pub slice_probability: f32,
    /// Divides the active slice length.
    pub clock_divider: u8,
    pub pitch_mode: PitchMode,
    /// Keep looping instead of finishing the repeat run.
    pub freeze: bool,
    pub enabled: bool,
}

impl EffectParameters {
    /// Defaults for a given sample rate: quarter-second slices (a sixteenth
    /// note at 120 BPM), four repeats, 70 % wet, 10 ms stutter, 5 % fades.
    pub const fn for_sample_rate(sample_rate: u32) -> Self {
        EffectParameters {
            slice_length: (sample_rate / 4) as usize,
            repeat_count: 4,
            wet_mix: 70,
            pitch_shift: 1.0,
            reverse: false,
            stutter_enabled: false,
            stutter_slice_length: (sample_rate / 100) as usize,
            window_shape: 0.05,
            loop_start: 0.0,
            loop_size_decay: 0.0,
            slice_select: 0,
            slice_probability: 1.0,
            clock_divider: 1,
            pitch_mode: PitchMode::FixedReverse,
            freeze: false,
            enabled: true,
        }
    }

    /// Clamp every field into range for an engine holding `max_slice` frames
    /// per slice and `num_slices` history slots.
    ///
    /// Returns the legal parameter set together with the fields that changed.
    pub fn clamped(&self, max_slice: usize, num_slices: usize) -> (Self, ClampReport) {
        let mut report = ClampReport::new();
        let mut out = *self;

        out.slice_length = clamp_usize(
            self.slice_length,
            MIN_SLICE_LENGTH.min(max_slice),
            max_slice,
            ParamField::SliceLength,
            &mut report,
        );
        out.repeat_count = clamp_u8(
            self.repeat_count,
            1,
            MAX_REPEAT_COUNT,
            ParamField::RepeatCount,
            &mut report,
        );
        out.wet_mix = clamp_u8(self.wet_mix, 0, 100, ParamField::WetMix, &mut report);
        out.pitch_shift = clamp_f32(
            self.pitch_shift,
            MIN_PITCH_SHIFT,
            MAX_PITCH_SHIFT,
            ParamField::PitchShift,
            &mut report,
        );
        out.stutter_slice_length = clamp_usize(
            self.stutter_slice_length,
            MIN_STUTTER_LENGTH.min(max_slice),
            max_slice,
            ParamField::StutterSliceLength,
            &mut report,
        );
        out.window_shape = clamp_unit(self.window_shape, ParamField::WindowShape, &mut report);
        out.loop_start = clamp_unit(self.loop_start, ParamField::LoopStart, &mut report);
        out.loop_size_decay =
            clamp_unit(self.loop_size_decay, ParamField::LoopSizeDecay, &mut report);
        out.slice_select = clamp_usize(
            self.slice_select,
            0,
            num_slices.saturating_sub(1),
            ParamField::SliceSelect,
            &mut report,
        );
        out.slice_probability = clamp_unit(
            self.slice_probability,
            ParamField::SliceProbability,
            &mut report,
        );

        out.clock_divider = snap_divider(self.clock_divider);
        if out.clock_divider != self.clock_divider {
            report.insert(ParamField::ClockDivider);
        }

        (out, report)
    }
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self::for_sample_rate(AUDIO_SAMPLE_RATE)
    }
}

/// Largest allowed divider not above `value` (1, 2, 4 or 8).
fn snap_divider(value: u8) -> u8 {
    match value {
        0..=1 => 1,
        2..=3 => 2,
        4..=7 => 4,
        _ => 8,
    }
}

fn clamp_usize(
    value: usize,
    min: usize,
    max: usize,
    field: ParamField,
    report: &mut ClampReport,
) -> usize {
    let clamped = value.max(min).min(max);
    if clamped != value {
        report.insert(field);
    }
    clamped
}

fn clamp_u8(value: u8, min: u8, max: u8, field: ParamField, report: &mut ClampReport) -> u8 {
    let clamped = value.max(min).min(max);
    if clamped != value {
        report.insert(field);
    }
    clamped
}

fn clamp_f32(value: f32, min: f32, max: f32, field: ParamField, report: &mut ClampReport) -> f32 {
    // NaN compares false against everything: send it to the lower bound.
    let clamped = if value.is_nan() {
        min
    } else if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    };
    if clamped.to_bits() != value.to_bits() {
        report.insert(field);
    }
    clamped
}

fn clamp_unit(value: f32, field: ParamField, report: &mut ClampReport) -> f32 {
    clamp_f32(value, 0.0, 1.0, field, report)
}

/// Identifies a clampable field of [`EffectParameters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ParamField {
    SliceLength = 0,
    RepeatCount = 1,
    WetMix = 2,
    PitchShift = 3,
    StutterSliceLength = 4,
    WindowShape = 5,
    LoopStart = 6,
    LoopSizeDecay = 7,
    SliceSelect = 8,
    SliceProbability = 9,
    ClockDivider = 10,
}

impl ParamField {
    pub const ALL: [ParamField; 11] = [
        ParamField::SliceLength,
        ParamField::RepeatCount,
        ParamField::WetMix,
        ParamField::PitchShift,
        ParamField::StutterSliceLength,
        ParamField::WindowShape,
        ParamField::LoopStart,
        ParamField::LoopSizeDecay,
        ParamField::SliceSelect,
        ParamField::SliceProbability,
        ParamField::ClockDivider,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParamField::SliceLength => "slice_length",
            ParamField::RepeatCount => "repeat_count",
            ParamField::WetMix => "wet_mix",
            ParamField::PitchShift => "pitch_shift",
            ParamField::StutterSliceLength => "stutter_slice_length",
            ParamField::WindowShape => "window_shape",
            ParamField::LoopStart => "loop_start",
            ParamField::LoopSizeDecay => "loop_size_decay",
            ParamField::SliceSelect => "slice_select",
            ParamField::SliceProbability => "slice_probability",
            ParamField::ClockDivider => "clock_divider",
        }
    }

    const fn bit(self) -> u16 {
        1 << (self as u8)
    }
}

/// Set of fields that were pulled into range by a parameter update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClampReport {
    mask: u16,
}

impl ClampReport {
    pub const fn new() -> Self {
        ClampReport { mask: 0 }
    }

    pub fn insert(&mut self, field: ParamField) {
        self.mask |= field.bit();
    }

    pub fn contains(&self, field: ParamField) -> bool {
        self.mask & field.bit() != 0
    }

    /// `true` if the candidate was applied unchanged.
    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    pub fn len(&self) -> usize {
        self.mask.count_ones() as usize
    }

    /// Clamped fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = ParamField> + '_ {
        ParamField::ALL.into_iter().filter(|f| self.contains(*f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 1024;
    const SLICES: usize = 4;

    #[test]
    fn defaults_follow_sample_rate() {
        let p = EffectParameters::for_sample_rate(48_000);
        assert_eq!(p.slice_length, 12_000);
        assert_eq!(p.stutter_slice_length, 480);
        assert_eq!(p.repeat_count, 4);
        assert_eq!(p.wet_mix, 70);
        assert_eq!(p.slice_probability, 1.0);
        assert!(p.enabled);
        assert_eq!(EffectParameters::default().slice_length, 11_025);
    }

    #[test]
    fn legal_candidate_is_untouched() {
        let mut p = EffectParameters::default();
        p.slice_length = 512;
        p.stutter_slice_length = 100;
        let (out, report) = p.clamped(MAX, SLICES);
        assert_eq!(out, p);
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
    }

    #[test]
    fn every_field_clamps_high() {
        let p = EffectParameters {
            slice_length: 1_000_000,
            repeat_count: 200,
            wet_mix: 255,
            pitch_shift: 10.0,
            reverse: true,
            stutter_enabled: true,
            stutter_slice_length: usize::MAX,
            window_shape: 2.0,
            loop_start: 1.5,
            loop_size_decay: 9.0,
            slice_select: 17,
            slice_probability: 3.0,
            clock_divider: 200,
            pitch_mode: PitchMode::Scratch,
            freeze: true,
            enabled: false,
        };
        let (out, report) = p.clamped(MAX, SLICES);
        assert_eq!(out.slice_length, MAX);
        assert_eq!(out.repeat_count, 16);
        assert_eq!(out.wet_mix, 100);
        assert_eq!(out.pitch_shift, 4.0);
        assert_eq!(out.stutter_slice_length, MAX);
        assert_eq!(out.window_shape, 1.0);
        assert_eq!(out.loop_start, 1.0);
        assert_eq!(out.loop_size_decay, 1.0);
        assert_eq!(out.slice_select, SLICES - 1);
        assert_eq!(out.slice_probability, 1.0);
        assert_eq!(out.clock_divider, 8);
        // Unranged fields pass through.
        assert!(out.reverse && out.stutter_enabled && out.freeze && !out.enabled);
        assert_eq!(out.pitch_mode, PitchMode::Scratch);
        assert_eq!(report.len(), ParamField::ALL.len());
    }

    #[test]
    fn every_field_clamps_low() {
        let p = EffectParameters {
            slice_length: 0,
            repeat_count: 0,
            pitch_shift: 0.0,
            stutter_slice_length: 1,
            window_shape: -1.0,
            loop_start: -0.1,
            loop_size_decay: -5.0,
            slice_probability: -0.5,
            clock_divider: 0,
            ..EffectParameters::default()
        };
        let (out, report) = p.clamped(MAX, SLICES);
        assert_eq!(out.slice_length, MIN_SLICE_LENGTH);
        assert_eq!(out.repeat_count, 1);
        assert_eq!(out.pitch_shift, 0.25);
        assert_eq!(out.stutter_slice_length, MIN_STUTTER_LENGTH);
        assert_eq!(out.window_shape, 0.0);
        assert_eq!(out.loop_start, 0.0);
        assert_eq!(out.loop_size_decay, 0.0);
        assert_eq!(out.slice_probability, 0.0);
        assert_eq!(out.clock_divider, 1);
        assert!(report.contains(ParamField::SliceLength));
        assert!(report.contains(ParamField::ClockDivider));
        assert!(!report.contains(ParamField::WetMix));
        assert!(!report.contains(ParamField::SliceSelect));
    }

    #[test]
    fn nan_goes_to_lower_bound() {
        let p = EffectParameters {
            pitch_shift: f32::NAN,
            window_shape: f32::NAN,
            ..EffectParameters::default()
        };
        let (out, report) = p.clamped(MAX, SLICES);
        assert_eq!(out.pitch_shift, 0.25);
        assert_eq!(out.window_shape, 0.0);
        assert!(report.contains(ParamField::PitchShift));
        assert!(report.contains(ParamField::WindowShape));
    }

    #[test]
    fn divider_snaps_down_to_power_of_two() {
        let expect = [(0, 1), (1, 1), (2, 2), (3, 2), (4, 4), (6, 4), (8, 8), (9, 8), (255, 8)];
        for (input, snapped) in expect {
            let p = EffectParameters {
                clock_divider: input,
                ..EffectParameters::default()
            };
            let (out, report) = p.clamped(MAX, SLICES);
            assert_eq!(out.clock_divider, snapped, "divider {input}");
            assert_eq!(report.contains(ParamField::ClockDivider), input != snapped);
        }
    }

    #[test]
    fn bounds_respect_tiny_engines() {
        // An engine smaller than the normal minimum still gets a legal length.
        let p = EffectParameters {
            slice_length: 10,
            stutter_slice_length: 10,
            ..EffectParameters::default()
        };
        let (out, _) = p.clamped(32, 1);
        assert_eq!(out.slice_length, 32);
        assert_eq!(out.stutter_slice_length, 32);
        assert_eq!(out.slice_select, 0);
    }

    #[test]
    fn report_iterates_in_field_order() {
        let mut report = ClampReport::new();
        report.insert(ParamField::ClockDivider);
        report.insert(ParamField::WetMix);
        let mut it = report.iter();
        assert_eq!(it.next(), Some(ParamField::WetMix));
        assert_eq!(it.next(), Some(ParamField::ClockDivider));
        assert_eq!(it.next(), None);
        assert_eq!(ParamField::WetMix.name(), "wet_mix");
    }
}
