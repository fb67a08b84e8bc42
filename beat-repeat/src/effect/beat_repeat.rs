//! Beat-repeat slicer.
//!
//! Live input is recorded continuously into a [`SliceHistory`]. Each time the
//! active slice length fills up, the slice is committed and, if the engine is
//! idle, not frozen and the probability gate passes, the selected slice is
//! latched and replayed `repeat_count` times over the live signal.
//!
//! ```text
//!            ┌──────────── capture (always) ─────────────┐
//! input ──┬──┤ SliceHistory: record → commit → trigger?  │
//!         │  └──────────────────────┬────────────────────┘
//!         │                         │ latched slot
//!         │      ┌──────────────────▼───────────────────┐
//!         │      │ loop window → pitch → read (lerp)    │
//!         │      │ → window envelope                    │
//!         │      └──────────────────┬───────────────────┘
//!         └─────────── dry ───► mix(dry, wet) ──► output
//! ```
//!
//! Output for a frame is rendered before that frame is captured, so playback
//! of a slice starts on the frame after the one that completed it.
//!
//! Malformed calls (engine not initialized, channel count other than 2, a
//! buffer that is not whole frames) leave both the data and the engine state
//! untouched.

use core::f32::consts::TAU;

use crate::constants::{
    CHANNELS, DEFAULT_RNG_SEED, LOOP_DECAY_FLOOR, MAX_SLICE_FRAMES, NUM_SLICES, SCRATCH_DEPTH,
    SCRATCH_RATE_HZ,
};
use crate::dsp::helpers::{mix_dry_wet, read_interpolated, window_envelope};
use crate::dsp::intrinsics::saturate16_f32;
use crate::dsp::rng::{RandomSource, XorShift32};
use crate::node::AudioNode;

use super::params::{ClampReport, EffectParameters, PitchMode};
use super::slice::SliceHistory;

/// Engine sized with the default quarter-second slices and three history slots.
///
/// At roughly 130 KB this belongs in a `static`, not on the stack.
pub type DefaultBeatRepeat = BeatRepeat<MAX_SLICE_FRAMES, NUM_SLICES>;

/// Mutable per-sample state of the slicer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineState {
    /// Next frame index to record in the recording slot.
    pub write_cursor: usize,
    /// Fractional offset into the current loop window.
    pub read_position: f32,
    /// Completed repeats of the latched slice.
    pub repeat_counter: u32,
    pub is_repeating: bool,
    /// Scratch-mode oscillator phase in radians.
    pub pitch_modulation_phase: f32,
    /// History slot being replayed.
    pub source_slot: Option<usize>,
    /// Slices completed since init or reset.
    pub slices_captured: u32,
    /// Slices that started a repeat run.
    pub slices_triggered: u32,
}

impl EngineState {
    pub const fn new() -> Self {
        EngineState {
            write_cursor: 0,
            read_position: 0.0,
            repeat_counter: 0,
            is_repeating: false,
            pitch_modulation_phase: 0.0,
            source_slot: None,
            slices_captured: 0,
            slices_triggered: 0,
        }
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Sub-range of a slice that a repeat actually plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LoopWindow {
    start: usize,
    len: usize,
}

/// Beat-repeat effect over `N`-frame slices with `S` history slots.
///
/// The random source `R` decides the `slice_probability` gate; inject a fixed
/// source with [`with_rng`](Self::with_rng) for reproducible triggering.
pub struct BeatRepeat<const N: usize, const S: usize, R = XorShift32> {
    params: EffectParameters,
    history: SliceHistory<N, S>,
    state: EngineState,
    rng: R,
    sample_rate: u32,
    initialized: bool,
}

impl<const N: usize, const S: usize> BeatRepeat<N, S, XorShift32> {
    /// Create an uninitialized engine seeded with [`DEFAULT_RNG_SEED`].
    pub const fn new() -> Self {
        Self::with_rng(XorShift32::new(DEFAULT_RNG_SEED))
    }
}

impl<const N: usize, const S: usize, R: RandomSource> BeatRepeat<N, S, R> {
    /// Create an uninitialized engine using `rng` for the probability gate.
    ///
    /// [`process`](Self::process) is a no-op until [`init`](Self::init).
    pub const fn with_rng(rng: R) -> Self {
        assert!(N >= 1, "slices must hold at least one frame");

        BeatRepeat {
            params: EffectParameters::for_sample_rate(crate::constants::AUDIO_SAMPLE_RATE),
            history: SliceHistory::new(),
            state: EngineState::new(),
            rng,
            sample_rate: crate::constants::AUDIO_SAMPLE_RATE,
            initialized: false,
        }
    }

    /// Prepare the engine for `sample_rate`: load the defaults for that rate,
    /// clear all slices and state.
    ///
    /// Returns `false` (and stays uninitialized) for a zero sample rate.
    pub fn init(&mut self, sample_rate: u32) -> bool {
        if sample_rate == 0 {
            log::warn!("beat-repeat: refusing to init at 0 Hz");
            return false;
        }
        self.sample_rate = sample_rate;
        let (params, _) = EffectParameters::for_sample_rate(sample_rate).clamped(N, S);
        self.params = params;
        self.clear_state();
        self.initialized = true;

        log::info!(
            "beat-repeat: {} Hz, slice {} frames, {} repeats, wet {}%, {} slots of {} frames",
            sample_rate,
            params.slice_length,
            params.repeat_count,
            params.wet_mix,
            S,
            N
        );
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Validate `candidate`, clamp whatever is out of range, and replace the
    /// active parameters as a whole. Never fails.
    pub fn set_params(&mut self, candidate: EffectParameters) -> ClampReport {
        let (params, report) = candidate.clamped(N, S);
        for field in report.iter() {
            log::warn!("beat-repeat: {} out of range, clamped", field.name());
        }
        self.params = params;
        log::debug!(
            "beat-repeat: params slice={} repeat={} wet={}% pitch={} reverse={} stutter={} enabled={}",
            params.slice_length,
            params.repeat_count,
            params.wet_mix,
            params.pitch_shift,
            params.reverse,
            params.stutter_enabled,
            params.enabled
        );
        report
    }

    /// Copy of the active parameters.
    pub fn params(&self) -> EffectParameters {
        self.params
    }

    /// Copy of the per-sample state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_repeating(&self) -> bool {
        self.state.is_repeating
    }

    pub fn repeat_counter(&self) -> u32 {
        self.state.repeat_counter
    }

    pub fn history(&self) -> &SliceHistory<N, S> {
        &self.history
    }

    /// Clear every slice and return to idle. Parameters are kept.
    pub fn reset(&mut self) {
        self.clear_state();
        log::info!("beat-repeat: reset");
    }

    /// Slice length after stutter override and clock division.
    pub fn active_slice_length(&self) -> usize {
        let base = if self.params.stutter_enabled {
            self.params.stutter_slice_length
        } else {
            self.params.slice_length
        };
        (base / self.params.clock_divider.max(1) as usize).clamp(1, N)
    }

    /// Process interleaved stereo audio in place.
    ///
    /// `channels` must be 2 and `data` must hold whole frames; anything else
    /// is ignored. With the effect disabled the data passes through untouched.
    pub fn process(&mut self, data: &mut [i16], channels: usize) {
        if !self.initialized
            || channels != CHANNELS
            || data.is_empty()
            || data.len() % CHANNELS != 0
        {
            return;
        }
        if !self.params.enabled {
            return;
        }
        for frame in data.chunks_exact_mut(CHANNELS) {
            let out = self.run_frame([frame[0], frame[1]]);
            frame[0] = out[0];
            frame[1] = out[1];
        }
    }

    /// Process a single stereo frame.
    pub fn process_frame(&mut self, input: [i16; 2]) -> [i16; 2] {
        if !self.initialized || !self.params.enabled {
            return input;
        }
        self.run_frame(input)
    }

    #[inline]
    fn run_frame(&mut self, input: [i16; 2]) -> [i16; 2] {
        let output = if self.state.is_repeating {
            self.render(input)
        } else {
            input
        };
        self.capture(input);
        output
    }

    /// Record `input` and handle slice completion.
    fn capture(&mut self, input: [i16; 2]) {
        let active = self.active_slice_length();
        self.history.record(self.state.write_cursor, input);
        self.state.write_cursor += 1;

        if self.state.write_cursor >= active {
            self.state.write_cursor = 0;
            self.history.commit(active);
            self.state.slices_captured = self.state.slices_captured.wrapping_add(1);
            self.try_trigger();
            self.history.begin_next();
        }
    }

    /// Idle → Repeating on a freshly completed slice.
    fn try_trigger(&mut self) {
        if self.state.is_repeating || self.params.freeze || !self.probability_gate() {
            return;
        }
        // Selecting past the filled history falls back to the oldest slice.
        let committed = self.history.committed();
        let back = self.params.slice_select.min(committed.saturating_sub(1));
        let Some(slot) = self.history.select(back) else {
            return;
        };

        self.history.hold(Some(slot));
        self.state.source_slot = Some(slot);
        self.state.is_repeating = true;
        self.state.read_position = 0.0;
        self.state.repeat_counter = 0;
        self.state.pitch_modulation_phase = 0.0;
        self.state.slices_triggered = self.state.slices_triggered.wrapping_add(1);
    }

    fn probability_gate(&mut self) -> bool {
        let p = self.params.slice_probability;
        if p >= 1.0 {
            true
        } else if p <= 0.0 {
            false
        } else {
            self.rng.next_unit() < p
        }
    }

    /// Produce one output frame from the latched slice.
    fn render(&mut self, dry: [i16; 2]) -> [i16; 2] {
        let Some(slot) = self.state.source_slot else {
            self.finish();
            return dry;
        };
        let params = self.params;
        let len = self.history.slot(slot).len();
        let window = self.loop_window(len);

        let offset = self.state.read_position;
        let speed = self.pitch_multiplier(offset / window.len as f32);

        let position = if params.reverse {
            (window.start + window.len - 1) as f32 - offset
        } else {
            window.start as f32 + offset
        };
        let frames = self.history.slot(slot).frames();
        let mut wet = [
            read_interpolated(frames, len, position, 0),
            read_interpolated(frames, len, position, 1),
        ];

        let gain = window_envelope(offset as usize, window.len, params.window_shape);
        if gain < 1.0 {
            wet = wet.map(|s| saturate16_f32(s as f32 * gain));
        }

        let out = [
            mix_dry_wet(dry[0], wet[0], params.wet_mix),
            mix_dry_wet(dry[1], wet[1], params.wet_mix),
        ];
        self.advance(speed, window.len);
        out
    }

    /// Loop window for a slice of `len` frames at the current repeat.
    fn loop_window(&self, len: usize) -> LoopWindow {
        if len == 0 {
            return LoopWindow { start: 0, len: 1 };
        }
        let start = ((len as f32 * self.params.loop_start) as usize).min(len - 1);
        let full = len - start;

        let mut size = full;
        if self.params.loop_size_decay > 0.0 {
            let progress =
                self.state.repeat_counter as f32 / self.params.repeat_count.max(1) as f32;
            let shrunk = (full as f32 * (1.0 - self.params.loop_size_decay * progress)) as usize;
            let floor = ((full as f32 * LOOP_DECAY_FLOOR) as usize).max(1);
            size = shrunk.max(floor).min(full);
        }
        LoopWindow { start, len: size }
    }

    /// Playback speed at `progress` (0..1) through the current repeat.
    fn pitch_multiplier(&mut self, progress: f32) -> f32 {
        let progress = progress.clamp(0.0, 1.0);
        match self.params.pitch_mode {
            PitchMode::FixedReverse => self.params.pitch_shift,
            PitchMode::Decreasing => 1.0 - 0.5 * progress,
            PitchMode::Increasing => 0.5 + 0.5 * progress,
            PitchMode::Scratch => {
                let speed = 1.0 + SCRATCH_DEPTH * libm::sinf(self.state.pitch_modulation_phase);
                let step = TAU * SCRATCH_RATE_HZ / self.sample_rate as f32;
                let mut phase = self.state.pitch_modulation_phase + step;
                if phase >= TAU {
                    phase -= TAU;
                }
                self.state.pitch_modulation_phase = phase;
                speed
            }
        }
    }

    /// Step the read head and handle the end of a repeat.
    fn advance(&mut self, speed: f32, window_len: usize) {
        self.state.read_position += speed;
        if self.state.read_position < window_len as f32 {
            return;
        }
        self.state.read_position = 0.0;
        if self.params.freeze {
            return;
        }
        self.state.repeat_counter += 1;
        if self.state.repeat_counter >= self.params.repeat_count as u32 {
            self.finish();
        }
    }

    /// Repeating → Idle.
    fn finish(&mut self) {
        self.state.is_repeating = false;
        self.state.repeat_counter = 0;
        self.state.read_position = 0.0;
        self.state.source_slot = None;
        self.history.hold(None);
    }

    fn clear_state(&mut self) {
        self.history.clear();
        self.state = EngineState::new();
    }
}

impl<const N: usize, const S: usize, R: RandomSource> AudioNode for BeatRepeat<N, S, R> {
    const NUM_CHANNELS: usize = CHANNELS;

    fn update(&mut self, data: &mut [i16]) {
        self.process(data, CHANNELS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 512;
    const SLOTS: usize = 4;
    const SR: u32 = 44_100;

    type Engine = BeatRepeat<MAX, SLOTS>;

    /// Random source replaying a fixed cycle of unit values.
    struct Sequence {
        values: &'static [u32],
        next: usize,
    }

    impl RandomSource for Sequence {
        fn next_u32(&mut self) -> u32 {
            let v = self.values[self.next % self.values.len()];
            self.next += 1;
            v
        }
    }

    fn engine_with(params: EffectParameters) -> Engine {
        let mut engine = Engine::new();
        assert!(engine.init(SR));
        let report = engine.set_params(params);
        assert!(report.is_empty(), "test params clamped: {report:?}");
        engine
    }

    /// Straight replay: no pitch change, no window, full wet.
    fn replay_params(slice_length: usize, repeat_count: u8) -> EffectParameters {
        EffectParameters {
            slice_length,
            repeat_count,
            wet_mix: 100,
            pitch_shift: 1.0,
            reverse: false,
            window_shape: 0.0,
            ..EffectParameters::default()
        }
    }

    fn ramp_frame(i: usize) -> [i16; 2] {
        let v = (i as i16 + 1) * 10;
        [v, -v]
    }

    fn run(engine: &mut Engine, input: &[[i16; 2]]) -> [[i16; 2]; 2048] {
        let mut out = [[0i16; 2]; 2048];
        for (i, frame) in input.iter().enumerate() {
            out[i] = engine.process_frame(*frame);
        }
        out
    }

    #[test]
    fn uninitialized_engine_is_a_no_op() {
        let mut engine = Engine::new();
        let mut data = [1i16, 2, 3, 4];
        engine.process(&mut data, 2);
        assert_eq!(data, [1, 2, 3, 4]);
        assert_eq!(engine.process_frame([5, 6]), [5, 6]);
        assert_eq!(engine.state(), EngineState::new());
    }

    #[test]
    fn init_rejects_zero_rate() {
        let mut engine = Engine::new();
        assert!(!engine.init(0));
        assert!(!engine.is_initialized());
        assert!(engine.init(48_000));
        assert_eq!(engine.sample_rate(), 48_000);
        // Quarter second does not fit a 512-frame engine: clamped to capacity.
        assert_eq!(engine.params().slice_length, MAX);
    }

    #[test]
    fn malformed_calls_leave_state_alone() {
        let mut engine = engine_with(replay_params(128, 2));
        let mut mono = [100i16; 8];
        engine.process(&mut mono, 1);
        assert_eq!(mono, [100; 8]);

        let mut odd = [7i16; 5];
        engine.process(&mut odd, 2);
        assert_eq!(odd, [7; 5]);

        let mut empty: [i16; 0] = [];
        engine.process(&mut empty, 2);
        assert_eq!(engine.state(), EngineState::new());
    }

    #[test]
    fn disabled_engine_is_identity() {
        let mut engine = engine_with(EffectParameters {
            enabled: false,
            ..replay_params(128, 4)
        });
        let mut data = [0i16; 2 * 600];
        for (i, s) in data.iter_mut().enumerate() {
            *s = (i as i16).wrapping_mul(37);
        }
        let original = data;
        engine.process(&mut data, 2);
        assert_eq!(data, original);
        assert_eq!(engine.state().slices_captured, 0);
    }

    #[test]
    fn get_params_returns_clamped_copy() {
        let mut engine = Engine::new();
        engine.init(SR);
        let report = engine.set_params(EffectParameters {
            repeat_count: 99,
            wet_mix: 150,
            ..EffectParameters::default()
        });
        assert_eq!(report.len(), 3); // slice_length, repeat_count, wet_mix
        let p = engine.params();
        assert_eq!(p.repeat_count, 16);
        assert_eq!(p.wet_mix, 100);
        assert_eq!(p.slice_length, MAX);
    }

    #[test]
    fn ramp_replays_twice_then_passes_through() {
        const L: usize = 128;
        let mut engine = engine_with(replay_params(L, 2));

        let mut input = [[0i16; 2]; 5 * L];
        for i in 0..L {
            input[i] = ramp_frame(i);
        }
        // Live signal after the repeats, to tell pass-through from replay.
        for i in 3 * L..4 * L {
            input[i] = [1, 1];
        }
        let out = run(&mut engine, &input);

        for i in 0..L {
            assert_eq!(out[i], ramp_frame(i), "dry ramp at {i}");
            assert_eq!(out[L + i], ramp_frame(i), "first replay at {i}");
            assert_eq!(out[2 * L + i], ramp_frame(i), "second replay at {i}");
        }
        // Third slice (silence) completed while idle and was replayed next.
        for i in 3 * L..4 * L {
            assert_eq!(out[i], [0, 0], "replay of silent slice at {i}");
        }
    }

    #[test]
    fn stutter_length_overrides_slice_length() {
        const L: usize = 100;
        let mut engine = engine_with(EffectParameters {
            stutter_enabled: true,
            stutter_slice_length: L,
            ..replay_params(256, 2)
        });
        assert_eq!(engine.active_slice_length(), L);

        let mut input = [[0i16; 2]; 4 * L];
        for i in 0..L {
            input[i] = ramp_frame(i);
        }
        let out = run(&mut engine, &input);
        for i in 0..L {
            assert_eq!(out[L + i], ramp_frame(i));
            assert_eq!(out[2 * L + i], ramp_frame(i));
        }
        assert_eq!(engine.state().slices_captured, 4);
    }

    #[test]
    fn reverse_plays_tail_to_head() {
        const L: usize = 128;
        let mut engine = engine_with(EffectParameters {
            reverse: true,
            ..replay_params(L, 2)
        });
        let mut input = [[0i16; 2]; 3 * L];
        for i in 0..L {
            input[i] = ramp_frame(i);
        }
        let out = run(&mut engine, &input);

        assert_eq!(out[L], ramp_frame(L - 1));
        assert_eq!(out[2 * L - 1], ramp_frame(0));
        for i in 0..L {
            assert_eq!(out[L + i], ramp_frame(L - 1 - i));
            assert_eq!(out[2 * L + i], ramp_frame(L - 1 - i));
        }
    }

    #[test]
    fn freeze_keeps_repeating() {
        const L: usize = 128;
        let repeats = 2u8;
        let mut engine = engine_with(replay_params(L, repeats));
        for i in 0..L {
            engine.process_frame(ramp_frame(i));
        }
        assert!(engine.is_repeating());

        let mut params = engine.params();
        params.freeze = true;
        engine.set_params(params);

        let slot = engine.state().source_slot;
        for cycle in 0..10 * repeats as usize {
            for i in 0..L {
                let out = engine.process_frame([0, 0]);
                assert_eq!(out, ramp_frame(i), "cycle {cycle} frame {i}");
                assert!(engine.repeat_counter() <= repeats as u32);
            }
            assert!(engine.is_repeating());
        }
        assert_eq!(engine.state().source_slot, slot);
    }

    #[test]
    fn freeze_blocks_new_triggers() {
        let mut engine = engine_with(EffectParameters {
            freeze: true,
            ..replay_params(128, 2)
        });
        for _ in 0..128 * 4 {
            engine.process_frame([5, 5]);
        }
        assert!(!engine.is_repeating());
        assert_eq!(engine.state().slices_captured, 4);
        assert_eq!(engine.state().slices_triggered, 0);
    }

    #[test]
    fn zero_probability_never_triggers() {
        let mut engine = engine_with(EffectParameters {
            slice_probability: 0.0,
            stutter_enabled: true,
            stutter_slice_length: 64,
            ..replay_params(128, 2)
        });
        for i in 0..64 * 1000 {
            let out = engine.process_frame([i as i16, 1]);
            assert_eq!(out, [i as i16, 1]);
            assert!(!engine.is_repeating());
        }
        assert_eq!(engine.state().slices_captured, 1000);
        assert_eq!(engine.state().slices_triggered, 0);
    }

    #[test]
    fn probability_gate_uses_injected_source() {
        // 0.75 then 0.25 of full scale, alternating.
        static WORDS: [u32; 2] = [0xC000_0000, 0x4000_0000];
        let mut engine: BeatRepeat<MAX, SLOTS, Sequence> = BeatRepeat::with_rng(Sequence {
            values: &WORDS,
            next: 0,
        });
        engine.init(SR);
        engine.set_params(EffectParameters {
            slice_probability: 0.5,
            ..replay_params(128, 1)
        });

        // First slice: draw 0.75 ≥ 0.5, no trigger.
        for _ in 0..128 {
            engine.process_frame([1, 1]);
        }
        assert!(!engine.is_repeating());
        // Second slice: draw 0.25 < 0.5, trigger.
        for _ in 0..128 {
            engine.process_frame([1, 1]);
        }
        assert!(engine.is_repeating());
        assert_eq!(engine.state().slices_triggered, 1);
    }

    #[test]
    fn slice_select_reads_older_slice() {
        const L: usize = 128;
        let mut engine = engine_with(EffectParameters {
            slice_probability: 0.0,
            ..replay_params(L, 1)
        });
        // Slice A = ramp, slice B = constant, both captured idle.
        for i in 0..L {
            engine.process_frame(ramp_frame(i));
        }
        for _ in 0..L {
            engine.process_frame([3, 3]);
        }
        let mut params = engine.params();
        params.slice_probability = 1.0;
        params.slice_select = 2;
        engine.set_params(params);

        // Slice C completes and triggers; select 2 walks back to A.
        for _ in 0..L {
            engine.process_frame([0, 0]);
        }
        assert!(engine.is_repeating());
        for i in 0..L {
            assert_eq!(engine.process_frame([0, 0]), ramp_frame(i));
        }
    }

    #[test]
    fn slice_select_past_history_uses_oldest() {
        const L: usize = 128;
        let mut engine = engine_with(EffectParameters {
            slice_select: 3,
            ..replay_params(L, 1)
        });
        for i in 0..L {
            engine.process_frame(ramp_frame(i));
        }
        assert!(engine.is_repeating());
        assert_eq!(engine.process_frame([0, 0]), ramp_frame(0));
    }

    #[test]
    fn wet_mix_blends_replay_with_live() {
        const L: usize = 128;
        let mut engine = engine_with(EffectParameters {
            wet_mix: 50,
            ..replay_params(L, 1)
        });
        for _ in 0..L {
            engine.process_frame([1000, -1000]);
        }
        assert_eq!(engine.process_frame([3000, 3000]), [2000, 1000]);
    }

    #[test]
    fn double_speed_plays_every_other_frame() {
        const L: usize = 128;
        let mut engine = engine_with(EffectParameters {
            pitch_shift: 2.0,
            ..replay_params(L, 2)
        });
        for i in 0..L {
            engine.process_frame(ramp_frame(i));
        }
        for i in 0..L / 2 {
            assert_eq!(engine.process_frame([0, 0]), ramp_frame(2 * i));
        }
        // One repeat took half the slice length.
        assert_eq!(engine.repeat_counter(), 1);
    }

    #[test]
    fn half_speed_interpolates() {
        const L: usize = 128;
        let mut engine = engine_with(EffectParameters {
            pitch_shift: 0.5,
            ..replay_params(L, 1)
        });
        for i in 0..L {
            engine.process_frame(ramp_frame(i));
        }
        assert_eq!(engine.process_frame([0, 0]), ramp_frame(0));
        // Halfway between 10 and 20.
        assert_eq!(engine.process_frame([0, 0]), [15, -15]);
        assert_eq!(engine.process_frame([0, 0]), ramp_frame(1));
    }

    #[test]
    fn clock_divider_shortens_slices() {
        let mut engine = engine_with(EffectParameters {
            clock_divider: 4,
            ..replay_params(256, 1)
        });
        assert_eq!(engine.active_slice_length(), 64);
        for _ in 0..64 {
            engine.process_frame([1, 1]);
        }
        assert!(engine.is_repeating());
    }

    #[test]
    fn loop_start_skips_head_of_slice() {
        const L: usize = 128;
        let mut engine = engine_with(EffectParameters {
            loop_start: 0.5,
            ..replay_params(L, 2)
        });
        for i in 0..L {
            engine.process_frame(ramp_frame(i));
        }
        for i in 0..L / 2 {
            assert_eq!(engine.process_frame([0, 0]), ramp_frame(L / 2 + i));
        }
        assert_eq!(engine.repeat_counter(), 1);
        assert_eq!(engine.process_frame([0, 0]), ramp_frame(L / 2));
    }

    #[test]
    fn loop_decay_shrinks_successive_repeats() {
        const L: usize = 128;
        let mut engine = engine_with(EffectParameters {
            loop_size_decay: 0.5,
            ..replay_params(L, 2)
        });
        for i in 0..L {
            engine.process_frame(ramp_frame(i));
        }
        // First repeat: full window.
        for _ in 0..L {
            engine.process_frame([0, 0]);
        }
        assert_eq!(engine.repeat_counter(), 1);
        // Second repeat: 1 - 0.5 * 1/2 = 75 % of the window.
        for _ in 0..96 {
            assert!(engine.is_repeating());
            engine.process_frame([0, 0]);
        }
        assert!(!engine.is_repeating());
    }

    #[test]
    fn loop_decay_respects_floor() {
        const L: usize = 128;
        let mut engine = engine_with(EffectParameters {
            loop_size_decay: 1.0,
            freeze: false,
            ..replay_params(L, 16)
        });
        for i in 0..L {
            engine.process_frame(ramp_frame(i));
        }
        for _ in 0..L {
            engine.process_frame([0, 0]);
        }
        // Deep into the run the window would be ~0: the floor keeps 12 frames.
        while engine.repeat_counter() < 15 {
            engine.process_frame([0, 0]);
        }
        let mut frames = 0;
        while engine.is_repeating() {
            engine.process_frame([0, 0]);
            frames += 1;
        }
        assert_eq!(frames, 12);
    }

    #[test]
    fn window_fades_repeat_edges() {
        const L: usize = 128;
        let mut engine = engine_with(EffectParameters {
            window_shape: 0.25,
            ..replay_params(L, 1)
        });
        for _ in 0..L {
            engine.process_frame([1000, 1000]);
        }
        let first = engine.process_frame([0, 0]);
        assert_eq!(first, [0, 0]);
        let mut peak = 0;
        let mut last = [0i16; 2];
        for _ in 1..L {
            last = engine.process_frame([0, 0]);
            peak = peak.max(last[0]);
        }
        assert_eq!(peak, 1000);
        // Last frame of the fade-out sits at 1/32 gain.
        assert_eq!(last, [31, 31]);
    }

    #[test]
    fn decreasing_pitch_lasts_longer_than_fixed() {
        const L: usize = 128;
        let mut engine = engine_with(EffectParameters {
            pitch_mode: PitchMode::Decreasing,
            ..replay_params(L, 1)
        });
        for i in 0..L {
            engine.process_frame(ramp_frame(i));
        }
        let mut frames = 0;
        while engine.is_repeating() {
            engine.process_frame([0, 0]);
            frames += 1;
            assert!(frames < 4 * L);
        }
        // Average speed is between 0.5 and 1.0.
        assert!(frames > L && frames < 2 * L, "took {frames} frames");
    }

    #[test]
    fn increasing_pitch_starts_at_half_speed() {
        const L: usize = 128;
        let mut engine = engine_with(EffectParameters {
            pitch_mode: PitchMode::Increasing,
            ..replay_params(L, 1)
        });
        for i in 0..L {
            engine.process_frame(ramp_frame(i));
        }
        assert_eq!(engine.process_frame([0, 0]), ramp_frame(0));
        assert_eq!(engine.state().read_position, 0.5);
    }

    #[test]
    fn scratch_mode_advances_phase() {
        const L: usize = 128;
        let mut engine = engine_with(EffectParameters {
            pitch_mode: PitchMode::Scratch,
            ..replay_params(L, 1)
        });
        for i in 0..L {
            engine.process_frame(ramp_frame(i));
        }
        // sin(0) = 0: the first step is at unity speed.
        engine.process_frame([0, 0]);
        assert_eq!(engine.state().read_position, 1.0);
        assert!(engine.state().pitch_modulation_phase > 0.0);

        let mut max_step: f32 = 0.0;
        let mut prev = engine.state().read_position;
        for _ in 0..64 {
            engine.process_frame([0, 0]);
            let pos = engine.state().read_position;
            if pos > prev {
                max_step = max_step.max(pos - prev);
            }
            prev = pos;
        }
        assert!(max_step > 1.0 && max_step <= 1.0 + SCRATCH_DEPTH + 1e-4);
    }

    #[test]
    fn reset_returns_to_idle_and_keeps_params() {
        let mut engine = engine_with(replay_params(128, 4));
        for i in 0..128 {
            engine.process_frame(ramp_frame(i));
        }
        assert!(engine.is_repeating());
        let params = engine.params();

        engine.reset();
        assert_eq!(engine.state(), EngineState::new());
        assert_eq!(engine.history().committed(), 0);
        assert_eq!(engine.params(), params);
        assert_eq!(engine.process_frame([9, 9]), [9, 9]);
    }

    #[test]
    fn audio_node_update_processes_in_place() {
        let mut engine = engine_with(replay_params(128, 1));
        let mut data = [0i16; 2 * 256];
        for i in 0..128 {
            data[2 * i] = ramp_frame(i)[0];
            data[2 * i + 1] = ramp_frame(i)[1];
        }
        engine.update(&mut data);
        assert_eq!([data[256], data[257]], ramp_frame(0));
        assert_eq!(<Engine as AudioNode>::NUM_CHANNELS, 2);
    }

    #[test]
    fn default_sizing_fits_ram_budget() {
        use crate::constants::{AUDIO_RAM_BUDGET, OUTPUT_BUFFER_FRAMES};
        use crate::io::StreamBuffer;
        use core::mem::size_of;

        let total =
            size_of::<DefaultBeatRepeat>() + size_of::<StreamBuffer<OUTPUT_BUFFER_FRAMES>>();
        assert!(
            total <= AUDIO_RAM_BUDGET,
            "{total} bytes exceeds {AUDIO_RAM_BUDGET}"
        );
    }

    #[test]
    fn default_engine_holds_default_slice_unclamped() {
        let mut engine = DefaultBeatRepeat::new();
        assert!(engine.init(SR));
        let defaults = EffectParameters::for_sample_rate(SR);
        assert!(engine.set_params(defaults).is_empty());
        assert_eq!(engine.params().slice_length, MAX_SLICE_FRAMES);
    }
}
