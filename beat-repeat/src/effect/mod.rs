//! Beat-repeat effect: slice capture, history and repeat playback.
//!
//! | Type | Role |
//! |------|------|
//! | [`EffectParameters`] | Full configuration, clamped on every update |
//! | [`SliceHistory`] | Arena of recent slices, newest first |
//! | [`BeatRepeat`] | The slicer state machine |

pub mod beat_repeat;
pub mod params;
pub mod slice;

pub use beat_repeat::{BeatRepeat, DefaultBeatRepeat, EngineState};
pub use params::{ClampReport, EffectParameters, ParamField, PitchMode};
pub use slice::{SliceBuffer, SliceHistory};
