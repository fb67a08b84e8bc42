//! DSP math: saturation and packing intrinsics, plus the mixing,
//! interpolation, windowing and random-source helpers the slicer uses.

pub mod intrinsics;

#[cfg(feature = "effect")]
pub mod helpers;

#[cfg(feature = "effect")]
pub mod rng;
