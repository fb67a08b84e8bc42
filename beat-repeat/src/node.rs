/// Core trait for in-place audio processors.
///
/// A node transforms one buffer of interleaved samples per call. The number
/// of interleaved channels it expects is declared via an associated constant,
/// so a caller can check the layout before handing over data.
pub trait AudioNode {
    /// Interleaved channels per frame.
    const NUM_CHANNELS: usize;

    /// Process one buffer of interleaved samples in place.
    ///
    /// Buffers whose length is not a multiple of `NUM_CHANNELS` are left
    /// untouched.
    fn update(&mut self, data: &mut [i16]);
}

/// A borrowed node is a node, so an engine kept in a `static` can drive a
/// pipeline by `&mut`.
impl<T: AudioNode + ?Sized> AudioNode for &mut T {
    const NUM_CHANNELS: usize = T::NUM_CHANNELS;

    fn update(&mut self, data: &mut [i16]) {
        (**self).update(data);
    }
}
