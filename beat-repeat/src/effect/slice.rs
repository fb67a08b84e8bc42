//! Fixed-capacity slice storage.
//!
//! [`SliceHistory`] is an arena of `S` [`SliceBuffer`] slots of `N` stereo
//! frames each. One slot is always the *recording* slot that live input is
//! written into. When a slice completes, the recording slot is committed as
//! the newest entry and recording moves on to the next slot, which is
//! invalidated before it is reused. A slot that is *held* for playback is
//! skipped, so a repeat never reads audio that capture is overwriting.
//!
//! ```text
//!   recency (newest first)      slots
//!   ┌───┬───┬───┐             ┌──────┬──────┬──────┬──────┐
//!   │ 2 │ 0 │ 3 │             │  s0  │  s1  │  s2  │  s3  │
//!   └───┴───┴───┘             └──────┴──▲───┴──────┴──────┘
//!    select(0) = slot 2                 └─ recording
//! ```

/// One slice slot: interleaved stereo frames plus the committed length.
pub struct SliceBuffer<const N: usize> {
    frames: [[i16; 2]; N],
    /// Frames committed by the last completed capture (0 = empty).
    len: usize,
}

impl<const N: usize> SliceBuffer<N> {
    const EMPTY: Self = Self::new();

    pub const fn new() -> Self {
        SliceBuffer {
            frames: [[0; 2]; N],
            len: 0,
        }
    }

    /// Committed length in frames.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// All stored frames; only the first [`len()`](Self::len) belong to the
    /// committed slice.
    pub fn frames(&self) -> &[[i16; 2]] {
        &self.frames
    }

    /// Frame at `index`, or silence past the committed length.
    pub fn frame(&self, index: usize) -> [i16; 2] {
        if index < self.len {
            self.frames[index]
        } else {
            [0, 0]
        }
    }

    fn write(&mut self, index: usize, frame: [i16; 2]) {
        if let Some(slot) = self.frames.get_mut(index) {
            *slot = frame;
        }
    }

    fn clear(&mut self) {
        self.frames.fill([0; 2]);
        self.len = 0;
    }
}

/// Ring of completed slices with recency ordering.
pub struct SliceHistory<const N: usize, const S: usize> {
    slots: [SliceBuffer<N>; S],
    /// Committed slot indices, newest first. Only `committed` entries are valid.
    recency: [usize; S],
    committed: usize,
    recording: usize,
    held: Option<usize>,
}

impl<const N: usize, const S: usize> SliceHistory<N, S> {
    /// Create an empty history.
    ///
    /// # Panics
    ///
    /// `S` must be at least 2: one slot to record into while another plays.
    pub const fn new() -> Self {
        assert!(S >= 2, "slice history needs at least 2 slots");

        SliceHistory {
            slots: [SliceBuffer::<N>::EMPTY; S],
            recency: [0; S],
            committed: 0,
            recording: 0,
            held: None,
        }
    }

    /// Write one live frame at `cursor` in the recording slot.
    pub fn record(&mut self, cursor: usize, frame: [i16; 2]) {
        self.slots[self.recording].write(cursor, frame);
    }

    /// Finish the recording slot with `len` frames and make it the newest
    /// entry. Returns the committed slot index.
    ///
    /// Recording stays on this slot until [`begin_next`](Self::begin_next).
    pub fn commit(&mut self, len: usize) -> usize {
        let slot = self.recording;
        self.slots[slot].len = len.min(N);
        self.forget(slot);
        self.recency.copy_within(0..self.committed, 1);
        self.recency[0] = slot;
        self.committed += 1;
        slot
    }

    /// Move recording to the next slot that is not held, dropping whatever
    /// that slot used to hold from the history.
    pub fn begin_next(&mut self) {
        let mut next = self.recording;
        for _ in 0..S {
            next = (next + 1) % S;
            if Some(next) != self.held {
                break;
            }
        }
        self.recording = next;
        self.forget(next);
        self.slots[next].len = 0;
    }

    /// Slot index `back` entries before the newest commit.
    pub fn select(&self, back: usize) -> Option<usize> {
        if back < self.committed {
            Some(self.recency[back])
        } else {
            None
        }
    }

    /// Pin `slot` for playback (or release with `None`).
    pub fn hold(&mut self, slot: Option<usize>) {
        self.held = slot;
    }

    pub fn held(&self) -> Option<usize> {
        self.held
    }

    /// Number of completed slices available for selection.
    pub fn committed(&self) -> usize {
        self.committed
    }

    pub fn recording(&self) -> usize {
        self.recording
    }

    pub fn slot(&self, index: usize) -> &SliceBuffer<N> {
        &self.slots[index]
    }

    /// Zero all slots and forget every committed slice.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.clear();
        }
        self.committed = 0;
        self.recording = 0;
        self.held = None;
    }

    /// Remove `slot` from the recency list if present.
    fn forget(&mut self, slot: usize) {
        if let Some(pos) = self.recency[..self.committed].iter().position(|&s| s == slot) {
            self.recency.copy_within(pos + 1..self.committed, pos);
            self.committed -= 1;
        }
    }
}
