//! Lock-free single-producer single-consumer (SPSC) frame ring.
//!
//! Stages processed stereo frames between the producer (PCM callback, main
//! loop) and the sink's refill interrupt. Neither side ever blocks: a full
//! buffer drops the excess frames and counts an overrun per frame, an empty
//! buffer pads with silence and counts an underrun per frame.
//!
//! # Safety Contract
//!
//! - Only ONE thread/context may call [`write()`](StreamBuffer::write) (the "producer").
//! - Only ONE thread/context may call [`drain()`](StreamBuffer::drain) (the "consumer").
//! - These may be different threads/ISR contexts running concurrently.
//!
//! ## Cursors
//!
//! `written` and `read` run modulo `2 × N` so that a full buffer
//! (`written - read == N`) and an empty one (`written == read`) stay
//! distinguishable without sacrificing a slot. The storage index is the
//! cursor modulo `N`. Each cursor has exactly one writer; the count of
//! buffered frames is derived from both and is never stored, so the consumer
//! can see a stale (low) count but never one that includes unwritten frames.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use super::interleave::{pack_frame, silence};

/// Fill state relative to capacity: below 1/4 is low, above 3/4 is high.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferLevel {
    Low,
    Normal,
    High,
}

impl BufferLevel {
    pub fn classify(buffered: usize, capacity: usize) -> Self {
        if buffered < capacity / 4 {
            BufferLevel::Low
        } else if buffered > capacity * 3 / 4 {
            BufferLevel::High
        } else {
            BufferLevel::Normal
        }
    }
}

/// Snapshot of buffer fill and lifetime error counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    /// Silent frames the consumer had to emit.
    pub underruns: u32,
    /// Frames the producer had to drop.
    pub overruns: u32,
    pub buffered: usize,
    pub capacity: usize,
    pub level: BufferLevel,
}

/// SPSC ring of `N` packed stereo frames (see [`pack_frame`]).
pub struct StreamBuffer<const N: usize> {
    frames: [UnsafeCell<u32>; N],
    /// Producer cursor, modulo `2 * N` (only modified by the producer).
    written: AtomicUsize,
    /// Consumer cursor, modulo `2 * N` (only modified by the consumer).
    read: AtomicUsize,
    /// Only modified by the producer.
    overruns: AtomicU32,
    /// Only modified by the consumer.
    underruns: AtomicU32,
}

// SAFETY: each storage slot is written by the producer only while it lies
// outside `read..written`, and read by the consumer only while inside it.
// Cursor publication uses Release/Acquire, so a slot's contents are visible
// before the cursor that hands it over.
unsafe impl<const N: usize> Sync for StreamBuffer<N> {}

impl<const N: usize> StreamBuffer<N> {
    /// Create an empty buffer.
    ///
    /// # Panics
    ///
    /// Compile-time assertion: `N` must be at least 1 and `2 * N` must not
    /// overflow.
    pub const fn new() -> Self {
        assert!(N >= 1, "stream buffer must hold at least 1 frame");
        assert!(N <= usize::MAX / 2, "stream buffer capacity too large");

        StreamBuffer {
            // SAFETY: all-zero bits are a valid `u32`, which is silence.
            // UnsafeCell is a transparent wrapper that doesn't affect validity.
            frames: unsafe { MaybeUninit::<[UnsafeCell<u32>; N]>::zeroed().assume_init() },
            written: AtomicUsize::new(0),
            read: AtomicUsize::new(0),
            overruns: AtomicU32::new(0),
            underruns: AtomicU32::new(0),
        }
    }

    /// Capacity in frames.
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline(always)]
    const fn distance(written: usize, read: usize) -> usize {
        (written + 2 * N - read) % (2 * N)
    }

    #[inline(always)]
    const fn advance(cursor: usize, by: usize) -> usize {
        (cursor + by) % (2 * N)
    }

    /// Queue interleaved `L R L R ...` samples (producer side).
    ///
    /// Accepts frames in order while there is room and returns how many were
    /// taken. The rest are dropped and counted as overruns. Empty input, or
    /// input that is not whole frames, is ignored.
    pub fn write(&self, interleaved: &[i16]) -> usize {
        if interleaved.is_empty() || interleaved.len() % 2 != 0 {
            return 0;
        }

        let mut cursor = self.written.load(Ordering::Relaxed);
        let mut free = N - Self::distance(cursor, self.read.load(Ordering::Acquire));
        let mut accepted = 0;

        for frame in interleaved.chunks_exact(2) {
            if free == 0 {
                // The consumer may have caught up since the last look.
                free = N - Self::distance(cursor, self.read.load(Ordering::Acquire));
                if free == 0 {
                    break;
                }
            }

            // SAFETY: we are the sole producer and `free > 0` means this slot
            // is outside the consumer's readable range.
            unsafe {
                *self.frames[cursor % N].get() = pack_frame([frame[0], frame[1]]);
            }

            cursor = Self::advance(cursor, 1);
            // Release ordering ensures the slot write is visible before the cursor moves.
            self.written.store(cursor, Ordering::Release);
            free -= 1;
            accepted += 1;
        }

        let dropped = interleaved.len() / 2 - accepted;
        if dropped > 0 {
            let total = self.overruns.load(Ordering::Relaxed);
            self.overruns
                .store(total.wrapping_add(dropped as u32), Ordering::Relaxed);
        }
        accepted
    }

    /// Fill `dest` with packed frames in FIFO order (consumer side).
    ///
    /// Returns the number of frames taken from the buffer. Every word of
    /// `dest` past that is silence and counts as one underrun. Safe to call
    /// from interrupt context: it never blocks and never logs.
    pub fn drain(&self, dest: &mut [u32]) -> usize {
        let taken = self.drain_with(dest, |word| word);
        silence(&mut dest[taken..]);
        taken
    }

    /// Like [`drain`](Self::drain) but converts each packed frame with `map`
    /// and pads with `idle`, for sinks that do not take packed words.
    pub fn drain_map<T: Copy>(&self, dest: &mut [T], idle: T, map: impl Fn(u32) -> T) -> usize {
        let taken = self.drain_with(dest, map);
        dest[taken..].fill(idle);
        taken
    }

    /// Copy available frames into the head of `dest`, publish the new read
    /// cursor and count underruns for the remainder.
    #[inline]
    fn drain_with<T>(&self, dest: &mut [T], map: impl Fn(u32) -> T) -> usize {
        let cursor = self.read.load(Ordering::Relaxed);
        let available = Self::distance(self.written.load(Ordering::Acquire), cursor);
        let taken = available.min(dest.len());

        for (i, out) in dest[..taken].iter_mut().enumerate() {
            // SAFETY: we are the sole consumer and slots `cursor..cursor + taken`
            // were published by the producer's Release store.
            *out = map(unsafe { *self.frames[(cursor + i) % N].get() });
        }

        // Release ordering ensures the reads complete before the slots are
        // handed back to the producer.
        self.read
            .store(Self::advance(cursor, taken), Ordering::Release);

        let missing = dest.len() - taken;
        if missing > 0 {
            let total = self.underruns.load(Ordering::Relaxed);
            self.underruns
                .store(total.wrapping_add(missing as u32), Ordering::Relaxed);
        }
        taken
    }

    /// Frames currently queued.
    pub fn buffered_count(&self) -> usize {
        let read = self.read.load(Ordering::Acquire);
        let written = self.written.load(Ordering::Acquire);
        Self::distance(written, read)
    }

    /// Frames that can be written without overrun.
    pub fn free_space(&self) -> usize {
        N - self.buffered_count()
    }

    pub fn is_empty(&self) -> bool {
        self.buffered_count() == 0
    }

    pub fn is_full(&self) -> bool {
        self.buffered_count() == N
    }

    pub fn level(&self) -> BufferLevel {
        BufferLevel::classify(self.buffered_count(), N)
    }

    pub fn stats(&self) -> BufferStats {
        let buffered = self.buffered_count();
        BufferStats {
            underruns: self.underruns.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            buffered,
            capacity: N,
            level: BufferLevel::classify(buffered, N),
        }
    }

    /// Empty the buffer, zero its storage and reset both counters.
    pub fn clear(&mut self) {
        // SAFETY: `&mut self` rules out any concurrent producer or consumer.
        unsafe { self.clear_shared() }
    }

    /// [`clear`](Self::clear) through a shared reference, for buffers that
    /// live in a `static`.
    ///
    /// # Safety
    ///
    /// Neither [`write`](Self::write) nor any drain may run concurrently: the
    /// caller must be the producer and the consumer must be stopped.
    /// [`AudioOutputStream::clear`](super::AudioOutputStream::clear) checks
    /// the consumer side.
    pub unsafe fn clear_shared(&self) {
        for slot in self.frames.iter() {
            // SAFETY: no other context reads or writes storage (caller contract).
            unsafe { *slot.get() = 0 };
        }
        self.written.store(0, Ordering::Release);
        self.read.store(0, Ordering::Release);
        self.overruns.store(0, Ordering::Relaxed);
        self.underruns.store(0, Ordering::Relaxed);
        log::debug!("stream buffer: cleared {} frames", N);
    }
}

impl<const N: usize> Default for StreamBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
