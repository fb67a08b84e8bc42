//! Interrupt-driven refill of a sink's transfer buffer.
//!
//! [`AudioOutputStream`] sits between a [`StreamBuffer`] and the DMA engine
//! of an I2S or PWM sink. The producer writes frames into the buffer; the
//! sink's transfer-complete interrupt calls [`isr()`](AudioOutputStream::isr)
//! to refill the region the DMA engine just finished with.
//!
//! ## Architecture
//!
//! ```text
//! producer                 StreamBuffer              transfer buffer          sink
//! ┌──────────┐  write   ┌─────────────────┐  isr  ┌──────────────────────┐  DMA  ┌─────┐
//! │ effect   ├─────────►│ N packed frames ├──────►│ First  │  Second     ├──────►│ I2S │
//! └──────────┘          └─────────────────┘       └──────────────────────┘       └─────┘
//! ```
//!
//! ## Transfer buffer layout
//!
//! - `chunk_frames × regions` words (see [`StreamConfig::transfer_len`])
//! - Each `u32` = one stereo frame (left in lower 16 bits, right in upper 16)
//! - Ping-pong: the ISR fills the half the DMA engine just released while the
//!   other half plays
//!
//! ## Usage
//!
//! ```ignore
//! static BUFFER: StreamBuffer<OUTPUT_BUFFER_FRAMES> = StreamBuffer::new();
//!
//! let config = StreamConfig::for_capacity(OUTPUT_BUFFER_FRAMES)?;
//! let output = AudioOutputStream::new(&BUFFER, config);
//!
//! // Producer, after each write:
//! output.poll_auto_start();
//!
//! // In the DMA ISR:
//! output.isr(&mut DMA_TX_BUFFER, DmaHalf::First);
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use super::config::{RefillMode, StreamConfig};
use super::interleave::{pwm_sample, pwm_silence, silence, unpack_frame};
use super::stream_buffer::StreamBuffer;

/// Which region of a ping-pong transfer buffer the DMA engine released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaHalf {
    First,
    Second,
}

impl DmaHalf {
    pub fn other(self) -> Self {
        match self {
            DmaHalf::First => DmaHalf::Second,
            DmaHalf::Second => DmaHalf::First,
        }
    }

    const fn index(self) -> usize {
        match self {
            DmaHalf::First => 0,
            DmaHalf::Second => 1,
        }
    }
}

/// Consumer side of a [`StreamBuffer`], driven by the sink's interrupt.
///
/// The running flag is the only state besides the buffer that both the
/// producer and the interrupt touch.
pub struct AudioOutputStream<'a, const N: usize> {
    buffer: &'a StreamBuffer<N>,
    config: StreamConfig,
    running: AtomicBool,
}

impl<'a, const N: usize> AudioOutputStream<'a, N> {
    /// Create a stopped output over `buffer`.
    pub const fn new(buffer: &'a StreamBuffer<N>, config: StreamConfig) -> Self {
        AudioOutputStream {
            buffer,
            config,
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn buffer(&self) -> &'a StreamBuffer<N> {
        self.buffer
    }

    /// Begin draining on every interrupt. Returns `false` if already running.
    pub fn start(&self) -> bool {
        if self.running.swap(true, Ordering::AcqRel) {
            return false;
        }
        log::info!(
            "output stream: started with {} of {} frames buffered",
            self.buffer.buffered_count(),
            N
        );
        true
    }

    /// Stop draining. Buffered frames stay queued until the buffer is cleared.
    /// Returns `false` if already stopped.
    pub fn stop(&self) -> bool {
        if !self.running.swap(false, Ordering::AcqRel) {
            return false;
        }
        let stats = self.buffer.stats();
        log::info!(
            "output stream: stopped, {} underruns, {} overruns",
            stats.underruns,
            stats.overruns
        );
        true
    }

    /// Drop whatever is still queued and zero the buffer's counters, as on a
    /// disconnect. Call from the producer context.
    ///
    /// Refuses and returns `false` while the stream is running.
    pub fn clear(&self) -> bool {
        if self.is_running() {
            log::warn!("output stream: clear refused while running");
            return false;
        }
        // SAFETY: a stopped stream never drains (see `isr` and `isr_pwm`), and
        // the caller is the producer, so nothing else touches the buffer.
        unsafe { self.buffer.clear_shared() };
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start once the buffer holds at least the configured start watermark.
    ///
    /// Call from the producer after writing. Returns `true` if this call
    /// started the stream.
    pub fn poll_auto_start(&self) -> bool {
        if !self.config.auto_start() || self.is_running() {
            return false;
        }
        let buffered = self.buffer.buffered_count();
        if buffered < self.config.start_watermark() {
            return false;
        }
        log::info!(
            "output stream: auto-start at {} frames (watermark {})",
            buffered,
            self.config.start_watermark()
        );
        self.start()
    }

    /// Fill every region of `transfer` before the first transfer is kicked
    /// off. Returns the frames taken from the buffer.
    pub fn prime(&self, transfer: &mut [u32]) -> usize {
        let len = self.config.transfer_len().min(transfer.len());
        self.buffer.drain(&mut transfer[..len])
    }

    /// Refill the region of `transfer` that `half` names (the whole buffer in
    /// [`RefillMode::Single`]). Call from the transfer-complete interrupt.
    ///
    /// A stopped stream writes silence without touching the buffer. Returns
    /// the frames taken from the buffer. Never blocks, never logs.
    pub fn isr(&self, transfer: &mut [u32], half: DmaHalf) -> usize {
        let Some(region) = self.region(transfer, half) else {
            return 0;
        };
        if !self.is_running() {
            silence(region);
            return 0;
        }
        self.buffer.drain(region)
    }

    /// [`isr`](Self::isr) for a PWM sink: each frame is downmixed to a
    /// `bits`-wide duty value, and gaps hold the mid-scale level.
    pub fn isr_pwm(&self, transfer: &mut [u16], half: DmaHalf, bits: u32) -> usize {
        let Some(region) = self.region(transfer, half) else {
            return 0;
        };
        let idle = pwm_silence(bits);
        if !self.is_running() {
            region.fill(idle);
            return 0;
        }
        self.buffer
            .drain_map(region, idle, |word| pwm_sample(unpack_frame(word), bits))
    }

    /// Slice of `transfer` refilled for `half`, or `None` if `transfer` is
    /// shorter than the configured layout.
    fn region<'t, T>(&self, transfer: &'t mut [T], half: DmaHalf) -> Option<&'t mut [T]> {
        let chunk = self.config.chunk_frames();
        let start = match self.config.refill() {
            RefillMode::Single => 0,
            RefillMode::PingPong => half.index() * chunk,
        };
        transfer.get_mut(start..start + chunk)
    }
}
