//! Runtime tuning for the output stream.
//!
//! Buffer depth is a const generic on [`StreamBuffer`](super::StreamBuffer);
//! everything the refill interrupt needs at runtime lives in a validated
//! [`StreamConfig`].

use thiserror::Error;

use crate::constants::DMA_CHUNK_FRAMES;

/// How the sink's transfer buffer is refilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefillMode {
    /// One region of `chunk_frames`, refilled after each transfer completes.
    Single,
    /// Two regions of `chunk_frames`; one is refilled while the other plays.
    #[default]
    PingPong,
}

impl RefillMode {
    /// Number of `chunk_frames` regions in the transfer buffer.
    pub const fn regions(self) -> usize {
        match self {
            RefillMode::Single => 1,
            RefillMode::PingPong => 2,
        }
    }
}

/// Rejected [`StreamConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("refill chunk must hold at least one frame")]
    ZeroChunk,
    #[error("refill chunk of {chunk} frames exceeds buffer capacity of {capacity}")]
    ChunkExceedsCapacity { chunk: usize, capacity: usize },
    #[error("start watermark of {watermark} frames exceeds buffer capacity of {capacity}")]
    WatermarkExceedsCapacity { watermark: usize, capacity: usize },
}

/// Validated output stream settings for a buffer of known capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    capacity: usize,
    chunk_frames: usize,
    start_watermark: usize,
    auto_start: bool,
    refill: RefillMode,
}

impl StreamConfig {
    /// Settings for a buffer of `capacity` frames refilled `chunk_frames` at
    /// a time.
    ///
    /// Defaults: ping-pong refill, auto-start once a quarter of the buffer is
    /// filled.
    pub fn new(capacity: usize, chunk_frames: usize) -> Result<Self, ConfigError> {
        if chunk_frames == 0 {
            return Err(ConfigError::ZeroChunk);
        }
        if chunk_frames > capacity {
            return Err(ConfigError::ChunkExceedsCapacity {
                chunk: chunk_frames,
                capacity,
            });
        }
        Ok(StreamConfig {
            capacity,
            chunk_frames,
            start_watermark: capacity / 4,
            auto_start: true,
            refill: RefillMode::PingPong,
        })
    }

    /// [`new`](Self::new) with [`DMA_CHUNK_FRAMES`], falling back to the
    /// whole buffer when it is smaller than one chunk.
    pub fn for_capacity(capacity: usize) -> Result<Self, ConfigError> {
        Self::new(capacity, DMA_CHUNK_FRAMES.min(capacity))
    }

    /// Buffered frames required before auto-start begins draining.
    pub fn with_start_watermark(mut self, watermark: usize) -> Result<Self, ConfigError> {
        if watermark > self.capacity {
            return Err(ConfigError::WatermarkExceedsCapacity {
                watermark,
                capacity: self.capacity,
            });
        }
        self.start_watermark = watermark;
        Ok(self)
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn with_refill(mut self, refill: RefillMode) -> Self {
        self.refill = refill;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames per refill region.
    pub fn chunk_frames(&self) -> usize {
        self.chunk_frames
    }

    pub fn start_watermark(&self) -> usize {
        self.start_watermark
    }

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    pub fn refill(&self) -> RefillMode {
        self.refill
    }

    /// Words in the sink's transfer buffer: one per frame per region.
    pub fn transfer_len(&self) -> usize {
        self.chunk_frames * self.refill.regions()
    }
}
