//! Producer-side glue: run a PCM batch through a node and queue it for output.
//!
//! ```text
//! PCM source ──► Pipeline::push ──► node.update (in place) ──► StreamBuffer::write
//! ```
//!
//! The pipeline owns the node and borrows the buffer; the refill interrupt
//! only ever sees the buffer.

use crate::constants::CHANNELS;
use crate::io::StreamBuffer;
use crate::node::AudioNode;

/// Outcome of one [`Pipeline::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PushReport {
    /// Frames queued for output.
    pub accepted: usize,
    /// Frames lost to a full buffer.
    pub dropped: usize,
}

/// Running totals across every push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineStats {
    /// Batches handed to [`Pipeline::push`], including rejected ones.
    pub callbacks: u32,
    /// Frames processed.
    pub frames: u64,
    /// Frames dropped at the buffer.
    pub dropped: u64,
}

pub struct Pipeline<'a, E, const N: usize> {
    node: E,
    buffer: &'a StreamBuffer<N>,
    stats: PipelineStats,
}

impl<'a, E: AudioNode, const N: usize> Pipeline<'a, E, N> {
    pub fn new(node: E, buffer: &'a StreamBuffer<N>) -> Self {
        Pipeline {
            node,
            buffer,
            stats: PipelineStats::default(),
        }
    }

    /// Process `pcm` (interleaved stereo) in place and queue the result.
    ///
    /// A batch that is empty or not whole stereo frames is ignored.
    pub fn push(&mut self, pcm: &mut [i16]) -> PushReport {
        self.stats.callbacks = self.stats.callbacks.wrapping_add(1);
        if E::NUM_CHANNELS != CHANNELS || pcm.is_empty() || pcm.len() % CHANNELS != 0 {
            return PushReport::default();
        }

        self.node.update(pcm);
        let frames = pcm.len() / CHANNELS;
        let accepted = self.buffer.write(pcm);
        let dropped = frames - accepted;

        self.stats.frames += frames as u64;
        if dropped > 0 {
            self.stats.dropped += dropped as u64;
            log::warn!(
                "pipeline: dropped {} of {} frames ({} buffered)",
                dropped,
                frames,
                self.buffer.buffered_count()
            );
        }
        PushReport { accepted, dropped }
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn node(&self) -> &E {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut E {
        &mut self.node
    }

    pub fn buffer(&self) -> &'a StreamBuffer<N> {
        self.buffer
    }

    /// Give the node back.
    pub fn into_node(self) -> E {
        self.node
    }
}
