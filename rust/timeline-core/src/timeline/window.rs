// rust/timeline-core/src/timeline/window.rs

//! Window strategies decide how the sequence window is refilled.

use super::state::StateSnapshot;
use super::types::{ChunkDescription, DataSource, SequenceDescription};
use crate::error::{Result, ReaderError};

/// Strategy for growing the sequence window.
///
/// The reader calls `inner_state` right before every `refill`, so the
/// returned state must be enough to make the next refill produce the same
/// window again after `set_inner_state`.
pub trait WindowStrategy: Send {
    /// Append the next sequence descriptions to `window`.
    ///
    /// Must append at least one entry.
    fn refill(
        &mut self,
        source: &dyn DataSource,
        chunks: &[ChunkDescription],
        window: &mut Vec<SequenceDescription>,
    ) -> Result<()>;

    /// Strategy-specific state needed to regenerate the next refill.
    fn inner_state(&self) -> StateSnapshot;

    /// Restore state produced by `inner_state`.
    fn set_inner_state(&mut self, state: &StateSnapshot) -> Result<()>;

    /// Name of this strategy
    fn name(&self) -> &'static str;
}

pub const CHUNK_POSITION: &str = "chunk_position";

/// Local timeline strategy: chunks in source order, no shuffling.
///
/// Every refill loads `chunks_per_refill` chunks, continuing past empty
/// chunks until at least one sequence is available. After the last chunk
/// of the source an end-of-sweep marker is appended and the refill stops.
#[derive(Debug, Clone)]
pub struct SequentialWindow {
    chunks_per_refill: usize,
    chunk_position: usize,
}

impl SequentialWindow {
    pub fn new(chunks_per_refill: usize) -> Self {
        Self {
            chunks_per_refill: chunks_per_refill.max(1),
            chunk_position: 0,
        }
    }

    /// Index of the next chunk to load.
    pub fn chunk_position(&self) -> usize {
        self.chunk_position
    }
}

impl Default for SequentialWindow {
    fn default() -> Self {
        Self::new(1)
    }
}

impl WindowStrategy for SequentialWindow {
    fn refill(
        &mut self,
        source: &dyn DataSource,
        chunks: &[ChunkDescription],
        window: &mut Vec<SequenceDescription>,
    ) -> Result<()> {
        if chunks.is_empty() {
            return Err(ReaderError::invariant("no chunks to refill the window from"));
        }
        if self.chunk_position >= chunks.len() {
            return Err(ReaderError::state(format!(
                "chunk position {} out of range (total chunks: {})",
                self.chunk_position,
                chunks.len()
            )));
        }

        let mut loaded = 0;
        loop {
            let chunk = &chunks[self.chunk_position];
            window.extend(source.sequence_descriptions(chunk.id)?);
            loaded += 1;

            self.chunk_position = (self.chunk_position + 1) % chunks.len();
            if self.chunk_position == 0 {
                window.push(SequenceDescription::END_OF_SWEEP);
                break;
            }

            if loaded >= self.chunks_per_refill && !window.is_empty() {
                break;
            }
        }

        tracing::debug!(
            "Window refilled from {} chunk(s), {} entries, next chunk {}",
            loaded,
            window.len(),
            self.chunk_position
        );
        Ok(())
    }

    fn inner_state(&self) -> StateSnapshot {
        let mut state = StateSnapshot::new();
        state.insert(CHUNK_POSITION, self.chunk_position as u64);
        state
    }

    fn set_inner_state(&mut self, state: &StateSnapshot) -> Result<()> {
        self.chunk_position = state.require(CHUNK_POSITION)? as usize;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}
