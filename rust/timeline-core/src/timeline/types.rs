// rust/timeline-core/src/timeline/types.rs

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identifier of a chunk within a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkId(pub u32);

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata of a single sequence, as produced by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequenceDescription {
    /// Global index of the sequence in the source.
    pub index: u64,
    pub number_of_samples: u32,
    pub chunk_id: ChunkId,
    pub index_in_chunk: u32,
}

impl SequenceDescription {
    /// Marker injected into the window after the last sequence of a sweep.
    pub const END_OF_SWEEP: SequenceDescription = SequenceDescription {
        index: u64::MAX,
        number_of_samples: u32::MAX,
        chunk_id: ChunkId(u32::MAX),
        index_in_chunk: u32::MAX,
    };

    pub fn new(index: u64, number_of_samples: u32, chunk_id: ChunkId, index_in_chunk: u32) -> Self {
        Self {
            index,
            number_of_samples,
            chunk_id,
            index_in_chunk,
        }
    }

    /// Returns true if this is the end-of-sweep marker rather than a real sequence.
    pub fn is_end_of_sweep(&self) -> bool {
        *self == Self::END_OF_SWEEP
    }
}

/// Metadata of a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDescription {
    pub id: ChunkId,
    pub number_of_samples: u64,
    pub number_of_sequences: u32,
}

/// Describes one output stream (column) of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescription {
    pub id: usize,
    pub name: String,
}

/// Materialized data of one sequence in one stream.
///
/// Implementations typically borrow from the chunk they were produced by
/// and keep it alive through shared ownership.
pub trait SequenceData: Send + Sync + fmt::Debug {
    /// Number of samples in this sequence.
    fn number_of_samples(&self) -> u32;

    /// Whether the sequence was read correctly. Invalid sequences are
    /// removed from a batch before it is returned.
    fn is_valid(&self) -> bool {
        true
    }

    /// Key of the sequence in its source, if the source tracks one.
    fn key(&self) -> Option<u64> {
        None
    }
}

pub type SequenceDataPtr = Arc<dyn SequenceData>;

/// A unit of sequences fetched from the data source as a whole.
pub trait Chunk: Send + Sync {
    /// Produce the per-stream data of the sequence at `index_in_chunk`.
    /// The returned vector holds one entry per stream.
    fn get_sequence(&self, index_in_chunk: u32) -> Result<Vec<SequenceDataPtr>>;
}

pub type ChunkPtr = Arc<dyn Chunk>;

/// The chunked data source the reader pulls from.
pub trait DataSource: Send + Sync {
    /// Streams every sequence provides data for.
    fn stream_descriptions(&self) -> Vec<StreamDescription>;

    /// All chunks of the source, in source order.
    fn chunk_descriptions(&self) -> Vec<ChunkDescription>;

    /// Descriptions of the sequences contained in a chunk, in source order.
    fn sequence_descriptions(&self, chunk_id: ChunkId) -> Result<Vec<SequenceDescription>>;

    /// Fetch a chunk by id.
    fn get_chunk(&self, chunk_id: ChunkId) -> Result<ChunkPtr>;
}

/// A batch of materialized sequences.
#[derive(Debug, Default)]
pub struct Sequences {
    /// Stream-major matrix: `data[stream][sequence]`.
    pub data: Vec<Vec<SequenceDataPtr>>,
    /// Set if at least one sweep ended while assembling this batch.
    pub end_of_sweep: bool,
    /// Set if this batch is the last one of the epoch.
    pub end_of_epoch: bool,
}

impl Sequences {
    /// Number of sequences in the batch.
    pub fn num_sequences(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.num_sequences() == 0
    }

    /// Total number of samples, counted on the first stream.
    pub fn num_samples(&self) -> u64 {
        self.data
            .first()
            .map_or(0, |s| s.iter().map(|d| d.number_of_samples() as u64).sum())
    }
}
