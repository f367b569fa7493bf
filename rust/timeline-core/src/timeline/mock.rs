// rust/timeline-core/src/timeline/mock.rs

//! In-memory data source used by the unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::types::{
    Chunk, ChunkDescription, ChunkId, ChunkPtr, DataSource, SequenceData, SequenceDataPtr,
    SequenceDescription, StreamDescription,
};
use crate::error::{Result, ReaderError};

pub const NUM_STREAMS: usize = 2;

#[derive(Debug)]
pub struct MockData {
    pub index: u64,
    pub samples: u32,
    pub valid: bool,
}

impl SequenceData for MockData {
    fn number_of_samples(&self) -> u32 {
        self.samples
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn key(&self) -> Option<u64> {
        Some(self.index)
    }
}

/// Counters shared between a source and the chunks it hands out.
#[derive(Default)]
pub struct Counters {
    pub fetches: AtomicUsize,
    pub materialized: AtomicUsize,
}

pub struct MockChunk {
    sequences: Vec<SequenceDescription>,
    failing: HashSet<u64>,
    invalid: HashSet<u64>,
    counters: Arc<Counters>,
}

impl Chunk for MockChunk {
    fn get_sequence(&self, index_in_chunk: u32) -> Result<Vec<SequenceDataPtr>> {
        let description = self
            .sequences
            .get(index_in_chunk as usize)
            .ok_or_else(|| ReaderError::data_source("index in chunk out of range"))?;

        if self.failing.contains(&description.index) {
            return Err(ReaderError::data_source(format!(
                "corrupt sequence {}",
                description.index
            )));
        }

        let valid = !self.invalid.contains(&description.index);
        let data = (0..NUM_STREAMS)
            .map(|_| {
                Arc::new(MockData {
                    index: description.index,
                    samples: description.number_of_samples,
                    valid,
                }) as SequenceDataPtr
            })
            .collect();

        self.counters.materialized.fetch_add(1, Ordering::SeqCst);
        Ok(data)
    }
}

/// Source whose chunks hold sequences of the given sample counts.
pub struct MockSource {
    chunks: Vec<Vec<u32>>,
    failing: HashSet<u64>,
    invalid: HashSet<u64>,
    pub counters: Arc<Counters>,
}

impl MockSource {
    pub fn new(chunks: Vec<Vec<u32>>) -> Self {
        Self {
            chunks,
            failing: HashSet::new(),
            invalid: HashSet::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Materializing the sequence with this global index fails.
    pub fn with_failing(mut self, index: u64) -> Self {
        self.failing.insert(index);
        self
    }

    /// The sequence with this global index materializes as invalid data.
    pub fn with_invalid(mut self, index: u64) -> Self {
        self.invalid.insert(index);
        self
    }

    pub fn fetches(&self) -> usize {
        self.counters.fetches.load(Ordering::SeqCst)
    }

    pub fn materialized(&self) -> usize {
        self.counters.materialized.load(Ordering::SeqCst)
    }

    fn first_index(&self, chunk: usize) -> u64 {
        self.chunks[..chunk].iter().map(|c| c.len() as u64).sum()
    }
}

impl DataSource for MockSource {
    fn stream_descriptions(&self) -> Vec<StreamDescription> {
        (0..NUM_STREAMS)
            .map(|id| StreamDescription {
                id,
                name: format!("stream{}", id),
            })
            .collect()
    }

    fn chunk_descriptions(&self) -> Vec<ChunkDescription> {
        self.chunks
            .iter()
            .enumerate()
            .map(|(i, sizes)| ChunkDescription {
                id: ChunkId(i as u32),
                number_of_samples: sizes.iter().map(|&s| s as u64).sum(),
                number_of_sequences: sizes.len() as u32,
            })
            .collect()
    }

    fn sequence_descriptions(&self, chunk_id: ChunkId) -> Result<Vec<SequenceDescription>> {
        let chunk = chunk_id.0 as usize;
        let sizes = self
            .chunks
            .get(chunk)
            .ok_or_else(|| ReaderError::data_source(format!("unknown chunk {}", chunk_id)))?;
        let first = self.first_index(chunk);

        Ok(sizes
            .iter()
            .enumerate()
            .map(|(i, &samples)| SequenceDescription::new(first + i as u64, samples, chunk_id, i as u32))
            .collect())
    }

    fn get_chunk(&self, chunk_id: ChunkId) -> Result<ChunkPtr> {
        self.counters.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockChunk {
            sequences: self.sequence_descriptions(chunk_id)?,
            failing: self.failing.clone(),
            invalid: self.invalid.clone(),
            counters: self.counters.clone(),
        }))
    }
}

/// Global indices of a batch, read from the first stream.
pub fn batch_indices(batch: &super::types::Sequences) -> Vec<u64> {
    batch
        .data
        .first()
        .map(|stream| stream.iter().filter_map(|d| d.key()).collect())
        .unwrap_or_default()
}
