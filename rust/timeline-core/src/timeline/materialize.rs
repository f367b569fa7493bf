// rust/timeline-core/src/timeline/materialize.rs

//! Materialization of selected sequence descriptions into per-stream data.
//!
//! Chunks referenced by a batch are kept in a cache until the next batch
//! needs a different set. Resolving sequences against their chunks can be
//! spread over scoped worker threads; the result keeps selection order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use super::types::{ChunkId, ChunkPtr, DataSource, SequenceDataPtr, SequenceDescription};
use crate::config::MaterializeConfig;
use crate::error::{Result, ReaderError};

type ChunkMap = BTreeMap<ChunkId, ChunkPtr>;

/// Records the first failure of a set of tasks.
#[derive(Default)]
struct ErrorCapture {
    first: Mutex<Option<ReaderError>>,
}

impl ErrorCapture {
    fn safe_run(&self, task: impl FnOnce() -> Result<()>) {
        if let Err(e) = task() {
            let mut first = self.first.lock().unwrap_or_else(|p| p.into_inner());
            if first.is_none() {
                *first = Some(e);
            }
        }
    }

    fn rethrow_if_happened(self) -> Result<()> {
        let first = self.first.into_inner().unwrap_or_else(|p| p.into_inner());
        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Turns sequence descriptions into stream-major sequence data.
pub struct Materializer {
    chunks: ChunkMap,
    multithreaded: bool,
    threads: usize,
}

impl Materializer {
    pub fn new(config: &MaterializeConfig) -> Self {
        Self {
            chunks: ChunkMap::new(),
            multithreaded: config.multithreaded,
            threads: config.threads.max(1),
        }
    }

    /// Ids of the chunks currently cached.
    pub fn cached_chunk_ids(&self) -> Vec<ChunkId> {
        self.chunks.keys().copied().collect()
    }

    /// Materialize `selection` into `data[stream][sequence]`.
    pub fn materialize(
        &mut self,
        source: &dyn DataSource,
        selection: &[SequenceDescription],
        num_streams: usize,
    ) -> Result<Vec<Vec<SequenceDataPtr>>> {
        self.update_cache(source, selection)?;

        let rows = if self.multithreaded && self.threads > 1 && selection.len() > 1 {
            self.resolve_parallel(selection)?
        } else {
            selection
                .iter()
                .map(|s| resolve(&self.chunks, s))
                .collect::<Result<Vec<_>>>()?
        };

        let mut data: Vec<Vec<SequenceDataPtr>> = (0..num_streams)
            .map(|_| Vec::with_capacity(selection.len()))
            .collect();

        for (row, description) in rows.into_iter().zip(selection) {
            if row.len() != num_streams {
                return Err(ReaderError::data_source(format!(
                    "sequence {} has data for {} streams, expected {}",
                    description.index,
                    row.len(),
                    num_streams
                )));
            }
            for (stream, item) in data.iter_mut().zip(row) {
                stream.push(item);
            }
        }

        Ok(data)
    }

    /// Replace the cache with exactly the chunks `selection` refers to,
    /// reusing cached handles and fetching the rest.
    fn update_cache(
        &mut self,
        source: &dyn DataSource,
        selection: &[SequenceDescription],
    ) -> Result<()> {
        let mut chunks = ChunkMap::new();
        for sequence in selection {
            if chunks.contains_key(&sequence.chunk_id) {
                continue;
            }

            let chunk = match self.chunks.get(&sequence.chunk_id) {
                Some(cached) => {
                    tracing::debug!("Reusing cached chunk {}", sequence.chunk_id);
                    cached.clone()
                }
                None => {
                    tracing::debug!("Fetching chunk {}", sequence.chunk_id);
                    source.get_chunk(sequence.chunk_id)?
                }
            };
            chunks.insert(sequence.chunk_id, chunk);
        }

        // Old handles are released here; readers holding clones keep theirs.
        self.chunks = chunks;
        Ok(())
    }

    fn resolve_parallel(&self, selection: &[SequenceDescription]) -> Result<Vec<Vec<SequenceDataPtr>>> {
        let slots: Vec<OnceLock<Vec<SequenceDataPtr>>> =
            (0..selection.len()).map(|_| OnceLock::new()).collect();
        let next = AtomicUsize::new(0);
        let capture = ErrorCapture::default();
        let workers = self.threads.min(selection.len());
        let chunks = &self.chunks;

        crossbeam::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|_| loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    if i >= selection.len() {
                        break;
                    }
                    capture.safe_run(|| {
                        let row = resolve(chunks, &selection[i])?;
                        // Each index is handed out once, so the slot is empty.
                        let _ = slots[i].set(row);
                        Ok(())
                    });
                });
            }
        })
        .map_err(|_| ReaderError::worker("materialization worker panicked"))?;

        capture.rethrow_if_happened()?;

        slots
            .into_iter()
            .map(|slot| {
                slot.into_inner()
                    .ok_or_else(|| ReaderError::invariant("sequence slot left empty"))
            })
            .collect()
    }
}

fn resolve(chunks: &ChunkMap, sequence: &SequenceDescription) -> Result<Vec<SequenceDataPtr>> {
    let chunk = chunks.get(&sequence.chunk_id).ok_or_else(|| {
        ReaderError::invariant(format!(
            "chunk {} requested for sequence {} is not cached",
            sequence.chunk_id, sequence.index
        ))
    })?;
    chunk.get_sequence(sequence.index_in_chunk)
}
