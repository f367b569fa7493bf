// rust/timeline-core/src/timeline/mod.rs

//! Local timeline reading of chunked sequence data.
//!
//! This module feeds sequences to a training loop in bounded batches,
//! in the order the data source provides them. A window of sequence
//! descriptions is refilled chunk by chunk, sweeps and epochs are tracked
//! as the window is consumed, and selected sequences are materialized
//! through a cache of the chunks the previous batch used.
//!
//! # Example
//!
//! ```ignore
//! use timeline_core::timeline::{EpochConfig, EpochSize, LocalTimelineReader};
//! use timeline_core::ReaderConfig;
//!
//! let config = ReaderConfig::from_file("reader.toml")?.with_env_overrides();
//! let mut reader = LocalTimelineReader::sequential(source, &config)?;
//!
//! // 10k samples split over 4 workers, this is rank 1
//! let epoch = EpochConfig::full_sweep()
//!     .with_size(EpochSize::Samples(10_000))
//!     .with_workers(4, 1);
//! reader.start_epoch(&epoch)?;
//!
//! let batch = reader.get_next_sequences(512)?;
//! let checkpoint = reader.get_state();
//! ```

mod cleaner;
mod epoch;
mod materialize;
mod reader;
mod state;
mod types;
mod window;

#[cfg(test)]
mod mock;

pub use cleaner::SequenceCleaner;
pub use epoch::{local_sample_count, EpochConfig, EpochLimit, EpochSize, WorkerConfig};
pub use materialize::Materializer;
pub use reader::{LocalTimelineReader, Selection};
pub use state::{StateSnapshot, POSITION_IN_WINDOW, SAMPLES_SEEN, SWEEP_INDEX};
pub use types::{
    Chunk, ChunkDescription, ChunkId, ChunkPtr, DataSource, SequenceData, SequenceDataPtr,
    SequenceDescription, Sequences, StreamDescription,
};
pub use window::{SequentialWindow, WindowStrategy, CHUNK_POSITION};
