// rust/timeline-core/src/timeline/reader.rs

use std::sync::Arc;

use super::cleaner::SequenceCleaner;
use super::epoch::{EpochConfig, EpochLimit, WorkerConfig};
use super::materialize::Materializer;
use super::state::{StateSnapshot, POSITION_IN_WINDOW, SAMPLES_SEEN, SWEEP_INDEX};
use super::types::{
    ChunkDescription, DataSource, SequenceDescription, Sequences, StreamDescription,
};
use super::window::{SequentialWindow, WindowStrategy};
use crate::config::ReaderConfig;
use crate::error::{Result, ReaderError};

/// Sequence descriptions chosen for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub sequences: Vec<SequenceDescription>,
    pub end_of_sweep: bool,
    pub end_of_epoch: bool,
}

impl Selection {
    pub fn num_samples(&self) -> u64 {
        self.sequences
            .iter()
            .map(|s| s.number_of_samples as u64)
            .sum()
    }
}

/// Reads sequences in source order over a sliding window.
///
/// The reader keeps a window of sequence descriptions produced by its
/// [`WindowStrategy`], tracks sweeps and samples consumed in the current
/// epoch, and materializes selected sequences through a chunk cache.
///
/// # Example
///
/// ```ignore
/// let mut reader = LocalTimelineReader::sequential(source, &ReaderConfig::default())?;
/// reader.start_epoch(&EpochConfig::full_sweep())?;
///
/// loop {
///     let batch = reader.get_next_sequences(256)?;
///     // feed batch.data to the model
///     if batch.end_of_epoch {
///         break;
///     }
/// }
/// ```
pub struct LocalTimelineReader {
    source: Arc<dyn DataSource>,
    strategy: Box<dyn WindowStrategy>,
    chunks: Vec<ChunkDescription>,
    streams: Vec<StreamDescription>,

    window: Vec<SequenceDescription>,
    position_in_window: usize,
    sweep_index: u64,
    samples_seen: u64,

    /// Strategy state right before the current window was filled.
    window_state: StateSnapshot,
    /// Strategy state before the first refill of an epoch.
    initial_state: StateSnapshot,

    epoch: Option<EpochConfig>,
    limit: Option<EpochLimit>,
    workers: WorkerConfig,
    materializer: Materializer,
    cleaner: SequenceCleaner,
}

impl LocalTimelineReader {
    /// Creates a reader over `source` using the given window strategy.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configuration is invalid or the
    /// source contains no sequences.
    pub fn new(
        source: Arc<dyn DataSource>,
        strategy: Box<dyn WindowStrategy>,
        config: &ReaderConfig,
    ) -> Result<Self> {
        config.validate()?;

        let chunks = source.chunk_descriptions();
        let total_sequences: u64 = chunks.iter().map(|c| c.number_of_sequences as u64).sum();
        if total_sequences == 0 {
            return Err(ReaderError::config(
                "expected input to contain samples, but the data source has no sequences",
            ));
        }

        let streams = source.stream_descriptions();
        let initial_state = strategy.inner_state();

        tracing::debug!(
            "Created {} timeline reader over {} chunks and {} streams",
            strategy.name(),
            chunks.len(),
            streams.len()
        );

        Ok(Self {
            source,
            strategy,
            chunks,
            streams,
            window: Vec::new(),
            position_in_window: 0,
            sweep_index: 0,
            samples_seen: 0,
            window_state: initial_state.clone(),
            initial_state,
            epoch: None,
            limit: None,
            workers: WorkerConfig::default(),
            materializer: Materializer::new(&config.materialize),
            cleaner: SequenceCleaner::new(config.cleaner.max_invalid_sequences),
        })
    }

    /// Creates a reader that walks chunks in source order.
    pub fn sequential(source: Arc<dyn DataSource>, config: &ReaderConfig) -> Result<Self> {
        let strategy = SequentialWindow::new(config.window.chunks_per_refill);
        Self::new(source, Box::new(strategy), config)
    }

    /// Starts the epoch described by `config`.
    ///
    /// Only epoch index 0 is supported. A sample-based epoch size is split
    /// across workers; the position is reset to the start of the data.
    pub fn start_epoch(&mut self, config: &EpochConfig) -> Result<()> {
        if config.epoch_index != 0 {
            return Err(ReaderError::config(format!(
                "starting at epoch index {} is not supported by the local timeline reader",
                config.epoch_index
            )));
        }

        let limit = EpochLimit::from_config(config)?;
        tracing::info!(
            "Starting epoch with limit {:?} (worker {} of {})",
            limit,
            config.workers.worker_rank,
            config.workers.number_of_workers
        );

        self.epoch = Some(*config);
        self.limit = Some(limit);
        self.workers = config.workers;
        self.sweep_index = 0;
        self.samples_seen = 0;
        self.position_in_window = 0;
        self.strategy.set_inner_state(&self.initial_state)?;

        self.window.clear();
        self.window_state = self.strategy.inner_state();
        self.refill_window()
    }

    /// Replaces worker count and rank without restarting the epoch.
    ///
    /// A sample-based epoch limit is re-partitioned for the new workers.
    /// Samples already seen keep counting against the new local share.
    pub fn set_configuration(&mut self, workers: WorkerConfig) -> Result<()> {
        workers.validate()?;

        if let Some(epoch) = self.epoch.as_mut() {
            epoch.workers = workers;
            let limit = EpochLimit::from_config(epoch)?;
            tracing::info!(
                "Reconfigured epoch limit to {:?} (worker {} of {})",
                limit,
                workers.worker_rank,
                workers.number_of_workers
            );
            self.limit = Some(limit);
        }

        self.workers = workers;
        Ok(())
    }

    /// Current worker configuration.
    pub fn worker_config(&self) -> WorkerConfig {
        self.workers
    }

    pub fn stream_descriptions(&self) -> &[StreamDescription] {
        &self.streams
    }

    pub fn sweep_index(&self) -> u64 {
        self.sweep_index
    }

    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    /// Whether the current epoch's limit has been reached.
    pub fn is_end_reached(&self) -> bool {
        self.limit
            .map_or(false, |limit| limit.is_reached(self.sweep_index, self.samples_seen))
    }

    /// Returns the next batch of at most `sample_count` samples.
    ///
    /// The first sequence of a batch is always returned, even if it alone
    /// exceeds `sample_count`. Once the epoch is exhausted, empty batches
    /// with `end_of_epoch` set are returned.
    pub fn get_next_sequences(&mut self, sample_count: usize) -> Result<Sequences> {
        if sample_count == 0 {
            return Err(ReaderError::config("sample count must not be zero"));
        }
        self.require_epoch()?;

        if self.is_end_reached() {
            return Ok(Sequences {
                data: Vec::new(),
                end_of_sweep: false,
                end_of_epoch: true,
            });
        }

        let selection = self.get_next_sequence_descriptions(sample_count)?;
        let mut result = Sequences {
            data: Vec::new(),
            end_of_sweep: selection.end_of_sweep,
            end_of_epoch: selection.end_of_epoch,
        };

        if selection.sequences.is_empty() {
            return Ok(result);
        }

        result.data = self.materializer.materialize(
            self.source.as_ref(),
            &selection.sequences,
            self.streams.len(),
        )?;

        self.cleaner.clean(&mut result)?;
        Ok(result)
    }

    /// Selects the descriptions of the next batch and advances the position.
    pub fn get_next_sequence_descriptions(&mut self, max_sample_count: usize) -> Result<Selection> {
        if max_sample_count == 0 {
            return Err(ReaderError::config("max sample count must not be zero"));
        }
        if max_sample_count > i32::MAX as usize {
            return Err(ReaderError::config(format!(
                "local size of the minibatch cannot exceed {} samples",
                i32::MAX
            )));
        }
        self.require_epoch()?;

        let max_sample_count = max_sample_count as u64;
        let mut selection = Selection::default();
        let mut samples_loaded = 0u64;

        while samples_loaded < max_sample_count && !self.is_end_reached() {
            let sequence = self.current_sequence()?;
            if sequence.is_end_of_sweep() {
                self.sweep_index += 1;
                selection.end_of_sweep = true;
                self.move_to_next_sequence()?;
                continue;
            }

            let length = sequence.number_of_samples as u64;
            if !selection.sequences.is_empty() && samples_loaded + length > max_sample_count {
                break;
            }

            selection.sequences.push(sequence);
            samples_loaded += length;
            self.samples_seen += length;
            self.move_to_next_sequence()?;
        }

        selection.end_of_epoch = self.is_end_reached();
        Ok(selection)
    }

    /// Snapshot of the current position.
    pub fn get_state(&self) -> StateSnapshot {
        let mut state = self.window_state.clone();
        state.insert(SWEEP_INDEX, self.sweep_index);
        state.insert(POSITION_IN_WINDOW, self.position_in_window as u64);
        state.insert(SAMPLES_SEEN, self.samples_seen);
        state
    }

    /// Restores a position captured by `get_state` and rebuilds the window.
    pub fn set_state(&mut self, state: &StateSnapshot) -> Result<()> {
        let sweep_index = state.require(SWEEP_INDEX)?;
        let samples_seen = state.require(SAMPLES_SEEN)?;
        let position_in_window = state.require(POSITION_IN_WINDOW)? as usize;

        self.strategy.set_inner_state(state)?;
        self.window_state = self.strategy.inner_state();

        self.window.clear();
        self.refill_window()?;

        if position_in_window >= self.window.len() {
            return Err(ReaderError::state(format!(
                "position {} outside of restored window of {} entries",
                position_in_window,
                self.window.len()
            )));
        }

        self.sweep_index = sweep_index;
        self.samples_seen = samples_seen;
        self.position_in_window = position_in_window;
        Ok(())
    }

    fn require_epoch(&self) -> Result<EpochLimit> {
        self.limit
            .ok_or_else(|| ReaderError::config("start_epoch must be called before reading"))
    }

    fn current_sequence(&self) -> Result<SequenceDescription> {
        self.window
            .get(self.position_in_window)
            .copied()
            .ok_or_else(|| {
                ReaderError::invariant(format!(
                    "position {} outside of window of {} entries",
                    self.position_in_window,
                    self.window.len()
                ))
            })
    }

    fn move_to_next_sequence(&mut self) -> Result<()> {
        if self.position_in_window + 1 < self.window.len() {
            self.position_in_window += 1;
            return Ok(());
        }

        self.window.clear();
        self.window_state = self.strategy.inner_state();
        self.refill_window()?;
        self.position_in_window = 0;
        Ok(())
    }

    fn refill_window(&mut self) -> Result<()> {
        self.strategy
            .refill(self.source.as_ref(), &self.chunks, &mut self.window)?;

        if self.window.is_empty() {
            return Err(ReaderError::invariant(format!(
                "{} window strategy produced an empty window",
                self.strategy.name()
            )));
        }
        Ok(())
    }
}
