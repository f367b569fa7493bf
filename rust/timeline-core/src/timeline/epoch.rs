// rust/timeline-core/src/timeline/epoch.rs

//! Epoch configuration and partitioning of epoch limits across workers.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ReaderError};

/// Size of an epoch as requested by the training loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochSize {
    /// Global number of samples, shared by all workers.
    Samples(u64),
    /// Number of full sweeps over the data.
    Sweeps(u64),
    /// All data once. Equivalent to a single sweep.
    FullSweep,
}

/// Runtime parameters that describe this worker's place in a distributed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub number_of_workers: u32,
    pub worker_rank: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            number_of_workers: 1,
            worker_rank: 0,
        }
    }
}

impl WorkerConfig {
    pub fn new(number_of_workers: u32, worker_rank: u32) -> Self {
        Self {
            number_of_workers,
            worker_rank,
        }
    }

    /// Validate worker count and rank.
    pub fn validate(&self) -> Result<()> {
        if self.number_of_workers == 0 {
            return Err(ReaderError::config(
                "number_of_workers must be greater than 0",
            ));
        }
        if self.worker_rank >= self.number_of_workers {
            return Err(ReaderError::config(format!(
                "worker_rank {} out of range (number of workers: {})",
                self.worker_rank, self.number_of_workers
            )));
        }
        Ok(())
    }
}

/// Configuration passed to `start_epoch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochConfig {
    pub epoch_index: u64,
    pub size: EpochSize,
    #[serde(flatten)]
    pub workers: WorkerConfig,
}

impl EpochConfig {
    /// First epoch over the full data on a single worker.
    pub fn full_sweep() -> Self {
        Self {
            epoch_index: 0,
            size: EpochSize::FullSweep,
            workers: WorkerConfig::default(),
        }
    }

    pub fn with_size(mut self, size: EpochSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_workers(mut self, number_of_workers: u32, worker_rank: u32) -> Self {
        self.workers = WorkerConfig::new(number_of_workers, worker_rank);
        self
    }
}

/// The local limit a reader enforces for the current epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochLimit {
    Samples(u64),
    Sweeps(u64),
}

impl EpochLimit {
    /// Normalize an epoch size into this worker's local limit.
    pub fn from_config(config: &EpochConfig) -> Result<Self> {
        config.workers.validate()?;

        Ok(match config.size {
            EpochSize::FullSweep => EpochLimit::Sweeps(1),
            EpochSize::Sweeps(sweeps) => EpochLimit::Sweeps(sweeps),
            EpochSize::Samples(total) => EpochLimit::Samples(local_sample_count(
                total,
                config.workers.number_of_workers,
                config.workers.worker_rank,
            )),
        })
    }

    /// Whether the limit is reached for the given position.
    pub fn is_reached(&self, sweep_index: u64, samples_seen: u64) -> bool {
        match *self {
            EpochLimit::Sweeps(sweeps) => sweep_index >= sweeps,
            EpochLimit::Samples(samples) => samples_seen >= samples,
        }
    }
}

/// Share of `total` samples assigned to `rank` out of `workers`.
///
/// Ranks below `total % workers` get one extra sample.
pub fn local_sample_count(total: u64, workers: u32, rank: u32) -> u64 {
    let workers = workers as u64;
    let extra = if total % workers > rank as u64 { 1 } else { 0 };
    total / workers + extra
}
