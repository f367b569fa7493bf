// rust/timeline-core/src/timeline/cleaner.rs

use super::types::Sequences;
use crate::error::{Result, ReaderError};

/// Removes invalid sequences from batches.
///
/// A sequence is invalid if its data in any stream reports itself invalid.
/// Removed sequences are counted over the lifetime of the cleaner; once the
/// total exceeds `max_invalid_sequences`, cleaning fails.
#[derive(Debug, Clone)]
pub struct SequenceCleaner {
    max_invalid_sequences: u64,
    invalid_so_far: u64,
}

impl SequenceCleaner {
    pub fn new(max_invalid_sequences: u64) -> Self {
        Self {
            max_invalid_sequences,
            invalid_so_far: 0,
        }
    }

    /// Total number of sequences removed so far.
    pub fn invalid_so_far(&self) -> u64 {
        self.invalid_so_far
    }

    pub fn clean(&mut self, sequences: &mut Sequences) -> Result<()> {
        let count = sequences.num_sequences();
        let valid: Vec<bool> = (0..count)
            .map(|i| {
                sequences
                    .data
                    .iter()
                    .all(|stream| stream.get(i).map_or(false, |d| d.is_valid()))
            })
            .collect();

        let removed = valid.iter().filter(|v| !**v).count() as u64;
        if removed == 0 {
            return Ok(());
        }

        for stream in &mut sequences.data {
            let mut keep = valid.iter();
            stream.retain(|_| keep.next().copied().unwrap_or(false));
        }

        self.invalid_so_far += removed;
        tracing::warn!(
            "Removed {} invalid sequence(s) from batch ({} so far)",
            removed,
            self.invalid_so_far
        );

        if self.invalid_so_far > self.max_invalid_sequences {
            return Err(ReaderError::invalid_sequences(
                self.invalid_so_far,
                self.max_invalid_sequences,
            ));
        }
        Ok(())
    }
}
