// rust/timeline-core/src/lib.rs

//! Local Timeline Reader - Core Library
//!
//! This crate feeds chunked sequence data to distributed training workers
//! in bounded batches, tracking sweep and epoch boundaries and exposing a
//! small snapshot of its position for checkpoint and resume.

pub mod config;
pub mod error;

// Re-export commonly used types for convenience
pub use config::ReaderConfig;
pub use error::{ReaderError, Result};

pub mod timeline;
pub use timeline::{
    DataSource, EpochConfig, EpochSize, LocalTimelineReader, Sequences, StateSnapshot,
    WindowStrategy,
};
