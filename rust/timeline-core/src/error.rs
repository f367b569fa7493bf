// rust/timeline-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaderError {

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invariant violated: {message}")]
    Invariant {
        message: String,
    },

    #[error("Data source error: {message}")]
    DataSource {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Materialization worker failed: {message}")]
    Worker {
        message: String,
    },

    #[error("State error: {message}")]
    State {
        message: String,
    },

    #[error("Number of invalid sequences ({count}) exceeded the allowed maximum ({max})")]
    InvalidSequences {
        count: u64,
        max: u64,
    },
}

pub type Result<T> = std::result::Result<T, ReaderError>;

// Convenience constructors
impl ReaderError {

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    pub fn data_source(message: impl Into<String>) -> Self {
        Self::DataSource {
            message: message.into(),
            source: None,
        }
    }

    pub fn data_source_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::DataSource {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    pub fn invalid_sequences(count: u64, max: u64) -> Self {
        Self::InvalidSequences { count, max }
    }
}
