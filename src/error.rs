//! Error types for the featurization pipeline.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that abort a pipeline stage.
///
/// Features that are missing from the vocabulary at encode time are not
/// errors; they are dropped and counted by the encoder.
#[derive(Error, Debug)]
pub enum FeaturizeError {
    /// A corpus line or CSV row has no tab-separated query or no valid label.
    #[error("malformed line {line}: expected `label<TAB>query`, got {content:?}")]
    Parse {
        /// 1-based line number in the input file.
        line: usize,
        /// The offending line as read.
        content: String,
    },

    /// A file could not be read or written.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The vocabulary file could not be encoded or decoded.
    #[error("vocabulary serialization failed: {0}")]
    Vocabulary(#[from] serde_cbor::Error),

    /// The vocabulary file decoded but breaks the index invariants.
    #[error("corrupt vocabulary: {0}")]
    CorruptVocabulary(String),

    /// The raw CSV input could not be read.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid feature options or preprocessing settings, or feature settings
    /// that differ from the ones a vocabulary was built with.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FeaturizeError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// A specialized Result type for featurization.
pub type Result<T> = std::result::Result<T, FeaturizeError>;
