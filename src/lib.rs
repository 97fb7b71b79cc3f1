/// This crate turns labeled queries into LIBLINEAR sparse training vectors
/// with a stable, persisted feature vocabulary.
pub mod corpus;
pub mod encoder;
pub mod error;
pub mod featurizer;
pub mod pipeline;
pub mod preprocess;
pub mod utils;
pub mod vocabulary;

/// Feature Vocabulary
/// The ordered set of every feature seen in a training corpus.
/// A feature's index is its position + 1, which is exactly the index written
/// into the sparse training file.
///
/// It is built once from the full corpus, persisted, and loaded read-only by
/// every encoder afterwards (training and prediction).
///
/// # Serialization
/// Supported (CBOR via `dump` / `load`), together with the extractor settings
/// the vocabulary was built with.
/// The feature order is preserved exactly; loading rejects duplicated
/// features and unknown layout versions.
pub use vocabulary::FeatureVocabulary;

/// Example Encoder
/// Maps one labeled query onto its feature indices against a fixed
/// vocabulary and produces an `EncodedExample`.
///
/// Indices are deduplicated and strictly ascending, every value is 1
/// (presence only). Features missing from the vocabulary are dropped, never
/// an error; the encoder counts them for diagnostics.
pub use encoder::{EncodedExample, Encoder};

/// Corpus Transformer
/// Drives the vocabulary build and the encoder over a whole training file.
/// - `run`: build + persist vocabulary, then write the transformed file
/// - `transform`: encode against an already persisted vocabulary
///
/// Output is written all-or-nothing. A malformed line aborts the run with its
/// line number and no output file is replaced.
pub use corpus::{CorpusTransformer, LabeledExample, TransformStats};

/// Feature extraction
/// `FeatureExtractor` is the seam the vocabulary builder and encoder call.
/// `QueryFeaturizer` is the default implementation, configured by a
/// `FeatureConfig` option string such as `-uni -pos2 -stem -stprm` and a
/// `StopWords` list. `ExtractorSettings` is what a vocabulary records about
/// the featurizer that built it.
pub use featurizer::{ExtractorSettings, FeatureConfig, FeatureExtractor, QueryFeaturizer, StopWords};

/// Error type and Result alias shared by the whole crate
pub use error::{FeaturizeError, Result};

/// Pipeline configuration and date-keyed artifact paths
pub use pipeline::{ArtifactPaths, PipelineConfig, PipelineReport};
