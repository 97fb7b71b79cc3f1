//! End-to-end training-data preparation run.
//!
//! One `PipelineConfig` is built per run and only read afterwards. It names
//! every input and derives the date-keyed artifact paths the external trainer
//! works with.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    corpus::{CorpusTransformer, TransformStats},
    error::Result,
    featurizer::QueryFeaturizer,
    preprocess::{preprocess, CsvColumns},
    utils::append_to,
};

/// Feature arguments used when none are given
pub const DEFAULT_FEATURE_ARGS: &str = "-uni -pos2 -stem -stprm";

/// Settings for one run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// raw CSV export; when `None` the training file must already exist
    pub raw_file: Option<PathBuf>,
    /// tab-separated training file
    pub train_file: PathBuf,
    /// directory for vocabulary, transformed file, model and log
    pub model_dir: PathBuf,
    /// stopword list, one word per line
    pub stopword_file: Option<PathBuf>,
    /// feature option string, see `FeatureConfig::parse_options`
    pub feature_args: String,
    /// date key for this run's artifacts, e.g. `2015-06-28`
    pub date: String,
    pub csv_columns: CsvColumns,
    /// encode on the rayon pool
    pub parallel: bool,
}

impl PipelineConfig {
    pub fn new(train_file: impl Into<PathBuf>, model_dir: impl Into<PathBuf>, date: impl Into<String>) -> Self {
        Self {
            raw_file: None,
            train_file: train_file.into(),
            model_dir: model_dir.into(),
            stopword_file: None,
            feature_args: DEFAULT_FEATURE_ARGS.to_string(),
            date: date.into(),
            csv_columns: CsvColumns::default(),
            parallel: false,
        }
    }

    pub fn artifacts(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.model_dir, &self.date)
    }

    /// Build the featurizer this run uses for both vocabulary and encoding
    pub fn featurizer(&self) -> Result<QueryFeaturizer> {
        QueryFeaturizer::from_options(&self.feature_args, self.stopword_file.as_deref())
    }
}

/// Date-keyed output locations under the model directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// persisted vocabulary, `features_<date>`
    pub vocabulary: PathBuf,
    /// sparse training file, `training_file_<date>`
    pub transformed: PathBuf,
    /// where the external trainer stores its model, `model_<date>`
    pub model: PathBuf,
    /// append-only run log
    pub log: PathBuf,
}

impl ArtifactPaths {
    pub fn new(model_dir: &Path, date: &str) -> Self {
        Self {
            vocabulary: model_dir.join(format!("features_{date}")),
            transformed: model_dir.join(format!("training_file_{date}")),
            model: model_dir.join(format!("model_{date}")),
            log: model_dir.join("training_log"),
        }
    }
}

/// Outcome of `run`
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub artifacts: ArtifactPaths,
    pub preprocessed_rows: Option<usize>,
    pub vocabulary_size: usize,
    pub stats: TransformStats,
}

/// Preprocess (optional), build and persist the vocabulary, write the
/// transformed training file and record the feature arguments in the log
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    let artifacts = config.artifacts();
    let featurizer = config.featurizer()?;

    let preprocessed_rows = match &config.raw_file {
        Some(raw) => Some(preprocess(raw, &config.train_file, &config.csv_columns)?),
        None => None,
    };

    append_to(
        &artifacts.log,
        &format!(
            "Feature Arguments: {}\n-------------------------------\n",
            config.feature_args
        ),
    )?;

    let (vocabulary, stats) = CorpusTransformer::new(&featurizer)
        .parallel(config.parallel)
        .run(&config.train_file, &artifacts.vocabulary, &artifacts.transformed)?;

    info!(
        date = %config.date,
        features = vocabulary.len(),
        examples = stats.examples,
        model = %artifacts.model.display(),
        "training data ready"
    );

    Ok(PipelineReport {
        artifacts,
        preprocessed_rows,
        vocabulary_size: vocabulary.len(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_are_keyed_by_date() {
        let a = ArtifactPaths::new(Path::new("models"), "2015-06-28");
        assert_eq!(a.vocabulary, Path::new("models/features_2015-06-28"));
        assert_eq!(a.transformed, Path::new("models/training_file_2015-06-28"));
        assert_eq!(a.model, Path::new("models/model_2015-06-28"));
        assert_eq!(a.log, Path::new("models/training_log"));
    }

    #[test]
    fn bad_feature_args_fail_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::new(dir.path().join("training"), dir.path(), "d");
        config.feature_args = "-nope".into();
        assert!(run(&config).is_err());
        assert!(!config.artifacts().log.exists());
    }

    #[test]
    fn featurizer_matches_the_cli_one() {
        let dir = tempfile::tempdir().unwrap();
        let stp = dir.path().join("english.stp");
        std::fs::write(&stp, "the\n").unwrap();
        let mut config = PipelineConfig::new(dir.path().join("training"), dir.path(), "d");
        config.stopword_file = Some(stp.clone());

        let from_config = config.featurizer().unwrap();
        let direct = QueryFeaturizer::from_options(DEFAULT_FEATURE_ARGS, Some(stp.as_path())).unwrap();
        assert_eq!(from_config.config(), direct.config());
        assert_eq!(from_config.stopwords(), direct.stopwords());
        assert!(from_config.stopwords().contains("the"));
    }
}
