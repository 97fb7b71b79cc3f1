//! Command-line definitions and command implementations.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use query_featurizer::{
    corpus::parse_line,
    pipeline::{self, DEFAULT_FEATURE_ARGS},
    preprocess::{preprocess, CsvColumns},
    CorpusTransformer, EncodedExample, Encoder, FeatureVocabulary, PipelineConfig,
    QueryFeaturizer,
};

/// Build LIBLINEAR training files from labeled queries
#[derive(Parser, Debug)]
#[command(name = "query-featurizer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a raw CSV export into a `label<TAB>query` training file
    Preprocess(PreprocessCommand),

    /// Build and save the vocabulary, then write the sparse training file
    Build(BuildCommand),

    /// Encode queries against a saved vocabulary
    Encode(EncodeCommand),

    /// Whole run with date-keyed artifacts (preprocess + build + log)
    Run(RunCommand),
}

/// Options shared by every command that extracts features
///
/// `encode` falls back to the settings stored in the vocabulary when neither
/// option is given, and refuses settings that differ from them.
#[derive(Args, Debug, Clone)]
pub struct FeatureArgs {
    /// Feature options, e.g. "-uni -bi -pos2 -stem -stprm" [default: "-uni -pos2 -stem -stprm"]
    #[arg(long, allow_hyphen_values = true)]
    pub features: Option<String>,

    /// Stopword file, one word per line
    #[arg(long, env = "QUERY_FEATURIZER_STOPWORDS")]
    pub stopwords: Option<PathBuf>,
}

impl FeatureArgs {
    fn options(&self) -> &str {
        self.features.as_deref().unwrap_or(DEFAULT_FEATURE_ARGS)
    }

    fn featurizer(&self) -> Result<QueryFeaturizer> {
        Ok(QueryFeaturizer::from_options(self.options(), self.stopwords.as_deref())?)
    }

    /// Featurizer for encoding against `vocabulary`
    fn featurizer_for(&self, vocabulary: &FeatureVocabulary) -> Result<QueryFeaturizer> {
        let Some(settings) = vocabulary.settings() else {
            return self.featurizer();
        };
        if self.features.is_none() && self.stopwords.is_none() {
            info!(%settings, "using the feature settings stored in the vocabulary");
            return Ok(QueryFeaturizer::from_settings(settings));
        }
        let featurizer = self.featurizer()?;
        vocabulary.check_extractor(&featurizer)?;
        Ok(featurizer)
    }
}

#[derive(Args, Debug, Clone)]
pub struct CsvArgs {
    /// 0-based column holding the label
    #[arg(long, default_value = "3")]
    pub label_column: usize,

    /// 0-based column holding the query text
    #[arg(long, default_value = "1")]
    pub query_column: usize,

    /// The first CSV row is a header
    #[arg(long, default_value = "false")]
    pub has_headers: bool,
}

impl CsvArgs {
    fn columns(&self) -> CsvColumns {
        CsvColumns {
            label: self.label_column,
            query: self.query_column,
            has_headers: self.has_headers,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PreprocessCommand {
    /// Raw CSV input
    #[arg(long)]
    pub raw: PathBuf,

    /// Training file to write
    #[arg(long)]
    pub train: PathBuf,

    #[command(flatten)]
    pub csv: CsvArgs,
}

impl PreprocessCommand {
    pub fn run(&self) -> Result<()> {
        let rows = preprocess(&self.raw, &self.train, &self.csv.columns())
            .with_context(|| format!("preprocessing {}", self.raw.display()))?;
        info!(rows, "preprocess done");
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct BuildCommand {
    /// Tab-separated training file
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Where to save the vocabulary
    #[arg(long)]
    pub vocabulary: PathBuf,

    /// Sparse training file to write
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    #[command(flatten)]
    pub features: FeatureArgs,

    /// Encode examples in parallel
    #[arg(long, default_value = "false")]
    pub parallel: bool,
}

impl BuildCommand {
    pub fn run(&self) -> Result<()> {
        let featurizer = self.features.featurizer()?;
        let (vocabulary, stats) = CorpusTransformer::new(&featurizer)
            .parallel(self.parallel)
            .run(&self.input, &self.vocabulary, &self.output)
            .with_context(|| format!("transforming {}", self.input.display()))?;
        info!(features = vocabulary.len(), examples = stats.examples, "build done");
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct EncodeCommand {
    /// Saved vocabulary
    #[arg(long)]
    pub vocabulary: PathBuf,

    #[command(flatten)]
    pub features: FeatureArgs,

    /// Encode a whole tab-separated file (requires --output)
    #[arg(long, short = 'i', conflicts_with = "query")]
    pub input: Option<PathBuf>,

    /// Output for --input
    #[arg(long, short = 'o', requires = "input")]
    pub output: Option<PathBuf>,

    /// Encode a single query and print it
    #[arg(long, short = 'q')]
    pub query: Option<String>,

    /// Label printed with --query
    #[arg(long, default_value = "0")]
    pub label: String,

    /// Encode examples in parallel
    #[arg(long, default_value = "false")]
    pub parallel: bool,
}

impl EncodeCommand {
    pub fn run(&self) -> Result<()> {
        let vocabulary = FeatureVocabulary::load(&self.vocabulary)
            .with_context(|| format!("loading vocabulary {}", self.vocabulary.display()))?;
        let featurizer = self.features.featurizer_for(&vocabulary)?;

        if let Some(input) = &self.input {
            let Some(output) = &self.output else {
                bail!("--input requires --output");
            };
            let stats = CorpusTransformer::new(&featurizer)
                .parallel(self.parallel)
                .transform(input, output, &vocabulary)
                .with_context(|| format!("encoding {}", input.display()))?;
            info!(examples = stats.examples, dropped = stats.dropped_features, "encode done");
            return Ok(());
        }

        let encoder = Encoder::new(&vocabulary, &featurizer);
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Some(query) = &self.query {
            let encoded: EncodedExample = encoder.encode_query(&self.label, query);
            writeln!(out, "{encoded}")?;
        } else {
            // `label<TAB>query` lines from stdin
            for (i, line) in io::stdin().lock().lines().enumerate() {
                let line = line.context("reading stdin")?;
                let example = parse_line(i + 1, &line)?;
                let encoded: EncodedExample = encoder.encode(&example);
                writeln!(out, "{encoded}")?;
            }
        }
        out.flush()?;
        let dropped = encoder.dropped_features();
        if dropped > 0 {
            info!(dropped, "features not in the vocabulary were dropped");
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunCommand {
    /// Raw CSV export; skip preprocessing when omitted
    #[arg(long)]
    pub raw: Option<PathBuf>,

    /// Tab-separated training file
    #[arg(long, default_value = "data/training")]
    pub train: PathBuf,

    /// Directory for vocabulary, training file, model and log
    #[arg(long, short = 'd', default_value = "models", env = "QUERY_FEATURIZER_MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Date key for artifact names (default: today, YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    #[command(flatten)]
    pub features: FeatureArgs,

    #[command(flatten)]
    pub csv: CsvArgs,

    /// Encode examples in parallel
    #[arg(long, default_value = "false")]
    pub parallel: bool,
}

impl RunCommand {
    pub fn run(&self) -> Result<()> {
        let date = self
            .date
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
        std::fs::create_dir_all(&self.model_dir)
            .with_context(|| format!("creating {}", self.model_dir.display()))?;

        let config = PipelineConfig {
            raw_file: self.raw.clone(),
            train_file: self.train.clone(),
            model_dir: self.model_dir.clone(),
            stopword_file: self.features.stopwords.clone(),
            feature_args: self.features.options().to_string(),
            date,
            csv_columns: self.csv.columns(),
            parallel: self.parallel,
        };
        let report = pipeline::run(&config)?;
        info!(
            vocabulary = %report.artifacts.vocabulary.display(),
            transformed = %report.artifacts.transformed.display(),
            model = %report.artifacts.model.display(),
            "hand the transformed file to the trainer"
        );
        Ok(())
    }
}
