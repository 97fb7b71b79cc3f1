pub mod stem;
pub mod stopwords;

use std::{fmt, path::Path};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{FeaturizeError, Result};

pub use stopwords::StopWords;

/// Feature extraction seam
///
/// Returns the set of features of one query. The returned order is the
/// extraction order, which the vocabulary builder uses as first-seen order,
/// so implementations must be deterministic.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, query: &str) -> IndexSet<String>;

    /// Settings recorded in a vocabulary built with this extractor
    ///
    /// `None` means the extractor cannot describe itself, and no
    /// compatibility check is made against it.
    fn settings(&self) -> Option<ExtractorSettings> {
        None
    }
}

/// Which feature families to extract
///
/// Parsed from an option string like `-uni -pos2 -stem -stprm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// `-uni`: every token as is
    pub unigrams: bool,
    /// `-bi`: adjacent token pairs, `bi:<a>_<b>`
    pub bigrams: bool,
    /// `-posN`: the first N tokens tagged with their position, `pos<k>:<token>`
    pub positions: usize,
    /// `-stem`: stemmed tokens, `stem:<stem>`
    pub stems: bool,
    /// `-stprm`: drop stopwords before forming any feature
    pub remove_stopwords: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            unigrams: true,
            bigrams: false,
            positions: 0,
            stems: false,
            remove_stopwords: false,
        }
    }
}

impl FeatureConfig {
    /// Parse an option string
    ///
    /// With no feature family selected (empty string, or only `-stprm`)
    /// unigrams are enabled.
    pub fn parse_options(options: &str) -> Result<Self> {
        let mut config = Self {
            unigrams: false,
            ..Self::default()
        };
        for opt in options.split_whitespace() {
            match opt {
                "-uni" => config.unigrams = true,
                "-bi" => config.bigrams = true,
                "-stem" => config.stems = true,
                "-stprm" => config.remove_stopwords = true,
                "-pos" => config.positions = 1,
                _ => match opt.strip_prefix("-pos").map(str::parse::<usize>) {
                    Some(Ok(n)) => config.positions = n,
                    _ => {
                        return Err(FeaturizeError::Config(format!(
                            "unknown feature option `{opt}`"
                        )))
                    }
                },
            }
        }
        if !config.unigrams && !config.bigrams && config.positions == 0 && !config.stems {
            config.unigrams = true;
        }
        Ok(config)
    }

    /// Canonical option string, parses back to the same config
    pub fn to_options(&self) -> String {
        let mut opts = Vec::new();
        if self.unigrams {
            opts.push("-uni".to_string());
        }
        if self.bigrams {
            opts.push("-bi".to_string());
        }
        if self.positions > 0 {
            opts.push(format!("-pos{}", self.positions));
        }
        if self.stems {
            opts.push("-stem".to_string());
        }
        if self.remove_stopwords {
            opts.push("-stprm".to_string());
        }
        opts.join(" ")
    }
}

/// What a vocabulary remembers about the featurizer that built it
///
/// Stopwords are only kept when `-stprm` is on; otherwise they do not change
/// the extracted features and are left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorSettings {
    pub config: FeatureConfig,
    /// sorted
    pub stopwords: Vec<String>,
}

impl fmt::Display for ExtractorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.config.to_options())?;
        if self.config.remove_stopwords {
            write!(f, " with {} stopwords", self.stopwords.len())?;
        }
        Ok(())
    }
}

/// Lowercase and split on anything that is not alphanumeric or an apostrophe
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// The default query featurizer
///
/// Owns both the feature toggles and the stopword set, so a vocabulary built
/// with one instance and examples encoded with the same instance always agree.
#[derive(Debug, Clone, Default)]
pub struct QueryFeaturizer {
    config: FeatureConfig,
    stopwords: StopWords,
}

impl QueryFeaturizer {
    pub fn new(config: FeatureConfig, stopwords: StopWords) -> Self {
        Self { config, stopwords }
    }

    /// Build from an option string and an optional stopword file
    ///
    /// Every entry point (CLI commands and the pipeline) goes through here.
    pub fn from_options(options: &str, stopword_file: Option<&Path>) -> Result<Self> {
        let config = FeatureConfig::parse_options(options)?;
        let stopwords = match stopword_file {
            Some(path) => StopWords::load(path)?,
            None => {
                if config.remove_stopwords {
                    warn!("-stprm given without a stopword file, no words will be removed");
                }
                StopWords::new()
            }
        };
        Ok(Self::new(config, stopwords))
    }

    /// Rebuild the featurizer a vocabulary was built with
    pub fn from_settings(settings: &ExtractorSettings) -> Self {
        Self::new(settings.config, StopWords::from_words(&settings.stopwords))
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn stopwords(&self) -> &StopWords {
        &self.stopwords
    }
}

impl FeatureExtractor for QueryFeaturizer {
    fn extract(&self, query: &str) -> IndexSet<String> {
        let mut tokens = tokenize(query);
        if self.config.remove_stopwords {
            tokens.retain(|t| !self.stopwords.contains(t));
        }

        let mut features = IndexSet::new();
        if self.config.unigrams {
            features.extend(tokens.iter().cloned());
        }
        if self.config.bigrams {
            features.extend(tokens.windows(2).map(|w| format!("bi:{}_{}", w[0], w[1])));
        }
        features.extend(
            tokens
                .iter()
                .take(self.config.positions)
                .enumerate()
                .map(|(k, t)| format!("pos{k}:{t}")),
        );
        if self.config.stems {
            features.extend(tokens.iter().map(|t| format!("stem:{}", stem::stem(t))));
        }
        features
    }

    fn settings(&self) -> Option<ExtractorSettings> {
        let stopwords = if self.config.remove_stopwords {
            self.stopwords.to_sorted_vec()
        } else {
            Vec::new()
        };
        Some(ExtractorSettings {
            config: self.config,
            stopwords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(set: IndexSet<String>) -> Vec<String> {
        set.into_iter().collect()
    }

    #[test]
    fn parse_options_full_set() {
        let c = FeatureConfig::parse_options("-uni -pos2 -stem -stprm").unwrap();
        assert!(c.unigrams);
        assert!(!c.bigrams);
        assert_eq!(c.positions, 2);
        assert!(c.stems);
        assert!(c.remove_stopwords);
    }

    #[test]
    fn parse_options_defaults_to_unigrams() {
        assert_eq!(FeatureConfig::parse_options("").unwrap(), FeatureConfig::default());
        let c = FeatureConfig::parse_options("-stprm").unwrap();
        assert!(c.unigrams);
        assert!(c.remove_stopwords);
    }

    #[test]
    fn parse_options_rejects_unknown() {
        assert!(matches!(
            FeatureConfig::parse_options("-uni -trigram"),
            Err(FeaturizeError::Config(_))
        ));
        assert!(FeatureConfig::parse_options("-posX").is_err());
    }

    #[test]
    fn tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("What do people THINK of ?"),
            vec!["what", "do", "people", "think", "of"]
        );
        assert_eq!(tokenize("don't\tstop"), vec!["don't", "stop"]);
        assert!(tokenize("  ?! ").is_empty());
    }

    #[test]
    fn unigram_extraction_keeps_first_seen_order_and_dedups() {
        let f = QueryFeaturizer::default();
        assert_eq!(collect(f.extract("world hello world")), vec!["world", "hello"]);
    }

    #[test]
    fn all_feature_families() {
        let config = FeatureConfig::parse_options("-uni -bi -pos2 -stem -stprm").unwrap();
        let f = QueryFeaturizer::new(config, StopWords::from_words(["the"]));
        assert_eq!(
            collect(f.extract("The cats running")),
            vec![
                "cats",
                "running",
                "bi:cats_running",
                "pos0:cats",
                "pos1:running",
                "stem:cat",
                "stem:run",
            ]
        );
    }

    #[test]
    fn stopwords_kept_without_stprm() {
        let f = QueryFeaturizer::new(FeatureConfig::default(), StopWords::from_words(["the"]));
        assert_eq!(collect(f.extract("the cat")), vec!["the", "cat"]);
    }

    #[test]
    fn to_options_parses_back() {
        for opts in ["-uni", "-bi -pos3", "-uni -bi -pos2 -stem -stprm", "-stem"] {
            let c = FeatureConfig::parse_options(opts).unwrap();
            assert_eq!(c.to_options(), opts);
            assert_eq!(FeatureConfig::parse_options(&c.to_options()).unwrap(), c);
        }
    }

    #[test]
    fn from_options_loads_stopword_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"the\nof\n").unwrap();

        let f = QueryFeaturizer::from_options("-uni -stprm", Some(file.path())).unwrap();
        assert_eq!(collect(f.extract("the sound of music")), vec!["sound", "music"]);

        // no file: nothing is removed
        let f = QueryFeaturizer::from_options("-uni -stprm", None).unwrap();
        assert!(f.stopwords().is_empty());
        assert_eq!(collect(f.extract("the cat")), vec!["the", "cat"]);

        assert!(QueryFeaturizer::from_options("-quad", None).is_err());
    }

    #[test]
    fn settings_ignore_stopwords_without_stprm() {
        let words = StopWords::from_words(["the", "a"]);
        let off = QueryFeaturizer::new(FeatureConfig::default(), words.clone());
        assert!(off.settings().unwrap().stopwords.is_empty());

        let config = FeatureConfig::parse_options("-uni -stprm").unwrap();
        let on = QueryFeaturizer::new(config, words);
        let settings = on.settings().unwrap();
        assert_eq!(settings.stopwords, vec!["a", "the"]);
        assert_eq!(settings.to_string(), "`-uni -stprm` with 2 stopwords");

        let rebuilt = QueryFeaturizer::from_settings(&settings);
        assert_eq!(rebuilt.settings(), Some(settings));
        assert_eq!(collect(rebuilt.extract("a cat")), vec!["cat"]);
    }
}
