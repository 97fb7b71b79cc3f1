pub mod serde;

use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

use indexmap::IndexSet;
use tracing::{debug, info};

use crate::{
    corpus::LabeledExample,
    error::{FeaturizeError, Result},
    featurizer::{ExtractorSettings, FeatureExtractor},
    utils::write_atomic,
};

use self::serde::VocabularyData;

/// Ordered set of every feature seen in the training corpus
///
/// Position `i` in the set is feature index `i + 1`. The `IndexSet` is both
/// the stored order and the feature -> index lookup table.
/// Once built or loaded the vocabulary is never mutated.
///
/// A vocabulary built by an extractor that reports its settings keeps them,
/// so a later encode can be checked against the same featurization.
#[derive(Debug, Clone, Default)]
pub struct FeatureVocabulary {
    features: IndexSet<Box<str>>,
    settings: Option<ExtractorSettings>,
}

/// Equal only when both hold the same features in the same order
/// and were built with the same settings
impl PartialEq for FeatureVocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.settings == other.settings && self.features.iter().eq(other.features.iter())
    }
}

impl Eq for FeatureVocabulary {}

impl FeatureVocabulary {
    /// Create an empty vocabulary
    pub fn new() -> Self {
        Self {
            features: IndexSet::new(),
            settings: None,
        }
    }

    /// Union the feature sets of every example
    ///
    /// Features are numbered in first-seen order: corpus order, then the
    /// extractor's order within an example. Nothing is counted or pruned.
    pub fn build<E>(corpus: &[LabeledExample], extractor: &E) -> Self
    where
        E: FeatureExtractor + ?Sized,
    {
        let mut features = IndexSet::new();
        for example in corpus {
            for feature in extractor.extract(&example.query) {
                if !features.contains(feature.as_str()) {
                    features.insert(feature.into_boxed_str());
                }
            }
        }
        info!(examples = corpus.len(), features = features.len(), "built feature vocabulary");
        Self {
            features,
            settings: extractor.settings(),
        }
    }

    /// Restore a vocabulary from its feature list
    ///
    /// Fails on duplicates, since they would shift every later index.
    pub fn from_features<I, S>(features: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        let mut set = IndexSet::new();
        for (pos, feature) in features.into_iter().enumerate() {
            let feature = feature.into();
            if set.contains(&feature) {
                return Err(FeaturizeError::CorruptVocabulary(format!(
                    "duplicate feature {feature:?} at index {}",
                    pos + 1
                )));
            }
            set.insert(feature);
        }
        Ok(Self {
            features: set,
            settings: None,
        })
    }

    /// Settings of the extractor this vocabulary was built with
    pub fn settings(&self) -> Option<&ExtractorSettings> {
        self.settings.as_ref()
    }

    /// Fail when `extractor` featurizes differently from the builder
    ///
    /// Encoding with other settings would silently drop or misnumber
    /// features. Passes when either side has no recorded settings.
    pub fn check_extractor<E>(&self, extractor: &E) -> Result<()>
    where
        E: FeatureExtractor + ?Sized,
    {
        match (&self.settings, extractor.settings()) {
            (Some(built), Some(given)) if *built != given => Err(FeaturizeError::Config(format!(
                "vocabulary was built with {built}, encoder uses {given}"
            ))),
            _ => Ok(()),
        }
    }

    /// 1-based index of `feature`
    #[inline]
    pub fn index_of(&self, feature: &str) -> Option<u32> {
        self.features.get_index_of(feature).map(|i| i as u32 + 1)
    }

    /// Feature for a 1-based index
    #[inline]
    pub fn feature(&self, index: u32) -> Option<&str> {
        let pos = (index as usize).checked_sub(1)?;
        self.features.get_index(pos).map(|f| f.as_ref())
    }

    #[inline]
    pub fn contains(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features in index order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.as_ref())
    }

    /// Persist to `path` (CBOR), replacing the file atomically
    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        write_atomic(path, |w: &mut dyn Write| {
            serde_cbor::to_writer(w, self)?;
            Ok(())
        })?;
        debug!(path = %path.display(), features = self.len(), "vocabulary written");
        Ok(())
    }

    /// Load a vocabulary written by [`FeatureVocabulary::dump`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| FeaturizeError::io(path, e))?;
        let data: VocabularyData = serde_cbor::from_reader(BufReader::new(file))?;
        let vocabulary = data.into_vocabulary()?;
        debug!(path = %path.display(), features = vocabulary.len(), "vocabulary loaded");
        Ok(vocabulary)
    }
}
