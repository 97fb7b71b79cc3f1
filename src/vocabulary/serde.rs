use ::serde::{ser::SerializeStruct, Deserialize, Serialize};

use crate::{
    error::{FeaturizeError, Result},
    featurizer::ExtractorSettings,
    vocabulary::FeatureVocabulary,
};

/// Current on-disk layout version
pub const VOCABULARY_FORMAT_VERSION: u32 = 2;

/// Oldest layout still readable (no extractor settings)
pub const MIN_VOCABULARY_FORMAT_VERSION: u32 = 1;

/// Deserialization form of `FeatureVocabulary`
/// Holds the plain ordered feature list without the lookup table.
/// Use `into_vocabulary` to rebuild and validate the `FeatureVocabulary`.
#[derive(Debug, Deserialize)]
pub struct VocabularyData {
    /// layout version
    pub version: u32,
    /// features in index order, index = position + 1
    pub features: Vec<Box<str>>,
    /// extractor settings, absent in version 1
    #[serde(default)]
    pub settings: Option<ExtractorSettings>,
}

impl VocabularyData {
    /// Convert into a `FeatureVocabulary`
    /// Rejects unknown versions and duplicated features.
    pub fn into_vocabulary(self) -> Result<FeatureVocabulary> {
        if !(MIN_VOCABULARY_FORMAT_VERSION..=VOCABULARY_FORMAT_VERSION).contains(&self.version) {
            return Err(FeaturizeError::CorruptVocabulary(format!(
                "unsupported vocabulary version {} (expected {}..={})",
                self.version, MIN_VOCABULARY_FORMAT_VERSION, VOCABULARY_FORMAT_VERSION
            )));
        }
        let mut vocabulary = FeatureVocabulary::from_features(self.features)?;
        vocabulary.settings = self.settings;
        Ok(vocabulary)
    }
}

impl Serialize for FeatureVocabulary {
    /// Serialize as `{ version, features: [...], settings }`
    /// The sequence is written in index order. Deserialize with `VocabularyData`.
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: ::serde::Serializer,
    {
        let features: Vec<&str> = self.iter().collect();
        let mut state = serializer.serialize_struct("FeatureVocabulary", 3)?;
        state.serialize_field("version", &VOCABULARY_FORMAT_VERSION)?;
        state.serialize_field("features", &features)?;
        state.serialize_field("settings", &self.settings)?;
        state.end()
    }
}
