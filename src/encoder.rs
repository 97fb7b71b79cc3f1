use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use num::Num;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    corpus::LabeledExample,
    error::Result,
    featurizer::FeatureExtractor,
    vocabulary::FeatureVocabulary,
};

/// One example as a sparse indicator vector
///
/// `ind` is strictly ascending and 1-based, `val` runs parallel to it and
/// holds `N::one()` for every present feature.
/// `Display` renders the LIBLINEAR line without the newline:
/// `label i:1 j:1 ...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedExample<N = u8>
where
    N: Num + Copy,
{
    pub label: String,
    pub ind: Vec<u32>,
    pub val: Vec<N>,
}

impl<N> EncodedExample<N>
where
    N: Num + Copy,
{
    /// number of present features
    #[inline]
    pub fn nnz(&self) -> usize {
        self.ind.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ind.is_empty()
    }

    /// (index, value) pairs in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (u32, N)> + '_ {
        self.ind.iter().copied().zip(self.val.iter().copied())
    }

    /// Check the LIBLINEAR index contract: 1-based, strictly ascending
    pub fn is_strictly_ascending(&self) -> bool {
        self.ind.first().map_or(true, |&i| i >= 1) && self.ind.windows(2).all(|w| w[0] < w[1])
    }
}

impl<N> fmt::Display for EncodedExample<N>
where
    N: Num + Copy + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)?;
        for (i, v) in self.iter() {
            write!(f, " {i}:{v}")?;
        }
        Ok(())
    }
}

/// Encodes labeled queries against a fixed vocabulary
///
/// The extractor must be the same one the vocabulary was built with.
/// Features missing from the vocabulary are dropped and counted; the count
/// is the only state the encoder changes.
pub struct Encoder<'a, E>
where
    E: FeatureExtractor + ?Sized,
{
    vocabulary: &'a FeatureVocabulary,
    extractor: &'a E,
    dropped: AtomicU64,
}

impl<'a, E> Encoder<'a, E>
where
    E: FeatureExtractor + ?Sized,
{
    pub fn new(vocabulary: &'a FeatureVocabulary, extractor: &'a E) -> Self {
        Self {
            vocabulary,
            extractor,
            dropped: AtomicU64::new(0),
        }
    }

    /// Like [`Encoder::new`], but fails when `extractor` does not match the
    /// settings recorded in `vocabulary`
    pub fn checked(vocabulary: &'a FeatureVocabulary, extractor: &'a E) -> Result<Self> {
        vocabulary.check_extractor(extractor)?;
        Ok(Self::new(vocabulary, extractor))
    }

    pub fn vocabulary(&self) -> &'a FeatureVocabulary {
        self.vocabulary
    }

    /// Encode one example
    pub fn encode<N>(&self, example: &LabeledExample) -> EncodedExample<N>
    where
        N: Num + Copy,
    {
        self.encode_query(&example.label, &example.query)
    }

    /// Encode a raw query under `label`, e.g. at prediction time
    pub fn encode_query<N>(&self, label: &str, query: &str) -> EncodedExample<N>
    where
        N: Num + Copy,
    {
        let features = self.extractor.extract(query);
        let mut ind = Vec::with_capacity(features.len());
        let mut dropped = 0u64;
        for feature in &features {
            match self.vocabulary.index_of(feature) {
                Some(i) => ind.push(i),
                None => {
                    dropped += 1;
                    trace!(feature = %feature, "feature not in vocabulary, dropped");
                }
            }
        }
        if dropped > 0 {
            self.dropped.fetch_add(dropped, Ordering::Relaxed);
        }
        ind.sort_unstable();
        ind.dedup();
        let val = vec![N::one(); ind.len()];
        EncodedExample {
            label: label.to_string(),
            ind,
            val,
        }
    }

    /// Total features dropped since creation or the last reset
    pub fn dropped_features(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset the dropped counter and return its previous value
    pub fn take_dropped_features(&self) -> u64 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}
