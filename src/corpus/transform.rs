use std::{io::Write, path::Path};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::{
    corpus::{read_corpus, LabeledExample},
    encoder::{EncodedExample, Encoder},
    error::{FeaturizeError, Result},
    featurizer::FeatureExtractor,
    utils::write_atomic,
    vocabulary::FeatureVocabulary,
};

/// Counters from one transform run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// examples written
    pub examples: usize,
    /// features dropped because they are not in the vocabulary
    pub dropped_features: u64,
}

/// Drives vocabulary building and encoding over a whole corpus file
///
/// Every line is parsed before anything is written, and the output goes
/// through a temp file, so a malformed line never leaves a partial output.
pub struct CorpusTransformer<'a, E>
where
    E: FeatureExtractor + ?Sized,
{
    extractor: &'a E,
    parallel: bool,
}

impl<'a, E> CorpusTransformer<'a, E>
where
    E: FeatureExtractor + ?Sized,
{
    pub fn new(extractor: &'a E) -> Self {
        Self {
            extractor,
            parallel: false,
        }
    }

    /// Encode examples on the rayon pool; output order is unchanged
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Build the vocabulary from `input`, persist it to `vocabulary_path`,
    /// then write the encoded corpus to `output`
    pub fn run<P, Q, R>(
        &self,
        input: P,
        vocabulary_path: Q,
        output: R,
    ) -> Result<(FeatureVocabulary, TransformStats)>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let corpus = read_corpus(input.as_ref())?;
        let vocabulary = FeatureVocabulary::build(&corpus, self.extractor);
        vocabulary.dump(vocabulary_path.as_ref())?;
        let stats = self.write_encoded(&corpus, &vocabulary, output.as_ref())?;
        Ok((vocabulary, stats))
    }

    /// Encode `input` against an existing vocabulary and write it to `output`
    ///
    /// Fails with a `Config` error, before reading `input`, when the
    /// extractor differs from the one recorded in `vocabulary`.
    pub fn transform<P, Q>(
        &self,
        input: P,
        output: Q,
        vocabulary: &FeatureVocabulary,
    ) -> Result<TransformStats>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        vocabulary.check_extractor(self.extractor)?;
        let corpus = read_corpus(input.as_ref())?;
        self.write_encoded(&corpus, vocabulary, output.as_ref())
    }

    /// Encode every example, in corpus order
    pub fn encode_all(
        &self,
        corpus: &[LabeledExample],
        vocabulary: &FeatureVocabulary,
    ) -> (Vec<EncodedExample>, u64) {
        let encoder = Encoder::new(vocabulary, self.extractor);
        let encoded: Vec<EncodedExample> = if self.parallel {
            corpus.par_iter().map(|ex| encoder.encode(ex)).collect()
        } else {
            corpus.iter().map(|ex| encoder.encode(ex)).collect()
        };
        (encoded, encoder.dropped_features())
    }

    fn write_encoded(
        &self,
        corpus: &[LabeledExample],
        vocabulary: &FeatureVocabulary,
        output: &Path,
    ) -> Result<TransformStats> {
        let (encoded, dropped_features) = self.encode_all(corpus, vocabulary);
        write_atomic(output, |w: &mut dyn Write| {
            for example in &encoded {
                writeln!(w, "{example}").map_err(|e| FeaturizeError::io(output, e))?;
            }
            Ok(())
        })?;

        let stats = TransformStats {
            examples: encoded.len(),
            dropped_features,
        };
        if dropped_features > 0 {
            warn!(dropped = dropped_features, "features missing from the vocabulary were dropped");
        }
        info!(examples = stats.examples, output = %output.display(), "wrote transformed corpus");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::featurizer::{FeatureConfig, QueryFeaturizer, StopWords};
    use std::fs;

    #[test]
    fn run_writes_vocabulary_and_sparse_lines() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("training");
        fs::write(&input, "1\tHello world\n2\tGoodbye world\n").unwrap();
        let fx = QueryFeaturizer::default();

        let (vocab, stats) = CorpusTransformer::new(&fx)
            .run(&input, dir.path().join("features"), dir.path().join("out"))
            .unwrap();

        assert_eq!(vocab.len(), 3);
        assert_eq!(stats, TransformStats { examples: 2, dropped_features: 0 });
        assert_eq!(
            fs::read_to_string(dir.path().join("out")).unwrap(),
            "1 1:1 2:1\n2 2:1 3:1\n"
        );
        assert_eq!(FeatureVocabulary::load(dir.path().join("features")).unwrap(), vocab);
    }

    #[test]
    fn parallel_matches_sequential() {
        let config = FeatureConfig::parse_options("-uni -bi -pos2 -stem").unwrap();
        let fx = QueryFeaturizer::new(config, StopWords::new());
        let corpus: Vec<LabeledExample> = (0..200)
            .map(|i| LabeledExample::new((i % 3).to_string(), format!("query {i} about item {} and {}", i * 7, i % 11)))
            .collect();
        let vocab = FeatureVocabulary::build(&corpus, &fx);

        let (seq, _) = CorpusTransformer::new(&fx).encode_all(&corpus, &vocab);
        let (par, _) = CorpusTransformer::new(&fx).parallel(true).encode_all(&corpus, &vocab);
        assert_eq!(seq, par);
    }

    #[test]
    fn malformed_line_leaves_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("training");
        let output = dir.path().join("out");
        fs::write(&input, "1\tok\nno separator here\n").unwrap();
        fs::write(&output, "previous run\n").unwrap();
        let fx = QueryFeaturizer::default();
        let vocab = FeatureVocabulary::new();

        let err = CorpusTransformer::new(&fx).transform(&input, &output, &vocab).unwrap_err();
        assert!(matches!(err, FeaturizeError::Parse { line: 2, .. }));
        assert_eq!(fs::read_to_string(&output).unwrap(), "previous run\n");
    }

    #[test]
    fn transform_rejects_other_feature_settings() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("training");
        let output = dir.path().join("out");
        fs::write(&input, "1\trunning shoes\n").unwrap();
        let uni = QueryFeaturizer::default();
        let (vocab, _) = CorpusTransformer::new(&uni)
            .run(&input, dir.path().join("features"), &output)
            .unwrap();
        let before = fs::read_to_string(&output).unwrap();

        let stems = QueryFeaturizer::new(FeatureConfig::parse_options("-stem").unwrap(), StopWords::new());
        let err = CorpusTransformer::new(&stems)
            .transform(&input, &output, &vocab)
            .unwrap_err();
        assert!(matches!(err, FeaturizeError::Config(_)));
        assert_eq!(fs::read_to_string(&output).unwrap(), before);
    }

    #[test]
    fn missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let fx = QueryFeaturizer::default();
        let err = CorpusTransformer::new(&fx)
            .transform(dir.path().join("nope"), dir.path().join("out"), &FeatureVocabulary::new())
            .unwrap_err();
        assert!(matches!(err, FeaturizeError::Io { .. }));
        assert!(!dir.path().join("out").exists());
    }
}
