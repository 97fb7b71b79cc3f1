use std::{collections::HashSet, fs, path::Path};

use tracing::debug;

use crate::error::{FeaturizeError, Result};

/// Stopword set used by the featurizer when `-stprm` is enabled
///
/// Words are stored lowercased, lookups expect lowercased tokens
/// (the tokenizer already lowercases).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            words: HashSet::new(),
        }
    }

    /// Create a set from any list of words
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Load a stopword file
    ///
    /// One word per line. Blank lines and lines starting with `#` are ignored.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| FeaturizeError::io(path, e))?;
        let stopwords = Self::parse(&text);
        debug!(path = %path.display(), count = stopwords.len(), "loaded stopwords");
        Ok(stopwords)
    }

    /// Parse stopword file contents
    pub fn parse(text: &str) -> Self {
        Self::from_words(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )
    }

    #[inline]
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Every word, sorted
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut words: Vec<String> = self.words.iter().cloned().collect();
        words.sort_unstable();
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_comments_and_blanks() {
        let sw = StopWords::parse("# english\nthe\n\n  A \nof\n");
        assert_eq!(sw.len(), 3);
        assert!(sw.contains("the"));
        assert!(sw.contains("a"));
        assert!(sw.contains("of"));
        assert!(!sw.contains("# english"));
        assert_eq!(sw.to_sorted_vec(), vec!["a", "of", "the"]);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = StopWords::load("/definitely/not/here.stp").unwrap_err();
        assert!(matches!(err, FeaturizeError::Io { .. }));
    }
}
