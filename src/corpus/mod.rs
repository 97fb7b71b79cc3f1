pub mod transform;

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{FeaturizeError, Result};

pub use transform::{CorpusTransformer, TransformStats};

/// One training line: `label<TAB>query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub label: String,
    pub query: String,
}

impl LabeledExample {
    pub fn new(label: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            query: query.into(),
        }
    }
}

/// A label must be one non-empty LIBLINEAR token: no whitespace, no `:`
///
/// Anything else would make the written line unreadable as
/// `label index:value ...`.
pub fn is_valid_label(label: &str) -> bool {
    !label.is_empty() && !label.contains(|c: char| c.is_whitespace() || c == ':')
}

/// Parse one corpus line
///
/// Splits on the first tab; the query keeps any further tabs.
/// Surrounding spaces around the label are trimmed, then it must pass
/// [`is_valid_label`].
/// `line_no` is 1-based and only used for the error.
pub fn parse_line(line_no: usize, line: &str) -> Result<LabeledExample> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    match line.split_once('\t') {
        Some((label, query)) if is_valid_label(label.trim()) => {
            Ok(LabeledExample::new(label.trim(), query))
        }
        _ => Err(FeaturizeError::Parse {
            line: line_no,
            content: line.to_string(),
        }),
    }
}

/// Parse a whole corpus, failing on the first malformed line
pub fn parse_corpus(text: &str) -> Result<Vec<LabeledExample>> {
    text.lines()
        .enumerate()
        .map(|(i, line)| parse_line(i + 1, line))
        .collect()
}

/// Read and parse a tab-separated corpus file
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<LabeledExample>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| FeaturizeError::io(path, e))?;
    parse_corpus(&text)
}
