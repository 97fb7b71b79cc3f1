//! Raw CSV export -> `label<TAB>query` training file.

use std::{io::Write, path::Path};

use tracing::info;

use crate::{
    corpus::is_valid_label,
    error::{FeaturizeError, Result},
    utils::write_atomic,
};

/// Where label and query live in the raw CSV rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumns {
    /// 0-based label column
    pub label: usize,
    /// 0-based query column
    pub query: usize,
    /// skip the first row
    pub has_headers: bool,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            label: 3,
            query: 1,
            has_headers: false,
        }
    }
}

/// Turn a query into one TSV field: lowercased, no tabs or line breaks
fn clean_query(query: &str) -> String {
    query
        .to_lowercase()
        .chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

/// Convert CSV text read from `reader` into TSV lines written to `out`
///
/// Returns the number of rows written.
pub fn convert<R, W>(reader: R, out: &mut W, columns: &CsvColumns) -> Result<usize>
where
    R: std::io::Read,
    W: Write + ?Sized,
{
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(columns.has_headers)
        .flexible(true)
        .from_reader(reader);

    let mut rows = 0usize;
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(rows + 1, |p| p.line() as usize);
        let (Some(label), Some(query)) = (record.get(columns.label), record.get(columns.query)) else {
            return Err(FeaturizeError::Parse {
                line,
                content: record.iter().collect::<Vec<_>>().join(","),
            });
        };
        let label = label.trim();
        if !is_valid_label(label) {
            return Err(FeaturizeError::Parse {
                line,
                content: record.iter().collect::<Vec<_>>().join(","),
            });
        }
        writeln!(out, "{}\t{}", label, clean_query(query))
            .map_err(|e| FeaturizeError::io("<output>", e))?;
        rows += 1;
    }
    Ok(rows)
}

/// Preprocess `raw` (CSV) into the training file `train` (TSV)
///
/// The training file is replaced only if every row converted.
pub fn preprocess<P, Q>(raw: P, train: Q, columns: &CsvColumns) -> Result<usize>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let raw = raw.as_ref();
    let train = train.as_ref();
    let file = std::fs::File::open(raw).map_err(|e| FeaturizeError::io(raw, e))?;
    let mut rows = 0;
    write_atomic(train, |w: &mut dyn Write| {
        rows = convert(file, w, columns)?;
        Ok(())
    })?;
    info!(rows, raw = %raw.display(), train = %train.display(), "preprocessed raw data");
    Ok(rows)
}
