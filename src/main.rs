//! query-featurizer CLI
//!
//! Prepares LIBLINEAR training files from labeled queries and encodes new
//! queries against a persisted feature vocabulary.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

/// Filter used when `RUST_LOG` is unset or unparsable
const DEFAULT_LOG_FILTER: &str = "query_featurizer=info";

/// `RUST_LOG` wins whenever it is set, including `query_featurizer=debug`
/// or `off`
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> Result<()> {
    // logs go to stderr, stdout carries encoded examples
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter(rust_log.as_deref()))
        .init();

    let cli = Cli::parse();
    debug!(?cli, "parsed arguments");

    match cli.command {
        Commands::Preprocess(cmd) => cmd.run()?,
        Commands::Build(cmd) => cmd.run()?,
        Commands::Encode(cmd) => cmd.run()?,
        Commands::Run(cmd) => cmd.run()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_without_rust_log() {
        assert_eq!(log_filter(None).to_string(), DEFAULT_LOG_FILTER);
        assert_eq!(log_filter(Some("  ")).to_string(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn rust_log_overrides_the_default() {
        let filter = log_filter(Some("query_featurizer=debug")).to_string();
        assert!(filter.contains("query_featurizer=debug"), "{filter}");
        assert!(!filter.contains("info"), "{filter}");

        let filter = log_filter(Some("off")).to_string();
        assert!(!filter.contains("query_featurizer"), "{filter}");
    }
}
