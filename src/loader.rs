//! CSV loading for the wrangling pipeline.
//!
//! A thin layer over the Polars CSV reader: delimiter selection, header
//! handling, schema-inference depth, and a per-file policy for malformed
//! rows (fail the load, or skip them).

use crate::config::PipelineConfig;
use crate::error::{Result, WrangleError};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Parse options for a single CSV load.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field separator.
    pub delimiter: u8,
    /// Whether the file carries a header row.
    pub has_header: bool,
    /// Skip malformed rows instead of failing the load.
    pub skip_bad_lines: bool,
    /// Number of rows used to infer the schema.
    pub infer_schema_length: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            skip_bad_lines: false,
            infer_schema_length: Some(100),
        }
    }
}

impl From<&PipelineConfig> for LoadOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            delimiter: config.delimiter,
            has_header: config.has_header,
            skip_bad_lines: config.skip_bad_lines,
            infer_schema_length: config.infer_schema_length,
        }
    }
}

/// Load a delimited text file into a DataFrame.
///
/// A missing or unreadable file is fatal. A malformed row fails the load
/// unless `options.skip_bad_lines` is set, in which case tolerant parsing is
/// enabled and offending rows are dropped or truncated.
pub fn load_csv(path: impl AsRef<Path>, options: &LoadOptions) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(WrangleError::FileNotFound(PathBuf::from(path)));
    }

    info!("Loading dataset from: {}", path.display());

    let mut parse_options = CsvParseOptions::default()
        .with_separator(options.delimiter)
        .with_quote_char(Some(b'"'));
    if options.skip_bad_lines {
        debug!("Tolerant parsing enabled for {}", path.display());
        parse_options = parse_options.with_truncate_ragged_lines(true);
    }

    let df = CsvReadOptions::default()
        .with_has_header(options.has_header)
        .with_infer_schema_length(options.infer_schema_length)
        .with_ignore_errors(options.skip_bad_lines)
        .with_parse_options(parse_options)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()?;

    info!(
        "Loaded {}: {} rows x {} columns",
        path.display(),
        df.height(),
        df.width()
    );

    Ok(df)
}
