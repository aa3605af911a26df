//! CLI entry point for the data wrangling pipeline.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;
use wrangle::derive::DeriveOp;
use wrangle::loader::{LoadOptions, load_csv};
use wrangle::summary::Summarizer;
use wrangle::types::WrangleReport;
use wrangle::{Pipeline, PipelineConfig};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Tabular data wrangling and exploratory analysis",
    long_about = "Load delimited files, clean them, merge them on a key, derive\n\
                  features, and summarize the result.\n\n\
                  EXAMPLES:\n  \
                  # Clean a dataset and describe it\n  \
                  wrangle -i train.csv --drop-null-rows Embarked --interpolate Age\n\n  \
                  # Dummy-encode a column, dropping the redundant category\n  \
                  wrangle -i train.csv --dummies Sex --drop-first\n\n  \
                  # Merge survey tables on a household id and derive a ratio\n  \
                  wrangle -i households.csv --aux income.csv --key hhid \\\n      \
                  --derive pc_income=income/fsize --outlier-column pc_income\n\n  \
                  # Machine-readable report\n  \
                  wrangle -i train.csv --json | jq .rows_after"
)]
struct Args {
    /// Path to the base CSV file to process
    #[arg(short, long)]
    input: String,

    /// Auxiliary CSV files to left-join onto the base table (repeatable)
    #[arg(long)]
    aux: Vec<String>,

    /// Shared key column for joining auxiliary tables
    #[arg(short, long)]
    key: Option<String>,

    /// Column removed from each auxiliary table before joining, if present
    #[arg(long)]
    merge_drop: Option<String>,

    /// Field separator
    #[arg(short, long, default_value = ",")]
    delimiter: char,

    /// Skip malformed rows instead of failing the load
    #[arg(long)]
    skip_bad_lines: bool,

    /// Columns to drop entirely (comma-separated)
    #[arg(long, value_delimiter = ',')]
    drop_cols: Vec<String>,

    /// Drop rows with a null in any of these columns (comma-separated)
    #[arg(long, value_delimiter = ',')]
    drop_null_rows: Vec<String>,

    /// Numeric columns whose interior nulls are linearly interpolated
    #[arg(long, value_delimiter = ',')]
    interpolate: Vec<String>,

    /// Categorical columns replaced by 0/1 indicator columns
    #[arg(long, value_delimiter = ',')]
    dummies: Vec<String>,

    /// Omit the first category when encoding dummies
    #[arg(long)]
    drop_first: bool,

    /// Value -> code lookup for a column, as COL=FILE.json (repeatable)
    ///
    /// The file holds a JSON object mapping values to integer codes.
    #[arg(long, value_name = "COL=FILE")]
    codebook: Vec<String>,

    /// Rename a column, as OLD=NEW (repeatable)
    #[arg(long, value_name = "OLD=NEW")]
    rename: Vec<String>,

    /// Remove rows identical across all columns, keeping the first
    #[arg(long)]
    dedup: bool,

    /// Keep only the first row per value of this key column
    #[arg(long)]
    dedup_key: Option<String>,

    /// Derive a column, as NAME=LEFT<op>RIGHT with <op> one of + - * /
    /// (repeatable)
    #[arg(long, value_name = "NAME=EXPR")]
    derive: Vec<String>,

    /// Columns to describe (comma-separated; default: all numeric columns)
    #[arg(long, value_delimiter = ',')]
    describe: Vec<String>,

    /// Column used for the outlier-threshold partition
    #[arg(long)]
    outlier_column: Option<String>,

    /// Quantile defining the outlier threshold
    #[arg(long, default_value = "0.99")]
    outlier_quantile: f64,

    /// Number of histogram bins
    #[arg(long, default_value = "20")]
    bins: usize,

    /// Numeric columns to plot (histogram + boxplot, comma-separated)
    #[arg(long, value_delimiter = ',')]
    plot: Vec<String>,

    /// Output directory for rendered plots
    #[arg(short, long, default_value = "./output")]
    output: String,

    /// Output the JSON report to stdout instead of a human-readable summary
    ///
    /// Disables all progress logs; only the final JSON report is printed.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = build_config(&args)?;
    let load_options = LoadOptions::from(&config);

    info!("Loading dataset from: {}", args.input);
    let base = load_csv(&args.input, &load_options)?;

    let mut aux = Vec::with_capacity(args.aux.len());
    for path in &args.aux {
        aux.push(load_csv(path, &load_options)?);
    }

    let pipeline = Pipeline::builder().config(config).build()?;
    let result = pipeline.process_with(base, aux)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.report)?);
        return Ok(());
    }

    print_summary(&result.df, &result.report)?;
    Ok(())
}

/// Translate CLI flags into a pipeline configuration.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .delimiter(u8::try_from(args.delimiter).map_err(|_| {
            anyhow!("delimiter must be a single ASCII character, got '{}'", args.delimiter)
        })?)
        .skip_bad_lines(args.skip_bad_lines)
        .drop_columns(args.drop_cols.clone())
        .drop_null_rows(args.drop_null_rows.clone())
        .interpolate_columns(args.interpolate.clone())
        .dummy_columns(args.dummies.clone())
        .dummy_drop_first(args.drop_first)
        .dedup_rows(args.dedup)
        .describe_columns(args.describe.clone())
        .outlier_quantile(args.outlier_quantile)
        .histogram_bins(args.bins)
        .plot_columns(args.plot.clone())
        .output_dir(&args.output)
        .render_plots(!args.plot.is_empty());

    if let Some(ref key) = args.key {
        builder = builder.join_key(key);
    }
    if let Some(ref column) = args.merge_drop {
        builder = builder.merge_drop_column(column);
    }
    if let Some(ref key) = args.dedup_key {
        builder = builder.dedup_key(key);
    }

    for spec in &args.rename {
        let (old, new) = split_pair(spec).context("--rename expects OLD=NEW")?;
        builder = builder.rename(old, new);
    }

    for spec in &args.codebook {
        let (column, file) = split_pair(spec).context("--codebook expects COL=FILE.json")?;
        let content = std::fs::read_to_string(&file)
            .with_context(|| format!("failed to read codebook file '{file}'"))?;
        let mapping: HashMap<String, i64> = serde_json::from_str(&content)
            .with_context(|| format!("codebook file '{file}' is not a value -> code object"))?;
        builder = builder.codebook(column, mapping);
    }

    for spec in &args.derive {
        let (name, expr) = split_pair(spec).context("--derive expects NAME=LEFT<op>RIGHT")?;
        let (left, op, right) = parse_derive_expr(&expr)
            .ok_or_else(|| anyhow!("cannot parse derive expression '{expr}'"))?;
        builder = builder.derive(name, left, op, right);
    }

    Ok(builder.build()?)
}

/// Split a `KEY=VALUE` argument.
fn split_pair(spec: &str) -> Option<(String, String)> {
    let (key, value) = spec.split_once('=')?;
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

/// Parse `LEFT<op>RIGHT` where `<op>` is one of `+ - * /`. The operator must
/// not be the first character, so column names with a leading sign are not
/// misread.
fn parse_derive_expr(expr: &str) -> Option<(String, DeriveOp, String)> {
    let pos = expr
        .char_indices()
        .skip(1)
        .find(|(_, c)| DeriveOp::from_symbol(*c).is_some())
        .map(|(i, _)| i)?;
    let op = DeriveOp::from_symbol(expr[pos..].chars().next()?)?;
    let left = expr[..pos].trim();
    let right = expr[pos + 1..].trim();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left.to_string(), op, right.to_string()))
}

/// Print the human-readable run summary.
///
/// Uses `println!` intentionally: this is the primary CLI output and should
/// be visible regardless of log level settings.
fn print_summary(df: &DataFrame, report: &WrangleReport) -> Result<()> {
    println!();
    println!("{}", "=".repeat(78));
    println!("WRANGLING COMPLETE");
    println!("{}", "=".repeat(78));
    println!();

    println!(
        "Rows:    {} -> {} ({} removed)",
        report.rows_before,
        report.rows_after,
        report.rows_removed()
    );
    println!(
        "Columns: {} -> {}",
        report.columns_before, report.columns_after
    );
    println!(
        "Data quality: {:.1}% -> {:.1}% non-null",
        report.data_quality_before * 100.0,
        report.data_quality_after * 100.0
    );
    println!("Duration: {}ms", report.duration_ms);
    println!();

    println!("COLUMNS");
    println!("{}", "-".repeat(46));
    println!("{:<24} {:<12} {:<8}", "Column", "Type", "Nulls");
    for column in df.get_columns() {
        println!(
            "{:<24} {:<12} {:<8}",
            truncate_str(column.name(), 23),
            column.dtype().to_string(),
            column.null_count()
        );
    }
    println!();

    if !report.column_stats.is_empty() {
        println!("DESCRIPTIVE STATISTICS");
        println!("{}", "-".repeat(78));
        println!(
            "{:<16} {:>6} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
            "Column", "Count", "Mean", "Std", "Min", "Median", "Q3", "Max"
        );
        for stats in &report.column_stats {
            println!(
                "{:<16} {:>6} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
                truncate_str(&stats.name, 15),
                stats.count,
                fmt_stat(stats.mean),
                fmt_stat(stats.std),
                fmt_stat(stats.min),
                fmt_stat(stats.median),
                fmt_stat(stats.q3),
                fmt_stat(stats.max),
            );
        }
        println!();
    }

    // Frequency tables for the remaining string columns
    let categorical: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| matches!(c.dtype(), DataType::String))
        .map(|c| c.name().to_string())
        .collect();
    for column in &categorical {
        let freq = Summarizer::frequency_table(df, column, 5)
            .map_err(|e| anyhow!("frequency table failed: {e}"))?;
        if freq.is_empty() {
            continue;
        }
        println!("TOP VALUES: {column}");
        println!("{}", "-".repeat(46));
        for entry in freq {
            println!("  {:<32} {}", truncate_str(&entry.value, 31), entry.count);
        }
        println!();
    }

    if let Some(split) = &report.outlier_split {
        println!("OUTLIER SPLIT");
        println!("{}", "-".repeat(46));
        println!(
            "  '{}' at the {:.0}th percentile ({:.3}):",
            split.column,
            split.quantile * 100.0,
            split.threshold
        );
        println!("  {} rows above, {} rows at or below", split.above_rows, split.at_or_below_rows);
        println!();
    }

    if !report.cleaning_actions.is_empty() || !report.processing_steps.is_empty() {
        println!("ACTIONS TAKEN");
        println!("{}", "-".repeat(46));
        for action in report.cleaning_actions.iter().chain(&report.processing_steps) {
            println!("  - {action}");
        }
        println!();
    }

    if !report.plot_files.is_empty() {
        println!("PLOTS");
        println!("{}", "-".repeat(46));
        for path in &report.plot_files {
            println!("  - {}", path.display());
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(78));
    Ok(())
}

/// Format an optional statistic for the summary table.
fn fmt_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

/// Truncate a string to max length with ellipsis.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
