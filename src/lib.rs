//! Tabular Data Wrangling Library
//!
//! A data wrangling and exploratory-analysis library built with Rust and
//! Polars.
//!
//! # Overview
//!
//! This library provides the stages of a linear wrangling pipeline over
//! in-memory tables:
//!
//! - **Loading**: CSV files with configurable delimiter and a per-file
//!   policy for malformed rows
//! - **Cleaning**: null-row removal, column drops, linear interpolation,
//!   duplicate removal, renames, dummy/indicator encoding, codebook mappings
//! - **Merging**: accumulated left joins over a shared key column
//! - **Feature derivation**: elementwise arithmetic over numeric columns
//! - **Summarizing**: descriptive statistics, quantile-threshold outlier
//!   partitioning, frequency tables, and histogram/boxplot rendering
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use wrangle::{Pipeline, PipelineConfig};
//! use wrangle::loader::{self, LoadOptions};
//!
//! let df = loader::load_csv("passengers.csv", &LoadOptions::default())?;
//!
//! let config = PipelineConfig::builder()
//!     .drop_null_rows(["Embarked"])
//!     .interpolate_columns(["Age"])
//!     .dummy_columns(["Sex"])
//!     .dummy_drop_first(true)
//!     .plot_columns(["Fare"])
//!     .build()?;
//!
//! let result = Pipeline::builder().config(config).build()?.process(df)?;
//!
//! println!("{} rows remain", result.df.height());
//! println!("{}", serde_json::to_string_pretty(&result.report)?);
//! ```
//!
//! # Configuration
//!
//! Use [`PipelineConfig`] to declare the whole run up front:
//!
//! ```rust,ignore
//! use wrangle::config::PipelineConfig;
//! use wrangle::derive::DeriveOp;
//!
//! let config = PipelineConfig::builder()
//!     .join_key("hhid")                     // left-join auxiliary tables
//!     .dedup_key("hhid")                    // keep first row per key
//!     .derive("pc_income", "income", DeriveOp::Divide, "fsize")
//!     .outlier_column("pc_income")
//!     .outlier_quantile(0.99)
//!     .build()?;
//! ```
//!
//! The individual stages are also usable on their own; see
//! [`cleaner::DataCleaner`], [`merge::TableMerger`],
//! [`derive::FeatureDeriver`] and [`summary::Summarizer`].

pub mod cleaner;
pub mod config;
pub mod derive;
pub mod error;
pub mod loader;
pub mod merge;
pub mod pipeline;
pub mod summary;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{CategoryEncoder, DataCleaner};
pub use config::{ConfigValidationError, DerivedSpec, PipelineConfig, PipelineConfigBuilder};
pub use derive::{DeriveOp, FeatureDeriver};
pub use error::{Result as WrangleResult, ResultExt, WrangleError};
pub use loader::{LoadOptions, load_csv};
pub use merge::TableMerger;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use summary::{PlotRenderer, Summarizer};
pub use types::{
    ColumnStats, FrequencyEntry, OutlierSplit, PipelineResult, WrangleReport,
};
