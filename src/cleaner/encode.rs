//! Categorical encoding: dummy/indicator columns and codebook mappings.

use anyhow::{Context, Result};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Encoders that turn categorical columns into numeric ones.
pub struct CategoryEncoder;

impl CategoryEncoder {
    /// Replace a categorical column with 0/1 indicator columns, one per
    /// category, named `{column}_{category}`.
    ///
    /// Categories are ordered lexicographically. With `drop_first` the first
    /// category is omitted to avoid redundancy. A null source value yields 0
    /// in every indicator column.
    pub fn encode_dummies(
        df: &mut DataFrame,
        column: &str,
        drop_first: bool,
        steps: &mut Vec<String>,
    ) -> Result<()> {
        let series = df
            .column(column)
            .with_context(|| format!("column '{column}' not found"))?
            .as_materialized_series()
            .clone();
        let str_series = series
            .cast(&DataType::String)
            .with_context(|| format!("column '{column}' cannot be read as categories"))?;
        let ca = str_series.str()?;

        let mut categories: Vec<String> = ca
            .into_iter()
            .flatten()
            .map(|v| v.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let dropped = if drop_first && !categories.is_empty() {
            Some(categories.remove(0))
        } else {
            None
        };

        for category in &categories {
            let indicator: Vec<i32> = ca
                .into_iter()
                .map(|v| match v {
                    Some(value) if value == category => 1,
                    _ => 0,
                })
                .collect();
            let name = format!("{column}_{category}");
            df.with_column(Series::new(name.into(), indicator))?;
        }

        *df = df.drop(column)?;

        match &dropped {
            Some(dropped) => steps.push(format!(
                "Encoded '{column}' into {} indicator columns (dropped '{dropped}')",
                categories.len()
            )),
            None => steps.push(format!(
                "Encoded '{column}' into {} indicator columns",
                categories.len()
            )),
        }
        debug!(
            "Encoded '{}' into {} indicator columns",
            column,
            categories.len()
        );
        Ok(())
    }

    /// Replace a string column with numeric codes from a fixed lookup.
    /// Values absent from the lookup become null.
    pub fn apply_codebook(
        df: &mut DataFrame,
        column: &str,
        codebook: &HashMap<String, i64>,
        steps: &mut Vec<String>,
    ) -> Result<()> {
        let series = df
            .column(column)
            .with_context(|| format!("column '{column}' not found"))?
            .as_materialized_series()
            .clone();
        let str_series = series
            .cast(&DataType::String)
            .with_context(|| format!("column '{column}' cannot be read as categories"))?;
        let ca = str_series.str()?;

        let mut unmapped = 0usize;
        let codes: Vec<Option<i64>> = ca
            .into_iter()
            .map(|v| {
                v.and_then(|value| {
                    let code = codebook.get(value).copied();
                    if code.is_none() {
                        unmapped += 1;
                    }
                    code
                })
            })
            .collect();

        df.replace(column, Series::new(series.name().clone(), codes))?;

        steps.push(format!(
            "Mapped '{column}' through a {}-entry codebook ({unmapped} unmapped values set to null)",
            codebook.len()
        ));
        debug!(
            "Mapped '{}' through codebook, {} unmapped",
            column, unmapped
        );
        Ok(())
    }
}
