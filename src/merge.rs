//! Key-based table merging.
//!
//! Accumulates left joins of auxiliary tables onto a base table over a
//! shared key column. Rows in the base without a match receive nulls;
//! unmatched rows in the incoming table are dropped.

use crate::utils::first_occurrence_mask;
use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::debug;

/// Left-join accumulation over a shared key.
pub struct TableMerger;

impl TableMerger {
    /// Left-join each of `others` onto `base` by `key`, in order.
    ///
    /// Before each join, `drop_column` is removed from the incoming table if
    /// present (and distinct from the key), and the incoming table is
    /// deduplicated on the key (keeping the first row) so the base row count
    /// is preserved.
    pub fn left_join_all(
        base: DataFrame,
        others: Vec<DataFrame>,
        key: &str,
        drop_column: Option<&str>,
        steps: &mut Vec<String>,
    ) -> Result<DataFrame> {
        base.column(key)
            .with_context(|| format!("key column '{key}' not found in base table"))?;

        let mut merged = base;
        for (index, mut other) in others.into_iter().enumerate() {
            other
                .column(key)
                .with_context(|| format!("key column '{key}' not found in table {index}"))?;

            if let Some(drop_column) = drop_column
                && drop_column != key
                && other.column(drop_column).is_ok()
            {
                other = other.drop(drop_column)?;
                steps.push(format!(
                    "Dropped '{drop_column}' from table {index} before joining"
                ));
            }

            // A duplicated key on the right side would multiply base rows
            let before = other.height();
            let mask = first_occurrence_mask(other.column(key)?.as_materialized_series());
            other = other.filter(&mask)?;
            if other.height() < before {
                steps.push(format!(
                    "Deduplicated table {index} on '{key}' ({} rows dropped)",
                    before - other.height()
                ));
            }

            let rows = merged.height();
            merged = merged.join(&other, [key], [key], JoinArgs::new(JoinType::Left), None)?;
            debug_assert_eq!(merged.height(), rows);

            steps.push(format!(
                "Left-joined table {index} on '{key}' ({} columns added)",
                other.width() - 1
            ));
            debug!("Left-joined table {} on '{}'", index, key);
        }

        Ok(merged)
    }
}
