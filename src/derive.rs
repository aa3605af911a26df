//! Derived feature columns.
//!
//! Computes a new column as an elementwise arithmetic function of two
//! existing numeric columns. A null operand yields null, and a zero
//! denominator yields null rather than a numeric exception.

use crate::utils::{is_numeric_series, numeric_values};
use anyhow::{Context, Result, ensure};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Elementwise arithmetic operation over two columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeriveOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl DeriveOp {
    /// Apply the operation to one pair of values.
    fn apply(self, left: f64, right: f64) -> Option<f64> {
        match self {
            Self::Add => Some(left + right),
            Self::Subtract => Some(left - right),
            Self::Multiply => Some(left * right),
            Self::Divide => {
                if right == 0.0 {
                    None
                } else {
                    Some(left / right)
                }
            }
        }
    }

    /// Symbol used in audit messages and CLI specs.
    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
        }
    }

    /// Parse an operator symbol.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '*' => Some(Self::Multiply),
            '/' => Some(Self::Divide),
            _ => None,
        }
    }
}

/// Derives new columns from existing ones.
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Append a Float64 column `name` holding `left <op> right` elementwise.
    pub fn derive(
        df: &mut DataFrame,
        name: &str,
        left: &str,
        op: DeriveOp,
        right: &str,
        steps: &mut Vec<String>,
    ) -> Result<()> {
        let lhs = Self::numeric_operand(df, left)?;
        let rhs = Self::numeric_operand(df, right)?;

        let values: Vec<Option<f64>> = lhs
            .iter()
            .zip(rhs.iter())
            .map(|(l, r)| match (l, r) {
                (Some(l), Some(r)) => op.apply(*l, *r),
                _ => None,
            })
            .collect();

        df.with_column(Series::new(name.into(), values))?;

        steps.push(format!(
            "Derived '{name}' = {left} {} {right}",
            op.symbol()
        ));
        debug!("Derived '{}' = {} {} {}", name, left, op.symbol(), right);
        Ok(())
    }

    /// Extract an operand column as f64 values, requiring a numeric dtype.
    fn numeric_operand(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let column = df
            .column(name)
            .with_context(|| format!("column '{name}' not found"))?;
        let series = column.as_materialized_series();
        ensure!(is_numeric_series(series), "column '{name}' is not numeric");
        Ok(numeric_values(series)?)
    }
}
