//! Distribution plots: binned histograms with a density overlay, and
//! box-and-whisker charts, rendered to PNG files.

use crate::utils::{is_numeric_series, mean_of, sample_std, sorted_non_null};
use anyhow::{Context, Result, ensure};
use plotters::prelude::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A single equal-width histogram bin. The right edge is exclusive except
/// for the last bin.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub left: f64,
    pub right: f64,
    pub count: usize,
    /// count / (total_count * bin_width)
    pub density: f64,
}

/// Build `num_bins` equal-width bins over a sorted sample.
pub fn build_bins(sorted: &[f64], num_bins: usize) -> Vec<HistogramBin> {
    if sorted.is_empty() {
        return Vec::new();
    }

    let n = sorted.len();
    let min = sorted[0];
    let max = sorted[n - 1];

    if (max - min).abs() < 1e-10 {
        // All values are the same
        return vec![HistogramBin {
            left: min,
            right: max,
            count: n,
            density: 0.0,
        }];
    }

    let num_bins = num_bins.max(1);
    let width = (max - min) / num_bins as f64;
    let mut bins: Vec<HistogramBin> = (0..num_bins)
        .map(|i| HistogramBin {
            left: min + i as f64 * width,
            right: if i == num_bins - 1 {
                max
            } else {
                min + (i + 1) as f64 * width
            },
            count: 0,
            density: 0.0,
        })
        .collect();

    // Single pass through the sorted data
    let mut current = 0;
    for &value in sorted {
        while current < num_bins - 1 && value >= bins[current].right {
            current += 1;
        }
        bins[current].count += 1;
    }

    for bin in &mut bins {
        let bin_width = bin.right - bin.left;
        if bin_width > 0.0 {
            bin.density = bin.count as f64 / (n as f64 * bin_width);
        }
    }

    bins
}

/// Gaussian kernel density estimate evaluated over an evenly spaced grid.
/// Returns an empty curve when the bandwidth degenerates (constant sample).
pub fn gaussian_kde(sorted: &[f64], grid_points: usize) -> Vec<(f64, f64)> {
    let n = sorted.len();
    if n < 2 {
        return Vec::new();
    }
    let min = sorted[0];
    let max = sorted[n - 1];
    let mean = match mean_of(sorted) {
        Some(m) => m,
        None => return Vec::new(),
    };
    let std = sample_std(sorted, mean);
    // Silverman's rule of thumb
    let bandwidth = 1.06 * std * (n as f64).powf(-0.2);
    if bandwidth <= 0.0 {
        return Vec::new();
    }

    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let step = (max - min) / (grid_points.max(2) - 1) as f64;
    (0..grid_points.max(2))
        .map(|i| {
            let x = min + i as f64 * step;
            let density = sorted
                .iter()
                .map(|xi| (-0.5 * ((x - xi) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm;
            (x, density)
        })
        .collect()
}

/// Renders distribution plots for numeric columns into an output directory.
pub struct PlotRenderer {
    output_dir: PathBuf,
    bins: usize,
}

impl PlotRenderer {
    /// Create a renderer writing under `output_dir` with the given number of
    /// histogram bins.
    pub fn new(output_dir: impl Into<PathBuf>, bins: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            bins: bins.max(1),
        }
    }

    /// Render a histogram with a density overlay for one numeric column.
    pub fn histogram(&self, df: &DataFrame, column: &str) -> Result<PathBuf> {
        let values = self.numeric_sample(df, column)?;
        let bins = build_bins(&values, self.bins);
        let kde = gaussian_kde(&values, 200);

        let path = self.plot_path(column, "hist");
        let (mut x_min, mut x_max) = (values[0], values[values.len() - 1]);
        if (x_max - x_min).abs() < 1e-10 {
            x_min -= 0.5;
            x_max += 0.5;
        }
        let y_max = bins
            .iter()
            .map(|b| b.density)
            .chain(kde.iter().map(|(_, d)| *d))
            .fold(0.0f64, f64::max)
            .max(1e-10);

        let root = BitMapBackend::new(&path, (800, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("Distribution of {column}"), ("sans-serif", 24))
            .margin(16)
            .x_label_area_size(36)
            .y_label_area_size(48)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max * 1.1)?;

        chart
            .configure_mesh()
            .y_desc("density")
            .x_desc(column)
            .draw()?;

        chart.draw_series(bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.left, 0.0), (bin.right, bin.density)],
                BLUE.mix(0.35).filled(),
            )
        }))?;

        if !kde.is_empty() {
            chart.draw_series(LineSeries::new(kde, RED.stroke_width(2)))?;
        }

        root.present()?;
        drop(chart);
        drop(root);
        info!("Rendered histogram for '{}' to {}", column, path.display());
        Ok(path)
    }

    /// Render one box-and-whisker chart holding a box per requested column.
    pub fn boxplot(&self, df: &DataFrame, columns: &[String]) -> Result<PathBuf> {
        ensure!(!columns.is_empty(), "no columns requested for boxplot");

        let mut samples = Vec::with_capacity(columns.len());
        for column in columns {
            samples.push(self.numeric_sample(df, column)?);
        }

        // Boxplot elements draw at f32 coordinates
        let y_min = samples
            .iter()
            .filter_map(|s| s.first().copied())
            .fold(f64::INFINITY, f64::min) as f32;
        let y_max = samples
            .iter()
            .filter_map(|s| s.last().copied())
            .fold(f64::NEG_INFINITY, f64::max) as f32;
        let pad = ((y_max - y_min) * 0.1).max(0.5);

        let name = if columns.len() == 1 {
            columns[0].clone()
        } else {
            "columns".to_string()
        };
        let path = self.plot_path(&name, "box");

        let labels: Vec<&str> = columns.iter().map(|s| s.as_str()).collect();

        let root = BitMapBackend::new(&path, (800, 600)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Box plot", ("sans-serif", 24))
            .margin(16)
            .x_label_area_size(36)
            .y_label_area_size(48)
            .build_cartesian_2d(labels[..].into_segmented(), (y_min - pad)..(y_max + pad))?;

        chart.configure_mesh().y_desc("value").draw()?;

        chart.draw_series(labels.iter().zip(samples.iter()).map(|(label, sample)| {
            Boxplot::new_vertical(SegmentValue::CenterOf(label), &Quartiles::new(sample))
        }))?;

        root.present()?;
        drop(chart);
        drop(root);
        info!("Rendered boxplot to {}", path.display());
        Ok(path)
    }

    /// Render a histogram per column plus one combined boxplot.
    pub fn render_all(&self, df: &DataFrame, columns: &[String]) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "failed to create plot directory {}",
                self.output_dir.display()
            )
        })?;

        let mut paths = Vec::new();
        for column in columns {
            paths.push(self.histogram(df, column)?);
        }
        paths.push(self.boxplot(df, columns)?);
        Ok(paths)
    }

    /// Extract the sorted non-null sample of a numeric column, requiring at
    /// least one valid value.
    fn numeric_sample(&self, df: &DataFrame, column: &str) -> Result<Vec<f64>> {
        let series = df
            .column(column)
            .with_context(|| format!("column '{column}' not found"))?
            .as_materialized_series();
        ensure!(
            is_numeric_series(series),
            "column '{column}' is not numeric"
        );
        let values = sorted_non_null(series)?;
        ensure!(!values.is_empty(), "no valid values in column '{column}'");
        debug!("Collected {} values from '{}'", values.len(), column);
        Ok(values)
    }

    fn plot_path(&self, name: &str, kind: &str) -> PathBuf {
        let safe: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        Path::new(&self.output_dir).join(format!("{safe}_{kind}.png"))
    }
}
