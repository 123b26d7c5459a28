//! PNG rendering of the probability signal.

use std::path::{Path, PathBuf};

use deixis_common::error::{DeixisError, DeixisResult};
use deixis_signal::histogram::{histogram, Histogram, DEFAULT_BINS};
use plotters::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::fonts::{text_available, FONT_FAMILY};

/// File name of the time-series plot.
pub const TIMESERIES_FILE: &str = "prob_pointing_timeseries.png";

/// File name of the histogram plot.
pub const HISTOGRAM_FILE: &str = "prob_pointing_histogram.png";

type PlotResult = Result<(), Box<dyn std::error::Error>>;

/// What a render call produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderOutcome {
    /// Nothing to plot; no files were written.
    Skipped,
    Rendered {
        timeseries: PathBuf,
        histogram: PathBuf,
    },
}

/// Writes the time-series and histogram plots into a directory.
///
/// Existing files with the same names are overwritten.
#[derive(Debug, Clone)]
pub struct SignalVisualizer {
    output_dir: PathBuf,
    size: (u32, u32),
    bins: usize,
}

impl SignalVisualizer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            size: (960, 720),
            bins: DEFAULT_BINS,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width.max(64), height.max(64));
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn render(&self, values: &[f64]) -> DeixisResult<RenderOutcome> {
        let Some(hist) = histogram(values, self.bins) else {
            info!("No data to plot");
            return Ok(RenderOutcome::Skipped);
        };

        std::fs::create_dir_all(&self.output_dir)?;
        let timeseries = self.output_dir.join(TIMESERIES_FILE);
        let histogram_path = self.output_dir.join(HISTOGRAM_FILE);
        let text = text_available();

        draw_timeseries(&timeseries, self.size, values, text)
            .map_err(|e| DeixisError::render(format!("{}: {e}", timeseries.display())))?;
        draw_histogram(&histogram_path, self.size, &hist, text)
            .map_err(|e| DeixisError::render(format!("{}: {e}", histogram_path.display())))?;

        info!(
            "Saved plots: {}, {}",
            timeseries.display(),
            histogram_path.display()
        );
        Ok(RenderOutcome::Rendered {
            timeseries,
            histogram: histogram_path,
        })
    }
}

/// Y range covering `[0, 1]` and any out-of-range samples.
fn probability_range(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(0.0_f64, f64::min);
    let hi = values.iter().copied().fold(1.0_f64, f64::max);
    (lo, hi)
}

fn draw_timeseries(path: &Path, size: (u32, u32), values: &[f64], text: bool) -> PlotResult {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = (values.len().saturating_sub(1)).max(1) as f64;
    let (y_lo, y_hi) = probability_range(values);

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(16)
        .x_label_area_size(44)
        .y_label_area_size(60);
    if text {
        builder.caption("Pointing probability over time", (FONT_FAMILY, 24));
    }
    let mut chart = builder.build_cartesian_2d(0.0..x_max, y_lo..y_hi)?;

    let mut mesh = chart.configure_mesh();
    mesh.light_line_style(RGBColor(230, 230, 230).stroke_width(1));
    if text {
        mesh.x_desc("Frame index (approx.)")
            .y_desc("prob_pointing")
            .label_style((FONT_FAMILY, 14).into_font());
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw()?;

    chart.draw_series(LineSeries::new(
        values.iter().enumerate().map(|(i, &v)| (i as f64, v)),
        &RGBColor(31, 119, 180),
    ))?;

    root.present()?;
    Ok(())
}

fn draw_histogram(path: &Path, size: (u32, u32), hist: &Histogram, text: bool) -> PlotResult {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let x_lo = hist.edges[0];
    let x_hi = hist.edges[hist.edges.len() - 1];
    let y_hi = (hist.max_count() as f64 * 1.05).max(1.0);

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(16)
        .x_label_area_size(44)
        .y_label_area_size(60);
    if text {
        builder.caption("Distribution of pointing probabilities", (FONT_FAMILY, 24));
    }
    let mut chart = builder.build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)?;

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .light_line_style(RGBColor(230, 230, 230).stroke_width(1));
    if text {
        mesh.x_desc("prob_pointing")
            .y_desc("Count")
            .label_style((FONT_FAMILY, 14).into_font());
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw()?;

    let fill = RGBColor(31, 119, 180);
    chart.draw_series(hist.iter_bins().map(|(left, right, count)| {
        Rectangle::new([(left, 0.0), (right, count as f64)], fill.filled())
    }))?;
    chart.draw_series(
        hist.iter_bins()
            .filter(|(_, _, count)| *count > 0)
            .map(|(left, right, count)| {
                Rectangle::new([(left, 0.0), (right, count as f64)], BLACK.stroke_width(1))
            }),
    )?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_range_includes_unit_interval() {
        assert_eq!(probability_range(&[0.2, 0.4]), (0.0, 1.0));
        assert_eq!(probability_range(&[-0.5, 1.5]), (-0.5, 1.5));
    }

    #[test]
    fn empty_sequence_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plots");
        let outcome = SignalVisualizer::new(&out).render(&[]).unwrap();
        assert_eq!(outcome, RenderOutcome::Skipped);
        assert!(!out.exists());
    }
}
