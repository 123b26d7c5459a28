//! Summarize a record log and plot the probability signal.

use std::path::PathBuf;

use anyhow::Context;
use deixis_common::config::AnalysisSettings;
use deixis_plot::{RenderOutcome, SignalVisualizer};
use deixis_signal::{extract_from_path, summarize};
use tracing::info;

pub fn run(log: PathBuf, output_dir: PathBuf, no_plots: bool, json: bool) -> anyhow::Result<()> {
    let settings = AnalysisSettings {
        log_path: log,
        output_dir,
        skip_plots: no_plots,
    };

    info!("Reading log from: {}", settings.log_path.display());
    let values = extract_from_path(&settings.log_path)
        .with_context(|| format!("Failed to read log {}", settings.log_path.display()))?;
    let summary = summarize(&values);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{summary}");
    }

    if summary.is_empty() || settings.skip_plots {
        return Ok(());
    }

    let outcome = SignalVisualizer::new(&settings.output_dir)
        .render(&values)
        .context("Failed to render plots")?;
    if let RenderOutcome::Rendered {
        timeseries,
        histogram,
    } = outcome
    {
        if !json {
            println!("\nSaved plots:");
            println!(" - {}", timeseries.display());
            println!(" - {}", histogram.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_a_log_without_plotting() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("deepoint_log.txt");
        std::fs::write(
            &log,
            "[frame   14] prob_pointing=0.8000 direction=[+0.000, +0.000, +1.000]\n\
             [frame   15] prob_pointing=0.2000 direction=[+0.000, +0.000, +1.000]\n",
        )
        .unwrap();
        let plots = dir.path().join("plots");

        run(log, plots.clone(), true, true).unwrap();
        assert!(!plots.exists());
    }

    #[test]
    fn missing_log_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("absent.txt");
        let err = run(log.clone(), dir.path().to_path_buf(), true, false).unwrap_err();
        assert!(err.to_string().contains(&log.display().to_string()));
    }
}
