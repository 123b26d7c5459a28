//! Descriptive statistics over a probability sequence.

use std::fmt;

use serde::Serialize;

/// Thresholds reported by [`summarize`].
pub const THRESHOLDS: [f64; 3] = [0.2, 0.5, 0.8];

/// Number of samples at or above a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdCount {
    pub threshold: f64,
    pub count: usize,
    /// `100 * count / total`, unrounded.
    pub percent: f64,
}

/// Snapshot of a non-empty sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation; `None` with fewer than two samples.
    pub std_dev: Option<f64>,
    pub crossings: Vec<ThresholdCount>,
}

/// Either there was nothing to summarize, or there was.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Summary {
    Empty,
    NonEmpty(SummaryStats),
}

impl Summary {
    pub fn stats(&self) -> Option<&SummaryStats> {
        match self {
            Summary::Empty => None,
            Summary::NonEmpty(stats) => Some(stats),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Summary::Empty)
    }
}

/// Summarize with the fixed report thresholds.
pub fn summarize(values: &[f64]) -> Summary {
    summarize_with_thresholds(values, &THRESHOLDS)
}

pub fn summarize_with_thresholds(values: &[f64], thresholds: &[f64]) -> Summary {
    if values.is_empty() {
        return Summary::Empty;
    }

    let count = values.len();
    let n = count as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / n;
    let std_dev = (count >= 2).then(|| {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        variance.sqrt()
    });

    let crossings = thresholds
        .iter()
        .map(|&threshold| {
            let count_at = values.iter().filter(|&&p| p >= threshold).count();
            ThresholdCount {
                threshold,
                count: count_at,
                percent: 100.0 * count_at as f64 / n,
            }
        })
        .collect();

    Summary::NonEmpty(SummaryStats {
        count,
        min,
        max,
        mean,
        std_dev,
        crossings,
    })
}

impl fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total frames with prob_pointing: {}", self.count)?;
        writeln!(f, "Min probability:  {:.4}", self.min)?;
        writeln!(f, "Max probability:  {:.4}", self.max)?;
        writeln!(f, "Mean probability: {:.4}", self.mean)?;
        if let Some(std_dev) = self.std_dev {
            writeln!(f, "Std dev:          {std_dev:.4}")?;
        }
        for crossing in &self.crossings {
            writeln!(
                f,
                "Frames with prob_pointing >= {:.1}: {} ({:.1}%)",
                crossing.threshold, crossing.count, crossing.percent
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Empty => writeln!(f, "No prob_pointing values found in the log file."),
            Summary::NonEmpty(stats) => fmt::Display::fmt(stats, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stats(values: &[f64]) -> SummaryStats {
        summarize(values).stats().cloned().unwrap()
    }

    #[test]
    fn empty_sequence_is_reported_not_raised() {
        let summary = summarize(&[]);
        assert!(summary.is_empty());
        assert_eq!(
            summary.to_string(),
            "No prob_pointing values found in the log file.\n"
        );
    }

    #[test]
    fn four_sample_scenario() {
        let s = stats(&[0.1, 0.3, 0.6, 0.9]);
        assert_eq!(s.count, 4);
        assert!((s.min - 0.1).abs() < 1e-12);
        assert!((s.max - 0.9).abs() < 1e-12);
        assert!((s.mean - 0.475).abs() < 1e-12);
        let counts: Vec<usize> = s.crossings.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![3, 2, 1]);
        // population: sqrt(mean of squared deviations)
        let expected = ((0.375f64.powi(2) + 0.175f64.powi(2) + 0.125f64.powi(2) + 0.425f64.powi(2))
            / 4.0)
            .sqrt();
        assert!((s.std_dev.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn single_sample_has_no_std_dev() {
        let s = stats(&[0.42]);
        assert_eq!(s.std_dev, None);
        assert!(!s.to_string().contains("Std dev"));
    }

    #[test]
    fn threshold_is_inclusive() {
        let s = stats(&[0.2, 0.5, 0.8]);
        let counts: Vec<usize> = s.crossings.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![3, 2, 1]);
    }

    #[test]
    fn report_format() {
        let report = summarize(&[0.1, 0.3, 0.6, 0.9]).to_string();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "Total frames with prob_pointing: 4");
        assert_eq!(lines[1], "Min probability:  0.1000");
        assert_eq!(lines[3], "Mean probability: 0.4750");
        assert_eq!(lines[5], "Frames with prob_pointing >= 0.2: 3 (75.0%)");
        assert_eq!(lines[7], "Frames with prob_pointing >= 0.8: 1 (25.0%)");
    }

    #[test]
    fn percent_is_exact_count_ratio() {
        let s = stats(&[0.9, 0.1, 0.1]);
        let c = s.crossings[2];
        assert_eq!(c.count, 1);
        assert!((c.percent - 100.0 / 3.0).abs() < 1e-12);
        assert!(s.to_string().contains("(33.3%)"));
    }

    #[test]
    fn serializes_with_status_tag() {
        let json = serde_json::to_string(&summarize(&[])).unwrap();
        assert_eq!(json, r#"{"status":"empty"}"#);
    }

    proptest! {
        #[test]
        fn crossings_never_increase_with_threshold(values in proptest::collection::vec(0.0f64..=1.0, 0..200)) {
            if let Summary::NonEmpty(s) = summarize(&values) {
                prop_assert!(s.crossings[0].count >= s.crossings[1].count);
                prop_assert!(s.crossings[1].count >= s.crossings[2].count);
                prop_assert!(s.min - 1e-12 <= s.mean && s.mean <= s.max + 1e-12);
            }
        }

        #[test]
        fn summarize_is_bit_identical_on_repeat(values in proptest::collection::vec(0.0f64..=1.0, 0..100)) {
            let a = summarize(&values);
            let b = summarize(&values);
            prop_assert_eq!(format!("{a:?}"), format!("{b:?}"));
            if let (Some(x), Some(y)) = (a.stats(), b.stats()) {
                prop_assert_eq!(x.mean.to_bits(), y.mean.to_bits());
                prop_assert_eq!(x.std_dev.map(f64::to_bits), y.std_dev.map(f64::to_bits));
            }
        }
    }
}
