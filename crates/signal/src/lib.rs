//! Deixis Signal — analysis of the pointing-probability signal
//!
//! - **Extraction:** lazily read `prob_pointing` values from a record log
//! - **Summary:** count, range, mean, population std dev, threshold crossings
//! - **Histogram:** fixed-bin-count binning for the distribution plot
//!
//! Pure computation apart from opening the log file. An empty sequence is a
//! normal outcome and is represented explicitly, never as an error.

pub mod extract;
pub mod histogram;
pub mod summary;

pub use extract::{extract_from_path, extract_from_str, open_log, ProbabilityLines, ScanStats};
pub use histogram::{histogram, Histogram, DEFAULT_BINS};
pub use summary::{summarize, Summary, SummaryStats, ThresholdCount, THRESHOLDS};
