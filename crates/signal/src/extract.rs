//! Reading the probability sequence back out of a record log.
//!
//! Logs may come from interrupted or mixed-output runs, so anything that is
//! not a well-formed `prob_pointing=<number>` token is skipped rather than
//! treated as an error. Emission order is the temporal order.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use deixis_common::error::{DeixisError, DeixisResult};
use deixis_frame_record::{parse_prob_pointing, PROB_POINTING_KEY};
use tracing::{debug, warn};

/// Counters collected while scanning a log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub lines: u64,
    pub values: u64,
    /// Lines that mention the key but carry no usable number.
    pub malformed: u64,
}

/// Lazily yields one probability per matching line.
pub struct ProbabilityLines<R> {
    reader: R,
    buf: Vec<u8>,
    stats: ScanStats,
    done: bool,
}

impl<R: BufRead> ProbabilityLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            stats: ScanStats::default(),
            done: false,
        }
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }
}

impl<R: BufRead> Iterator for ProbabilityLines<R> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.stats.lines += 1;
                    let line = String::from_utf8_lossy(&self.buf);
                    match parse_prob_pointing(&line) {
                        Some(value) => {
                            self.stats.values += 1;
                            return Some(value);
                        }
                        None if line.contains(PROB_POINTING_KEY) => {
                            self.stats.malformed += 1;
                            debug!("Skipping malformed line {}", self.stats.lines);
                        }
                        None => {}
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    // Treat a read failure like a truncated log.
                    warn!("Stopped reading log after {} lines: {e}", self.stats.lines);
                    self.done = true;
                }
            }
        }
        None
    }
}

/// Extract every probability from in-memory log text.
pub fn extract_from_str(text: &str) -> Vec<f64> {
    ProbabilityLines::new(text.as_bytes()).collect()
}

/// Open a log file for lazy extraction.
pub fn open_log(path: &Path) -> DeixisResult<ProbabilityLines<BufReader<File>>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DeixisError::source_not_found(path),
        _ => DeixisError::Io(e),
    })?;
    if file.metadata()?.is_dir() {
        return Err(DeixisError::source_not_found(path));
    }
    Ok(ProbabilityLines::new(BufReader::new(file)))
}

/// Read a whole log file into a probability sequence.
pub fn extract_from_path(path: &Path) -> DeixisResult<Vec<f64>> {
    let mut lines = open_log(path)?;
    let values: Vec<f64> = lines.by_ref().collect();
    let stats = lines.stats();
    if stats.malformed > 0 {
        warn!(
            "Skipped {} malformed prob_pointing lines in {}",
            stats.malformed,
            path.display()
        );
    }
    debug!(
        "Extracted {} values from {} lines of {}",
        stats.values,
        stats.lines,
        path.display()
    );
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_lines_keep_only_valid_tokens() {
        let text = "prob_pointing=0.75\ngarbage line\nprob_pointing=abc\n";
        assert_eq!(extract_from_str(text), vec![0.75]);
    }

    #[test]
    fn empty_sources_yield_nothing() {
        assert!(extract_from_str("").is_empty());
        assert!(extract_from_str("=== Running ===\n\nnothing here\n").is_empty());
    }

    #[test]
    fn emission_order_is_preserved() {
        let text = "\
[frame   20] prob_pointing=0.9000 direction=[+0.000, +0.000, +1.000]
[frame   14] prob_pointing=0.1000 direction=[+0.000, +0.000, +1.000]
[frame   17] prob_pointing=0.5000 direction=[+0.000, +0.000, +1.000]";
        assert_eq!(extract_from_str(text), vec![0.9, 0.1, 0.5]);
    }

    #[test]
    fn truncated_last_line_still_counts() {
        let text = "[frame    0] prob_pointing=0.2500 direction=[+0.0";
        assert_eq!(extract_from_str(text), vec![0.25]);
    }

    #[test]
    fn invalid_utf8_is_tolerated() {
        let bytes: &[u8] = b"\xff\xfe noise\nprob_pointing=0.5 \xff\n";
        let values: Vec<f64> = ProbabilityLines::new(bytes).collect();
        assert_eq!(values, vec![0.5]);
    }

    #[test]
    fn stats_count_malformed_lines() {
        let mut lines = ProbabilityLines::new("prob_pointing=x\nprob_pointing=0.1\nfoo\n".as_bytes());
        assert_eq!(lines.by_ref().count(), 1);
        assert_eq!(
            lines.stats(),
            ScanStats {
                lines: 3,
                values: 1,
                malformed: 1
            }
        );
    }

    #[test]
    fn missing_log_is_source_not_found() {
        let err = extract_from_path(Path::new("/nonexistent/deepoint_log.txt")).unwrap_err();
        assert!(matches!(err, DeixisError::SourceNotFound { .. }));
    }

    #[test]
    fn reads_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deepoint_log.txt");
        std::fs::write(&path, "Using temporal length tlength=15\nprob_pointing=0.3\n").unwrap();
        assert_eq!(extract_from_path(&path).unwrap(), vec![0.3]);

        let err = extract_from_path(dir.path()).unwrap_err();
        assert!(matches!(err, DeixisError::SourceNotFound { .. }));
    }
}
