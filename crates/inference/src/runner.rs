//! Drives windowing and inference and writes one record line per clip.

use std::io::Write;

use deixis_common::clock::{ProgressGate, RunClock};
use deixis_common::error::{DeixisError, DeixisResult};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::engine::InferenceEngine;
use crate::source::FrameSource;
use crate::windower::ClipWindower;

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub records_emitted: u64,
    pub first_frame: Option<usize>,
    pub last_frame: Option<usize>,
    pub elapsed_secs: f64,
}

/// Sequential clip → record pipeline.
///
/// One clip at a time, strictly in window order; the first failure ends
/// the run. Every line is flushed as soon as it is written so an
/// interrupted run still leaves a usable log.
pub struct StreamRunner<S> {
    windower: ClipWindower<S>,
    engine: InferenceEngine,
    progress_every: u64,
}

impl<S: FrameSource> StreamRunner<S> {
    pub fn new(windower: ClipWindower<S>, engine: InferenceEngine) -> DeixisResult<Self> {
        if windower.tlength() != engine.tlength() {
            return Err(DeixisError::config(format!(
                "windower produces {}-frame clips but the engine expects {}",
                windower.tlength(),
                engine.tlength()
            )));
        }
        Ok(Self {
            windower,
            engine,
            progress_every: 100,
        })
    }

    /// Log progress every `every` clips; `0` disables progress logging.
    pub fn with_progress_every(mut self, every: u64) -> Self {
        self.progress_every = every;
        self
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn windower(&self) -> &ClipWindower<S> {
        &self.windower
    }

    pub fn run<W: Write>(&mut self, out: &mut W) -> DeixisResult<RunSummary> {
        let clock = RunClock::start();
        let total = self.windower.clip_count();
        let mut gate = ProgressGate::new(self.progress_every);

        info!(
            "Running inference on {} at {} (tlength={}, stride={}, side={}, {} clips)",
            self.windower.source().describe(),
            clock.epoch_wall(),
            self.windower.tlength(),
            self.windower.stride(),
            self.windower.side(),
            total
        );
        if total == 0 {
            warn!("Video is shorter than one clip; no records will be emitted");
        }

        let mut summary = RunSummary {
            records_emitted: 0,
            first_frame: None,
            last_frame: None,
            elapsed_secs: 0.0,
        };

        let engine = &self.engine;
        for clip in self.windower.clips() {
            let record = clip.and_then(|clip| engine.predict(&clip)).map_err(|e| {
                error!(
                    "Run aborted after {} records: {e}",
                    summary.records_emitted
                );
                e
            })?;

            writeln!(out, "{record}")?;
            out.flush()?;

            summary.first_frame.get_or_insert(record.frame_index);
            summary.last_frame = Some(record.frame_index);
            summary.records_emitted += 1;

            if gate.tick() {
                info!(
                    "{}/{} clips ({:.1} clips/s)",
                    summary.records_emitted,
                    total,
                    clock.rate(summary.records_emitted)
                );
            }
        }

        summary.elapsed_secs = clock.elapsed_secs();
        info!(
            "Done: {} records in {:.1}s",
            summary.records_emitted, summary.elapsed_secs
        );
        Ok(summary)
    }
}
