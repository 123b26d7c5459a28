//! Run the pointing model over a frame sequence.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::Context;
use deixis_common::config::{Device, InferenceSettings, ValidatedInference};
use deixis_inference::{
    CheckpointStateMap, ClipWindower, ImageSequenceSource, InferenceEngine, PooledLinearNetwork,
    StreamRunner,
};
use tracing::{info, warn};

/// Flag values; `None` keeps the config-file (or default) value.
pub struct InferArgs {
    pub config: Option<PathBuf>,
    pub movie: Option<PathBuf>,
    pub side: Option<String>,
    pub checkpoint: Option<PathBuf>,
    pub tlength: Option<usize>,
    pub stride: Option<usize>,
    pub device: Option<String>,
    pub log: Option<PathBuf>,
}

pub fn run(args: InferArgs) -> anyhow::Result<()> {
    let settings = resolve_settings(&args)?;
    let run = settings.validate()?;
    log_banner(&run);

    let source = ImageSequenceSource::open(&run.movie)
        .with_context(|| format!("Failed to open movie {}", run.movie.display()))?;
    let windower = ClipWindower::new(source, run.side, run.tlength)?.with_stride(run.stride)?;

    let state = CheckpointStateMap::from_path(&run.checkpoint)?;
    let mut engine = InferenceEngine::new(Box::new(PooledLinearNetwork::new(
        run.tlength,
        run.channels,
        run.hidden_size,
    )));
    engine.load(state);

    let mut runner = StreamRunner::new(windower, engine)?;
    let summary = match &args.log {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log {}", path.display()))?;
            let mut out = BufWriter::new(file);
            runner.run(&mut out)?
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            runner.run(&mut out)?
        }
    };

    if let Some(path) = &args.log {
        info!(
            "Wrote {} records to {}",
            summary.records_emitted,
            path.display()
        );
    }
    Ok(())
}

/// Config file first, then flag overrides.
fn resolve_settings(args: &InferArgs) -> anyhow::Result<InferenceSettings> {
    let mut settings = match &args.config {
        Some(path) => InferenceSettings::from_path(path)?,
        None => InferenceSettings::default(),
    };

    if let Some(movie) = &args.movie {
        settings.movie = Some(movie.clone());
    }
    if let Some(side) = &args.side {
        settings.side = Some(side.clone());
    }
    if let Some(checkpoint) = &args.checkpoint {
        settings.checkpoint = Some(checkpoint.clone());
    }
    if let Some(tlength) = args.tlength {
        settings.tlength = tlength;
    }
    if let Some(stride) = args.stride {
        settings.stride = stride;
    }
    if let Some(device) = &args.device {
        settings.device = device.parse::<Device>()?;
    }

    Ok(settings)
}

fn log_banner(run: &ValidatedInference) {
    info!(
        "Deixis inference: movie={} side={} checkpoint={}",
        run.movie.display(),
        run.side,
        run.checkpoint.display()
    );
    info!("Using temporal length tlength={}", run.tlength);
    match run.device {
        Device::Cpu => warn!("Running on CPU"),
        Device::Cuda(_) => warn!(
            "{} requested but the reference network runs on CPU only; falling back to cpu",
            run.device
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> InferArgs {
        InferArgs {
            config: None,
            movie: None,
            side: None,
            checkpoint: None,
            tlength: None,
            stride: None,
            device: None,
            log: None,
        }
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("run.json");
        std::fs::write(
            &config,
            r#"{"movie": "a", "side": "l", "checkpoint": "w.json", "tlength": 8}"#,
        )
        .unwrap();

        let settings = resolve_settings(&InferArgs {
            config: Some(config),
            side: Some("r".to_string()),
            stride: Some(2),
            device: Some("cuda:1".to_string()),
            ..args()
        })
        .unwrap();

        assert_eq!(settings.movie, Some(PathBuf::from("a")));
        assert_eq!(settings.side.as_deref(), Some("r"));
        assert_eq!(settings.tlength, 8);
        assert_eq!(settings.stride, 2);
        assert_eq!(settings.device, Device::Cuda(1));
    }

    #[test]
    fn missing_movie_fails_validation() {
        let settings = resolve_settings(&InferArgs {
            side: Some("l".to_string()),
            checkpoint: Some(PathBuf::from("w.json")),
            ..args()
        })
        .unwrap();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("movie"));
    }

    #[test]
    fn bad_device_is_rejected() {
        assert!(resolve_settings(&InferArgs {
            device: Some("tpu".to_string()),
            ..args()
        })
        .is_err());
    }
}
