//! Run configuration.
//!
//! Settings are loaded from an optional JSON file and then overridden by
//! command-line flags. Nothing runs until [`InferenceSettings::validate`]
//! has produced a [`ValidatedInference`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DeixisError, DeixisResult};

/// Default temporal window length, in frames.
pub const DEFAULT_TLENGTH: usize = 15;

/// Default log file consumed by the analysis stage.
pub const DEFAULT_LOG_PATH: &str = "deepoint_log.txt";

/// Channels per decoded frame; frame sources always yield RGB.
pub const FRAME_CHANNELS: usize = 3;

/// Which hand of the subject the run is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl FromStr for Side {
    type Err = DeixisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "left" => Ok(Side::Left),
            "r" | "right" => Ok(Side::Right),
            other => Err(DeixisError::config(format!(
                "invalid side `{other}`: use side=l or side=r"
            ))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "l"),
            Side::Right => write!(f, "r"),
        }
    }
}

/// Compute device requested for inference. Written as `cpu` or `cuda:N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Device {
    #[default]
    Cpu,
    Cuda(usize),
}

impl Device {
    pub fn is_gpu(&self) -> bool {
        matches!(self, Device::Cuda(_))
    }
}

impl FromStr for Device {
    type Err = DeixisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "cpu" {
            return Ok(Device::Cpu);
        }
        if s == "cuda" {
            return Ok(Device::Cuda(0));
        }
        if let Some(idx) = s.strip_prefix("cuda:") {
            return idx
                .parse()
                .map(Device::Cuda)
                .map_err(|_| DeixisError::config(format!("invalid CUDA device index `{idx}`")));
        }
        Err(DeixisError::config(format!(
            "invalid device `{s}`: use cpu, cuda or cuda:N"
        )))
    }
}

impl TryFrom<String> for Device {
    type Error = DeixisError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Device> for String {
    fn from(device: Device) -> Self {
        device.to_string()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(idx) => write!(f, "cuda:{idx}"),
        }
    }
}

/// Settings for the inference half, as read from file/flags.
///
/// Required values are optional here so that a missing one can be reported
/// by name instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Path to the frame source (a directory of decoded frames).
    pub movie: Option<PathBuf>,

    /// Side selector, `l` or `r`.
    pub side: Option<String>,

    /// Path to the checkpoint file.
    pub checkpoint: Option<PathBuf>,

    /// Frames per clip.
    pub tlength: usize,

    /// Start-index step between consecutive clips.
    pub stride: usize,

    pub device: Device,

    /// Width of the reference network's hidden layer.
    pub hidden_size: usize,

    /// Channels per frame pixel. Only [`FRAME_CHANNELS`] is accepted.
    pub channels: usize,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            movie: None,
            side: None,
            checkpoint: None,
            tlength: DEFAULT_TLENGTH,
            stride: 1,
            device: Device::Cpu,
            hidden_size: 64,
            channels: FRAME_CHANNELS,
        }
    }
}

/// Inference settings with every required value present and checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedInference {
    pub movie: PathBuf,
    pub side: Side,
    pub checkpoint: PathBuf,
    pub tlength: usize,
    pub stride: usize,
    pub device: Device,
    pub hidden_size: usize,
    pub channels: usize,
}

impl InferenceSettings {
    /// Load settings from a JSON file.
    pub fn from_path(path: &Path) -> DeixisResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeixisError::config(format!("cannot read config {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            DeixisError::config(format!("cannot parse config {}: {e}", path.display()))
        })
    }

    /// Check required settings and value ranges.
    pub fn validate(&self) -> DeixisResult<ValidatedInference> {
        let movie = self.movie.clone().ok_or_else(|| {
            DeixisError::config("please specify movie path: movie=./demo/frames")
        })?;
        let side: Side = self
            .side
            .as_deref()
            .ok_or_else(|| DeixisError::config("please specify side=l or side=r"))?
            .parse()?;
        let checkpoint = self.checkpoint.clone().ok_or_else(|| {
            DeixisError::config("please specify checkpoint=path/to/checkpoint.json")
        })?;

        if self.tlength == 0 {
            return Err(DeixisError::config("tlength must be at least 1"));
        }
        if self.stride == 0 {
            return Err(DeixisError::config("stride must be at least 1"));
        }
        if self.hidden_size == 0 {
            return Err(DeixisError::config("hidden_size must be at least 1"));
        }
        if self.channels != FRAME_CHANNELS {
            return Err(DeixisError::config(format!(
                "channels must be {FRAME_CHANNELS}: frames are decoded as RGB, got {}",
                self.channels
            )));
        }

        Ok(ValidatedInference {
            movie,
            side,
            checkpoint,
            tlength: self.tlength,
            stride: self.stride,
            device: self.device,
            hidden_size: self.hidden_size,
            channels: self.channels,
        })
    }
}

/// Settings for the analysis half.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Log file produced by the inference half.
    pub log_path: PathBuf,

    /// Directory the plots are written to.
    pub output_dir: PathBuf,

    /// Skip rendering plots.
    pub skip_plots: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            output_dir: PathBuf::from("."),
            skip_plots: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "deixis_inference=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path. Diagnostics are appended here instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}
