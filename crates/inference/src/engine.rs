//! Inference engine: checkpoint binding plus per-clip prediction.

use deixis_common::error::{DeixisError, DeixisResult};
use deixis_frame_record::FrameRecord;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::checkpoint::{default_normalizer, CheckpointStateMap, KeyNormalizer};
use crate::network::{BindRejection, PointingNetwork, RawPrediction};
use crate::windower::Clip;

/// Index of the "pointing" class in the action logits.
pub const POINTING_CLASS: usize = 1;

/// What happened to each parameter during a best-effort load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Network parameters that received checkpoint weights.
    pub bound: Vec<String>,
    /// Checkpoint entries the network has no parameter for.
    pub unexpected: Vec<String>,
    /// Network parameters the checkpoint did not provide; left at zero.
    pub missing: Vec<String>,
    /// Entries present on both sides with incompatible shapes; dropped.
    pub shape_mismatched: Vec<String>,
    /// Checkpoint keys that collided with another after normalization.
    pub collisions: Vec<String>,
}

impl LoadReport {
    /// Every checkpoint entry that did not end up in the network.
    pub fn dropped(&self) -> impl Iterator<Item = &str> {
        self.unexpected
            .iter()
            .chain(&self.shape_mismatched)
            .chain(&self.collisions)
            .map(String::as_str)
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
            && self.unexpected.is_empty()
            && self.shape_mismatched.is_empty()
            && self.collisions.is_empty()
    }
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Softmax probability of the pointing class.
pub fn pointing_probability(action_logits: &[f32; 2]) -> f32 {
    softmax(action_logits)[POINTING_CLASS]
}

/// Wraps a network; read-only once loaded.
pub struct InferenceEngine {
    network: Box<dyn PointingNetwork>,
    tlength: usize,
}

impl InferenceEngine {
    pub fn new(network: Box<dyn PointingNetwork>) -> Self {
        let tlength = network.tlength();
        Self { network, tlength }
    }

    pub fn tlength(&self) -> usize {
        self.tlength
    }

    pub fn network(&self) -> &dyn PointingNetwork {
        self.network.as_ref()
    }

    /// Bind a checkpoint using the default wrapper-prefix conventions.
    pub fn load(&mut self, state: CheckpointStateMap) -> LoadReport {
        self.load_with(state, &default_normalizer())
    }

    /// Bind a checkpoint, renaming keys through `normalizer` first.
    ///
    /// Never fails: unknown, missing and mis-shaped parameters are recorded
    /// in the report and loading carries on.
    pub fn load_with(
        &mut self,
        state: CheckpointStateMap,
        normalizer: &dyn KeyNormalizer,
    ) -> LoadReport {
        let normalized = state.into_normalized(normalizer);
        let mut report = LoadReport {
            collisions: normalized.collisions,
            ..Default::default()
        };

        for (name, tensor) in normalized.state.iter() {
            match self.network.bind(name, tensor) {
                Ok(()) => report.bound.push(name.to_string()),
                Err(BindRejection::UnknownParameter) => report.unexpected.push(name.to_string()),
                Err(rejection @ BindRejection::ShapeMismatch { .. }) => {
                    warn!("Dropping checkpoint parameter `{name}`: {rejection}");
                    report.shape_mismatched.push(name.to_string());
                }
            }
        }

        report.missing = self
            .network
            .parameter_shapes()
            .into_iter()
            .map(|(name, _)| name)
            .filter(|name| !report.bound.contains(name))
            .collect();

        info!(
            "Loaded checkpoint: {} bound, {} unexpected, {} missing, {} shape-mismatched",
            report.bound.len(),
            report.unexpected.len(),
            report.missing.len(),
            report.shape_mismatched.len()
        );
        if !report.missing.is_empty() {
            warn!(
                "Parameters left at initial values: {}",
                report.missing.join(", ")
            );
        }
        if !report.unexpected.is_empty() {
            debug!("Unused checkpoint entries: {}", report.unexpected.join(", "));
        }

        report
    }

    /// Raw logits and direction for one clip.
    pub fn infer(&self, clip: &Clip) -> DeixisResult<RawPrediction> {
        if clip.len() != self.tlength {
            return Err(DeixisError::inference(
                clip.start_index,
                format!("expected {} frames, got {}", self.tlength, clip.len()),
            ));
        }
        if let Some(first) = clip.frames.first() {
            if let Some(offset) = clip.frames.iter().position(|f| f.dim() != first.dim()) {
                return Err(DeixisError::inference(
                    clip.start_index,
                    format!(
                        "frame {} has shape {:?}, expected {:?}",
                        clip.start_index + offset,
                        clip.frames[offset].dim(),
                        first.dim()
                    ),
                ));
            }
        }
        let raw = self.network.forward(clip)?;
        if raw.action_logits.iter().chain(&raw.direction).any(|v| !v.is_finite()) {
            return Err(DeixisError::inference(
                clip.start_index,
                format!(
                    "non-finite network output: logits {:?}, direction {:?}",
                    raw.action_logits, raw.direction
                ),
            ));
        }
        Ok(raw)
    }

    /// Prediction for one clip as a log record.
    pub fn predict(&self, clip: &Clip) -> DeixisResult<FrameRecord> {
        let raw = self.infer(clip)?;
        Ok(FrameRecord::for_clip(
            clip.start_index,
            self.tlength,
            pointing_probability(&raw.action_logits),
            raw.direction,
        ))
    }
}
