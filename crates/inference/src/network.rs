//! Inference networks.
//!
//! The engine only talks to a [`PointingNetwork`]: a set of named parameters
//! plus a forward pass from a clip to raw logits and a direction.
//! [`PooledLinearNetwork`] is the bundled reference network.

use deixis_common::error::{DeixisError, DeixisResult};
use ndarray::{Array1, Array2, Axis};

use crate::checkpoint::Tensor;
use crate::windower::Clip;

/// Raw network output for one clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPrediction {
    /// `[not_pointing, pointing]` logits.
    pub action_logits: [f32; 2],
    pub direction: [f32; 3],
}

/// Why a checkpoint tensor could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindRejection {
    #[error("no parameter with this name")]
    UnknownParameter,

    #[error("expected shape {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

/// A bare inference network with named parameters.
///
/// `forward` must not mutate state: the same weights and clip always give
/// the same prediction.
pub trait PointingNetwork: Send + Sync {
    /// Every parameter the network owns, with its expected shape.
    fn parameter_shapes(&self) -> Vec<(String, Vec<usize>)>;

    /// Copy `tensor` into the parameter called `name`.
    fn bind(&mut self, name: &str, tensor: &Tensor) -> Result<(), BindRejection>;

    /// Channels each frame pixel must have.
    fn channels(&self) -> usize;

    /// Frames each clip must have.
    fn tlength(&self) -> usize;

    fn forward(&self, clip: &Clip) -> DeixisResult<RawPrediction>;
}

/// Mean-pools every frame per channel, then runs a one-hidden-layer MLP with
/// separate action and direction heads.
///
/// ```text
/// clip (T, H, W, C) ─ mean over H, W ─▶ (T·C) ─ encoder + ReLU ─▶ (hidden)
///                                                   ├─ action_head ─▶ 2
///                                                   └─ direction_head ─▶ 3
/// ```
///
/// All parameters start at zero, so an unloaded network predicts
/// `prob_pointing = 0.5` and a zero direction.
#[derive(Debug, Clone)]
pub struct PooledLinearNetwork {
    tlength: usize,
    channels: usize,
    encoder_weight: Array2<f32>,
    encoder_bias: Array1<f32>,
    action_weight: Array2<f32>,
    action_bias: Array1<f32>,
    direction_weight: Array2<f32>,
    direction_bias: Array1<f32>,
}

impl PooledLinearNetwork {
    pub const ENCODER_WEIGHT: &'static str = "encoder.weight";
    pub const ENCODER_BIAS: &'static str = "encoder.bias";
    pub const ACTION_WEIGHT: &'static str = "action_head.weight";
    pub const ACTION_BIAS: &'static str = "action_head.bias";
    pub const DIRECTION_WEIGHT: &'static str = "direction_head.weight";
    pub const DIRECTION_BIAS: &'static str = "direction_head.bias";

    pub fn new(tlength: usize, channels: usize, hidden: usize) -> Self {
        let features = tlength * channels;
        Self {
            tlength,
            channels,
            encoder_weight: Array2::zeros((hidden, features)),
            encoder_bias: Array1::zeros(hidden),
            action_weight: Array2::zeros((2, hidden)),
            action_bias: Array1::zeros(2),
            direction_weight: Array2::zeros((3, hidden)),
            direction_bias: Array1::zeros(3),
        }
    }

    pub fn hidden(&self) -> usize {
        self.encoder_bias.len()
    }

    /// Per-frame, per-channel means flattened frame-major.
    fn pooled_features(&self, clip: &Clip) -> DeixisResult<Array1<f32>> {
        let mut features = Vec::with_capacity(self.tlength * self.channels);
        for (offset, frame) in clip.frames.iter().enumerate() {
            let (height, width, channels) = frame.dim();
            if height == 0 || width == 0 || channels != self.channels {
                return Err(DeixisError::inference(
                    clip.start_index,
                    format!(
                        "frame {} has shape ({height}, {width}, {channels}), expected {} channels",
                        clip.start_index + offset,
                        self.channels
                    ),
                ));
            }
            let means = frame
                .mean_axis(Axis(0))
                .and_then(|rows| rows.mean_axis(Axis(0)))
                .ok_or_else(|| DeixisError::inference(clip.start_index, "empty frame"))?;
            features.extend(means.iter().copied());
        }
        Ok(Array1::from(features))
    }
}

fn bind_matrix(target: &mut Array2<f32>, tensor: &Tensor) -> Result<(), BindRejection> {
    let (rows, cols) = target.dim();
    if tensor.shape != [rows, cols] {
        return Err(BindRejection::ShapeMismatch {
            expected: vec![rows, cols],
            actual: tensor.shape.clone(),
        });
    }
    *target = Array2::from_shape_vec((rows, cols), tensor.data.clone()).map_err(|_| {
        BindRejection::ShapeMismatch {
            expected: vec![rows, cols],
            actual: tensor.shape.clone(),
        }
    })?;
    Ok(())
}

fn bind_vector(target: &mut Array1<f32>, tensor: &Tensor) -> Result<(), BindRejection> {
    let len = target.len();
    if tensor.shape != [len] || tensor.data.len() != len {
        return Err(BindRejection::ShapeMismatch {
            expected: vec![len],
            actual: tensor.shape.clone(),
        });
    }
    *target = Array1::from(tensor.data.clone());
    Ok(())
}

impl PointingNetwork for PooledLinearNetwork {
    fn parameter_shapes(&self) -> Vec<(String, Vec<usize>)> {
        let matrix = |name: &str, m: &Array2<f32>| (name.to_string(), m.shape().to_vec());
        let vector = |name: &str, v: &Array1<f32>| (name.to_string(), vec![v.len()]);
        vec![
            matrix(Self::ENCODER_WEIGHT, &self.encoder_weight),
            vector(Self::ENCODER_BIAS, &self.encoder_bias),
            matrix(Self::ACTION_WEIGHT, &self.action_weight),
            vector(Self::ACTION_BIAS, &self.action_bias),
            matrix(Self::DIRECTION_WEIGHT, &self.direction_weight),
            vector(Self::DIRECTION_BIAS, &self.direction_bias),
        ]
    }

    fn bind(&mut self, name: &str, tensor: &Tensor) -> Result<(), BindRejection> {
        match name {
            Self::ENCODER_WEIGHT => bind_matrix(&mut self.encoder_weight, tensor),
            Self::ENCODER_BIAS => bind_vector(&mut self.encoder_bias, tensor),
            Self::ACTION_WEIGHT => bind_matrix(&mut self.action_weight, tensor),
            Self::ACTION_BIAS => bind_vector(&mut self.action_bias, tensor),
            Self::DIRECTION_WEIGHT => bind_matrix(&mut self.direction_weight, tensor),
            Self::DIRECTION_BIAS => bind_vector(&mut self.direction_bias, tensor),
            _ => Err(BindRejection::UnknownParameter),
        }
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn tlength(&self) -> usize {
        self.tlength
    }

    fn forward(&self, clip: &Clip) -> DeixisResult<RawPrediction> {
        if clip.len() != self.tlength {
            return Err(DeixisError::inference(
                clip.start_index,
                format!("expected {} frames, got {}", self.tlength, clip.len()),
            ));
        }

        let features = self.pooled_features(clip)?;
        let hidden = (self.encoder_weight.dot(&features) + &self.encoder_bias).mapv(|v| v.max(0.0));
        let logits = self.action_weight.dot(&hidden) + &self.action_bias;
        let direction = self.direction_weight.dot(&hidden) + &self.direction_bias;

        Ok(RawPrediction {
            action_logits: [logits[0], logits[1]],
            direction: [direction[0], direction[1], direction[2]],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Frame;
    use std::sync::Arc;
    use deixis_common::config::Side;

    fn clip(tlength: usize, value: f32) -> Clip {
        Clip {
            start_index: 0,
            side: Side::Right,
            frames: vec![Arc::new(Frame::from_elem((2, 2, 3), value)); tlength],
        }
    }

    #[test]
    fn unloaded_network_is_undecided() {
        let net = PooledLinearNetwork::new(4, 3, 8);
        let out = net.forward(&clip(4, 0.7)).unwrap();
        assert_eq!(out.action_logits, [0.0, 0.0]);
        assert_eq!(out.direction, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn parameter_shapes_follow_dimensions() {
        let net = PooledLinearNetwork::new(5, 3, 16);
        let shapes = net.parameter_shapes();
        assert_eq!(shapes.len(), 6);
        assert_eq!(shapes[0], ("encoder.weight".to_string(), vec![16, 15]));
        assert_eq!(shapes[3], ("action_head.bias".to_string(), vec![2]));
        assert_eq!(shapes[4], ("direction_head.weight".to_string(), vec![3, 16]));
    }

    #[test]
    fn bind_checks_names_and_shapes() {
        let mut net = PooledLinearNetwork::new(2, 3, 4);
        assert_eq!(
            net.bind("nope", &Tensor::zeros(vec![1])),
            Err(BindRejection::UnknownParameter)
        );
        assert!(matches!(
            net.bind("action_head.bias", &Tensor::zeros(vec![3])),
            Err(BindRejection::ShapeMismatch { .. })
        ));
        assert!(net.bind("action_head.bias", &Tensor::zeros(vec![2])).is_ok());
    }

    #[test]
    fn forward_uses_bound_weights() {
        // One hidden unit summing all pooled features; pointing logit follows it.
        let tlength = 2;
        let mut net = PooledLinearNetwork::new(tlength, 3, 1);
        net.bind(
            "encoder.weight",
            &Tensor::new(vec![1, 6], vec![1.0; 6]).unwrap(),
        )
        .unwrap();
        net.bind(
            "action_head.weight",
            &Tensor::new(vec![2, 1], vec![0.0, 1.0]).unwrap(),
        )
        .unwrap();
        net.bind(
            "direction_head.bias",
            &Tensor::new(vec![3], vec![0.0, 0.0, 1.0]).unwrap(),
        )
        .unwrap();

        let out = net.forward(&clip(tlength, 0.5)).unwrap();
        assert!((out.action_logits[1] - 3.0).abs() < 1e-6);
        assert_eq!(out.action_logits[0], 0.0);
        assert_eq!(out.direction, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn relu_clamps_negative_hidden_activations() {
        let mut net = PooledLinearNetwork::new(1, 3, 1);
        net.bind("encoder.bias", &Tensor::new(vec![1], vec![-5.0]).unwrap())
            .unwrap();
        net.bind(
            "action_head.weight",
            &Tensor::new(vec![2, 1], vec![1.0, 1.0]).unwrap(),
        )
        .unwrap();
        let out = net.forward(&clip(1, 1.0)).unwrap();
        assert_eq!(out.action_logits, [0.0, 0.0]);
    }

    #[test]
    fn wrong_length_and_channels_fail() {
        let net = PooledLinearNetwork::new(3, 3, 2);
        let err = net.forward(&clip(2, 0.0)).unwrap_err();
        assert!(matches!(err, DeixisError::Inference { .. }));

        let gray = Clip {
            start_index: 7,
            side: Side::Left,
            frames: vec![Arc::new(Frame::zeros((2, 2, 1))); 3],
        };
        let err = net.forward(&gray).unwrap_err();
        assert!(err.to_string().contains("start index 7"));
    }
}
