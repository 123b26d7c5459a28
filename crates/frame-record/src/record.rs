//! Per-clip prediction record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prediction for one clip, anchored to the clip's last frame.
///
/// Created once per clip and serialized immediately; never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Index of the last frame of the clip in the source video.
    pub frame_index: usize,

    /// Softmax probability of the "pointing" class, in `[0, 1]`.
    pub prob_pointing: f32,

    /// Estimated 3D pointing direction. Not necessarily unit length.
    pub direction: [f32; 3],
}

impl FrameRecord {
    /// Build a record for the clip starting at `start_index` with `tlength` frames.
    ///
    /// `tlength` must be at least 1.
    pub fn for_clip(
        start_index: usize,
        tlength: usize,
        prob_pointing: f32,
        direction: [f32; 3],
    ) -> Self {
        Self {
            frame_index: start_index + tlength.saturating_sub(1),
            prob_pointing,
            direction,
        }
    }

    /// Euclidean length of the direction vector.
    pub fn direction_norm(&self) -> f32 {
        self.direction.iter().map(|c| c * c).sum::<f32>().sqrt()
    }

    /// Render the record as a single log line (no trailing newline).
    pub fn to_log_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FrameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.direction;
        write!(
            f,
            "[frame {:4}] prob_pointing={:.4} direction=[{:+.3}, {:+.3}, {:+.3}]",
            self.frame_index, self.prob_pointing, x, y, z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_is_last_frame_of_clip() {
        let record = FrameRecord::for_clip(10, 15, 0.5, [0.0, 0.0, 1.0]);
        assert_eq!(record.frame_index, 24);

        let record = FrameRecord::for_clip(0, 1, 0.5, [0.0; 3]);
        assert_eq!(record.frame_index, 0);
    }

    #[test]
    fn log_line_layout() {
        let record = FrameRecord {
            frame_index: 14,
            prob_pointing: 0.873_12,
            direction: [0.1124, -0.4061, 0.9071],
        };
        assert_eq!(
            record.to_log_line(),
            "[frame   14] prob_pointing=0.8731 direction=[+0.112, -0.406, +0.907]"
        );
    }

    #[test]
    fn wide_frame_indices_are_not_truncated() {
        let record = FrameRecord {
            frame_index: 123_456,
            prob_pointing: 1.0,
            direction: [0.0, 0.0, 0.0],
        };
        assert_eq!(
            record.to_log_line(),
            "[frame 123456] prob_pointing=1.0000 direction=[+0.000, +0.000, +0.000]"
        );
    }

    #[test]
    fn direction_norm() {
        let record = FrameRecord::for_clip(0, 2, 0.1, [3.0, 4.0, 0.0]);
        assert!((record.direction_norm() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn json_shape() {
        let record = FrameRecord::for_clip(0, 3, 0.25, [1.0, 0.0, 0.0]);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"frame_index\":2"));
        assert!(json.contains("\"prob_pointing\":0.25"));
    }
}
