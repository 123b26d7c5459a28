//! Frame sources.
//!
//! Decoding video is outside this crate. A [`FrameSource`] hands out
//! already-decoded frames by index; the windower decides which ones to read.

use std::path::{Path, PathBuf};

use deixis_common::config::Side;
use deixis_common::error::{DeixisError, DeixisResult};
use ndarray::Array3;
use tracing::debug;

/// A decoded frame: `(height, width, channels)`, values in `[0, 1]`.
pub type Frame = Array3<f32>;

/// File extensions picked up by [`ImageSequenceSource`].
pub const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Random-access source of decoded frames.
pub trait FrameSource {
    /// Total number of frames in the video.
    fn frame_count(&self) -> usize;

    /// Decode frame `index` as seen for the given side.
    fn read_frame(&mut self, index: usize, side: Side) -> DeixisResult<Frame>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// Frames held in memory. Mostly for tests and synthetic input.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    frames: Vec<Frame>,
    reads: Vec<usize>,
}

impl InMemorySource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            reads: Vec::new(),
        }
    }

    /// Frame indices in the order they were read.
    pub fn reads(&self) -> &[usize] {
        &self.reads
    }
}

impl FrameSource for InMemorySource {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn read_frame(&mut self, index: usize, _side: Side) -> DeixisResult<Frame> {
        let frame = self.frames.get(index).cloned().ok_or_else(|| {
            DeixisError::inference(
                index,
                format!("frame {index} out of range ({} frames)", self.frames.len()),
            )
        })?;
        self.reads.push(index);
        Ok(frame)
    }

    fn describe(&self) -> String {
        format!("in-memory ({} frames)", self.frames.len())
    }
}

/// A directory of frame images, ordered by file name.
///
/// Frames for [`Side::Left`] are mirrored horizontally so the network always
/// sees a right-hand view.
#[derive(Debug, Clone)]
pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> DeixisResult<Self> {
        if !dir.is_dir() {
            return Err(DeixisError::source_not_found(dir));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_frame = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_frame {
                files.push(path);
            }
        }
        files.sort();

        debug!("Found {} frame images in {}", files.len(), dir.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            files,
        })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl FrameSource for ImageSequenceSource {
    fn frame_count(&self) -> usize {
        self.files.len()
    }

    fn read_frame(&mut self, index: usize, side: Side) -> DeixisResult<Frame> {
        let path = self.files.get(index).ok_or_else(|| {
            DeixisError::inference(
                index,
                format!("frame {index} out of range ({} frames)", self.files.len()),
            )
        })?;

        let decoded = image::open(path)
            .map_err(|e| DeixisError::frame_decode(path, e.to_string()))?
            .to_rgb8();
        let rgb = match side {
            Side::Left => image::imageops::flip_horizontal(&decoded),
            Side::Right => decoded,
        };

        let (width, height) = rgb.dimensions();
        let data: Vec<f32> = rgb.into_raw().into_iter().map(|v| v as f32 / 255.0).collect();
        Frame::from_shape_vec((height as usize, width as usize, 3), data)
            .map_err(|e| DeixisError::frame_decode(path, e.to_string()))
    }

    fn describe(&self) -> String {
        format!("{} ({} frames)", self.dir.display(), self.files.len())
    }
}
