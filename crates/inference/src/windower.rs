//! Sliding-window clip generation.
//!
//! A pass over the video yields clips `[s, s + tlength)` for
//! `s = 0, stride, 2 * stride, ...` while a full window still fits. A
//! trailing window shorter than `tlength` is never produced.
//!
//! Within one pass each frame is decoded at most once: the iterator keeps a
//! ring of the most recent frames and only reads what the next window adds.

use std::collections::VecDeque;
use std::sync::Arc;

use deixis_common::config::Side;
use deixis_common::error::{DeixisError, DeixisResult};
use tracing::debug;

use crate::source::{Frame, FrameSource};

/// A fixed-length run of consecutive frames submitted as one inference unit.
#[derive(Debug, Clone)]
pub struct Clip {
    /// Index of the first frame in the underlying video.
    pub start_index: usize,

    pub side: Side,

    /// Shared with the windower's ring, so overlapping clips never copy pixels.
    pub frames: Vec<Arc<Frame>>,
}

impl Clip {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the last frame, the one predictions are anchored to.
    pub fn last_index(&self) -> usize {
        self.start_index + self.frames.len().saturating_sub(1)
    }
}

/// Produces overlapping clips from a frame source.
pub struct ClipWindower<S> {
    source: S,
    side: Side,
    tlength: usize,
    stride: usize,
}

impl<S: FrameSource> ClipWindower<S> {
    pub fn new(source: S, side: Side, tlength: usize) -> DeixisResult<Self> {
        if tlength == 0 {
            return Err(DeixisError::config("tlength must be at least 1"));
        }
        Ok(Self {
            source,
            side,
            tlength,
            stride: 1,
        })
    }

    pub fn with_stride(mut self, stride: usize) -> DeixisResult<Self> {
        if stride == 0 {
            return Err(DeixisError::config("stride must be at least 1"));
        }
        self.stride = stride;
        Ok(self)
    }

    pub fn tlength(&self) -> usize {
        self.tlength
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of clips one pass will yield.
    pub fn clip_count(&self) -> usize {
        let frames = self.source.frame_count();
        if frames < self.tlength {
            0
        } else {
            (frames - self.tlength) / self.stride + 1
        }
    }

    /// Start a new pass from the beginning of the video.
    pub fn clips(&mut self) -> ClipIter<'_, S> {
        ClipIter {
            total: self.clip_count(),
            emitted: 0,
            ring: VecDeque::with_capacity(self.tlength),
            ring_start: 0,
            failed: false,
            windower: self,
        }
    }
}

/// One pass over a [`ClipWindower`].
pub struct ClipIter<'a, S> {
    windower: &'a mut ClipWindower<S>,
    total: usize,
    emitted: usize,
    ring: VecDeque<Arc<Frame>>,
    /// Video index of `ring[0]`.
    ring_start: usize,
    failed: bool,
}

impl<S: FrameSource> ClipIter<'_, S> {
    fn fill_window(&mut self, start: usize) -> DeixisResult<Vec<Arc<Frame>>> {
        let tlength = self.windower.tlength;

        // Drop frames that fell behind the window.
        while self.ring_start < start && !self.ring.is_empty() {
            self.ring.pop_front();
            self.ring_start += 1;
        }
        if self.ring.is_empty() {
            self.ring_start = start;
        }

        let mut next = self.ring_start + self.ring.len();
        while next < start + tlength {
            let frame = self.windower.source.read_frame(next, self.windower.side)?;
            self.ring.push_back(Arc::new(frame));
            next += 1;
        }

        Ok(self.ring.iter().cloned().collect())
    }
}

impl<S: FrameSource> Iterator for ClipIter<'_, S> {
    type Item = DeixisResult<Clip>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.emitted >= self.total {
            return None;
        }

        let start = self.emitted * self.windower.stride;
        match self.fill_window(start) {
            Ok(frames) => {
                self.emitted += 1;
                debug!("Clip {start}..{}", start + frames.len());
                Some(Ok(Clip {
                    start_index: start,
                    side: self.windower.side,
                    frames,
                }))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.failed {
            0
        } else {
            self.total - self.emitted
        };
        (0, Some(remaining))
    }
}
