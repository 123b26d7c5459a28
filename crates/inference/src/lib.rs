//! Deixis Inference
//!
//! The inference half of Deixis:
//!
//! ```text
//! FrameSource ─▶ ClipWindower ─▶ InferenceEngine ─▶ StreamRunner ─▶ log lines
//!                                      ▲
//!                  checkpoint ─ KeyNormalizer ─┘
//! ```
//!
//! - **Frame sources:** decoded frames by index (in-memory, image sequence)
//! - **Windowing:** fixed-length overlapping clips, trailing partial clip dropped
//! - **Checkpoints:** JSON state maps with pluggable key normalization
//! - **Engine:** best-effort weight binding, stable softmax, per-clip records
//! - **Runner:** single-threaded, in-order, fail-fast record stream

pub mod checkpoint;
pub mod engine;
pub mod network;
pub mod runner;
pub mod source;
pub mod windower;

pub use checkpoint::{default_normalizer, CheckpointStateMap, KeyNormalizer, StripPrefix, Tensor};
pub use engine::{pointing_probability, softmax, InferenceEngine, LoadReport};
pub use network::{PointingNetwork, PooledLinearNetwork, RawPrediction};
pub use runner::{RunSummary, StreamRunner};
pub use source::{Frame, FrameSource, ImageSequenceSource, InMemorySource};
pub use windower::{Clip, ClipWindower};
