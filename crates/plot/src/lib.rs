//! Deixis Plot — PNG charts of the pointing-probability signal
//!
//! Renders a time-series line plot and a distribution histogram into an
//! output directory. An empty sequence renders nothing.

pub mod fonts;
pub mod visualizer;

pub use visualizer::{RenderOutcome, SignalVisualizer, HISTOGRAM_FILE, TIMESERIES_FILE};
