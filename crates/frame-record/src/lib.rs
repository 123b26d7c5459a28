//! Deixis Frame Record
//!
//! The one contract between the two halves of Deixis: the inference half
//! writes one [`FrameRecord`] per clip as a text line, the analysis half
//! reads the `prob_pointing` token back out of whatever lines it is given.
//!
//! ```text
//! [frame   14] prob_pointing=0.8731 direction=[+0.112, -0.406, +0.907]
//! ```
//!
//! Readers must only rely on the `prob_pointing=<number>` token so that
//! fields can be added to the line without breaking analysis.

pub mod record;
pub mod schema;

pub use record::FrameRecord;
pub use schema::{parse_prob_pointing, PROB_POINTING_KEY};
