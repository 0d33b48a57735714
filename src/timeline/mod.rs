//! # Timeline Module
//!
//! Duration reconciliation: turning an ordered list of video assets and a
//! target duration into a segment sequence that covers the target exactly.

pub mod reconciler;
pub mod types;

pub use reconciler::reconcile;
pub use types::{Segment, Timeline, DURATION_TOLERANCE};
