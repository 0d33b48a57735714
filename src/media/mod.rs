//! # Media Module
//!
//! Probing of video and audio resources into normalized handles, plus
//! deterministic placeholder clip synthesis.

pub mod fallback;
pub mod loader;
pub mod types;

pub use fallback::{sanitize_label, FallbackGenerator};
pub use loader::MediaLoader;
pub use types::{AudioTrack, OutputProfile, VideoAsset};
