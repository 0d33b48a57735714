//! # Reelstitch
//!
//! Assemble narrated videos from mismatched stock clips and a fixed-length
//! voiceover track.
//!
//! Given any set of video clips of unrelated durations plus one audio track,
//! Reelstitch produces a single output video whose length exactly matches
//! the audio, looping, trimming and padding the clips as needed, and
//! synthesizing a placeholder background when no usable footage exists.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use reelstitch::{composition::AssemblyEngine, config::Config};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let engine = AssemblyEngine::new(Config::default());
//!
//! let clips = vec![PathBuf::from("ocean.mp4"), PathBuf::from("waves.mp4")];
//! let report = engine
//!     .assemble(&clips, "voiceover.mp3".as_ref(), "final.mp4".as_ref())
//!     .await?;
//!
//! println!("Wrote {:?} ({:.1}s)", report.output_path, report.duration_secs);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`media`] - Asset probing and placeholder clip synthesis
//! - [`timeline`] - Duration reconciliation into an exact segment sequence
//! - [`composition`] - The assembly pipeline and encoder-facing muxer
//! - [`providers`] - Interfaces to upstream script/footage/narration services
//! - [`config`] - Configuration management

pub mod composition;
pub mod config;
pub mod error;
pub mod media;
pub mod providers;
pub mod timeline;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{AssemblyEngine, AssemblyReport},
    config::Config,
    error::{AssemblerError, Result},
};
