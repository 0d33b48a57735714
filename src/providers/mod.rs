//! # Provider Interfaces
//!
//! Narrow interfaces to the upstream collaborators: script/keyword
//! generation, stock footage retrieval, and narration synthesis. The
//! assembly engine consumes these as opaque providers and never depends on
//! keyword semantics beyond using them as fallback labels.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::ProviderError;

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// A narration script plus the ordered keywords extracted from it
#[derive(Debug, Clone)]
pub struct GeneratedScript {
    /// Spoken-style script suitable for voice narration
    pub script: String,

    /// Ordered stock-footage search keywords
    pub keywords: Vec<String>,
}

impl GeneratedScript {
    /// Degenerate output (empty script or no keywords) is treated as a
    /// provider failure by the pipeline.
    pub fn is_degenerate(&self) -> bool {
        self.script.trim().is_empty() || self.keywords.is_empty()
    }
}

/// Turns a user prompt into a narration script and footage keywords
#[async_trait]
pub trait ScriptProvider: Send + Sync {
    async fn generate_script(&self, prompt: &str) -> ProviderResult<GeneratedScript>;
}

/// Fetches stock clips for a keyword list into local files
///
/// An empty result is valid and triggers per-keyword placeholder clips
/// downstream.
#[async_trait]
pub trait FootageProvider: Send + Sync {
    async fn fetch_clips(
        &self,
        keywords: &[String],
        request_id: &str,
    ) -> ProviderResult<Vec<PathBuf>>;
}

/// Synthesizes a narration audio file from a script
///
/// The returned file's duration is the sole driver of the assembly target
/// duration.
#[async_trait]
pub trait NarrationProvider: Send + Sync {
    async fn synthesize(&self, script: &str, request_id: &str) -> ProviderResult<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_script_detection() {
        let empty_script = GeneratedScript {
            script: "  ".to_string(),
            keywords: vec!["ocean".to_string()],
        };
        assert!(empty_script.is_degenerate());

        let no_keywords = GeneratedScript {
            script: "A story about the sea.".to_string(),
            keywords: vec![],
        };
        assert!(no_keywords.is_degenerate());

        let usable = GeneratedScript {
            script: "A story about the sea.".to_string(),
            keywords: vec!["ocean".to_string(), "waves".to_string()],
        };
        assert!(!usable.is_degenerate());
    }
}
