use std::path::{Path, PathBuf};

use tokio::task;
use tracing::{info, warn};

use crate::{
    composition::muxer::Muxer,
    config::Config,
    error::{AssemblerError, ProviderError, Result, TimelineError},
    media::{sanitize_label, AudioTrack, FallbackGenerator, MediaLoader, VideoAsset},
    providers::{FootageProvider, NarrationProvider, ScriptProvider},
    timeline::{reconcile, Timeline},
};

/// Terminal artifact of a successful assembly request
///
/// The failure arm is the typed error returned alongside this; together they
/// describe every outcome a caller can observe.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    /// Path of the written output file
    pub output_path: PathBuf,

    /// Realized duration in seconds (equals the audio duration)
    pub duration_secs: f64,

    /// Output file size in bytes
    pub file_size: u64,

    /// Number of timeline segments encoded
    pub segment_count: usize,

    /// Whether the whole-pipeline fallback clip was used
    pub used_fallback: bool,
}

/// Result of the full prompt-to-video pipeline
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub script: String,
    pub keywords: Vec<String>,
    pub report: AssemblyReport,
}

/// Request-scoped assembly engine
///
/// The engine drives a single synchronous pipeline per request:
/// 1. Audio Probing - the narration track's duration becomes the target
/// 2. Video Probing - batch, skip-and-continue, original order preserved
/// 3. Timeline Reconciliation - segments covering the target exactly
/// 4. Composition - concatenate, pad/trim, attach audio, encode, validate
///
/// It exclusively owns every media handle and scratch file for the request
/// and releases them on all exit paths.
pub struct AssemblyEngine {
    config: Config,
}

impl AssemblyEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Assemble the given clips and narration track into one output video.
    ///
    /// The output's duration equals the audio track's duration exactly.
    /// Unreadable or ineligible clips are skipped with a logged reason; when
    /// no clip survives, a placeholder background is synthesized instead.
    /// Only encode-stage failures (or an unreadable audio track) reach the
    /// caller as errors.
    pub async fn assemble(
        &self,
        video_paths: &[PathBuf],
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<AssemblyReport> {
        info!("🎬 Starting assembly");
        info!("   Audio: {:?}", audio_path);
        info!("   Clips: {}", video_paths.len());
        info!("   Output: {:?}", output_path);

        let loader = MediaLoader::new()?;

        // Pipeline Step 1: Audio Probing
        let audio = self.open_audio(&loader, audio_path).await?;

        // Pipeline Step 2: Video Probing
        let assets = loader.load_eligible(video_paths).await;
        info!("   {} of {} clips usable", assets.len(), video_paths.len());

        // Scratch space for synthesized clips; removed on every exit path
        let scratch = tempfile::Builder::new().prefix("reelstitch_").tempdir()?;

        // Pipeline Step 3: Timeline Reconciliation (fallback on empty input)
        let (timeline, assets, used_fallback) =
            self.plan_timeline(assets, &audio, scratch.path()).await?;

        // Pipeline Step 4: Composition
        let muxer = Muxer::new(
            self.config.output.profile.clone(),
            self.config.output.min_output_bytes,
        )?;
        let mux = muxer.assemble(&timeline, &assets, &audio, output_path).await?;

        info!("🎉 Assembly complete! Output saved to: {:?}", output_path);

        Ok(AssemblyReport {
            output_path: mux.path,
            duration_secs: mux.duration_secs,
            file_size: mux.file_size,
            segment_count: mux.segment_count,
            used_fallback,
        })
    }

    /// Run the full prompt-to-video pipeline over the upstream providers.
    ///
    /// Script generation must yield usable output and narration must
    /// synthesize; a failed or empty footage fetch degrades to per-keyword
    /// placeholder clips instead of failing the request. The output file is
    /// named deterministically from the request identifier.
    pub async fn generate<S, F, N>(
        &self,
        prompt: &str,
        request_id: &str,
        script_provider: &S,
        footage_provider: &F,
        narration_provider: &N,
        output_dir: &Path,
    ) -> Result<GenerationOutcome>
    where
        S: ScriptProvider,
        F: FootageProvider,
        N: NarrationProvider,
    {
        info!("🧠 Step 1: Generating script for request {}", request_id);
        let generated = script_provider.generate_script(prompt).await?;
        if generated.is_degenerate() {
            return Err(ProviderError::ScriptFailed {
                reason: "response missing script or keywords".to_string(),
            }
            .into());
        }
        info!(
            "   Script: {} chars, keywords: {:?}",
            generated.script.len(),
            generated.keywords
        );

        info!("📹 Step 2: Fetching stock footage...");
        let mut clip_paths = match footage_provider
            .fetch_clips(&generated.keywords, request_id)
            .await
        {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Footage fetch failed, degrading to placeholders: {}", e);
                Vec::new()
            }
        };

        // Per-keyword placeholders must outlive the encode below
        let scratch = tempfile::Builder::new().prefix("reelstitch_").tempdir()?;
        if clip_paths.is_empty() {
            warn!("No footage available; generating per-keyword placeholders");
            clip_paths = self
                .keyword_fallback_clips(&generated.keywords, request_id, scratch.path())
                .await?;
        }

        info!("🎤 Step 3: Synthesizing narration...");
        let audio_path = narration_provider
            .synthesize(&generated.script, request_id)
            .await?;

        info!("🎞  Step 4: Assembling final video...");
        let output_path = output_dir.join(format!("final_video_{request_id}.mp4"));
        let report = self.assemble(&clip_paths, &audio_path, &output_path).await?;

        Ok(GenerationOutcome {
            script: generated.script,
            keywords: generated.keywords,
            report,
        })
    }

    async fn open_audio(&self, loader: &MediaLoader, audio_path: &Path) -> Result<AudioTrack> {
        let loader = loader.clone();
        let path = audio_path.to_path_buf();
        let audio = task::spawn_blocking(move || loader.open_audio(&path))
            .await
            .map_err(|e| AssemblerError::generic(format!("audio probe task failed: {e}")))??;

        info!("🎵 Target duration: {:.2}s", audio.duration_secs);
        Ok(audio)
    }

    /// Reconcile the probed assets, falling back to a synthesized
    /// background clip when none are usable.
    async fn plan_timeline(
        &self,
        assets: Vec<VideoAsset>,
        audio: &AudioTrack,
        scratch_dir: &Path,
    ) -> Result<(Timeline, Vec<VideoAsset>, bool)> {
        match reconcile(&assets, audio.duration_secs) {
            Ok(timeline) => {
                info!(
                    "⏱  Timeline: {} segments covering {:.2}s",
                    timeline.len(),
                    timeline.target_secs
                );
                Ok((timeline, assets, false))
            }
            Err(TimelineError::EmptyInput) => {
                warn!("No usable clips; generating fallback background");

                let generator = FallbackGenerator::new(self.config.output.profile.clone())?;
                let clip_path = scratch_dir.join("fallback_background.mp4");
                let asset = generator
                    .generate(
                        audio.duration_secs,
                        &self.config.fallback.caption,
                        self.config.fallback.background,
                        &clip_path,
                    )
                    .await?;

                let fallback_assets = vec![asset];
                let timeline = reconcile(&fallback_assets, audio.duration_secs)?;
                Ok((timeline, fallback_assets, true))
            }
        }
    }

    /// One placeholder clip per keyword, colors cycled from the configured
    /// palette. Individual generation failures are skipped, matching the
    /// loader's per-asset policy.
    async fn keyword_fallback_clips(
        &self,
        keywords: &[String],
        request_id: &str,
        scratch_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let fallback = &self.config.fallback;
        let generator = FallbackGenerator::new(self.config.output.profile.clone())?;
        let mut paths = Vec::new();

        for (index, keyword) in keywords.iter().take(fallback.max_keyword_clips).enumerate() {
            let color = fallback.keyword_palette[index % fallback.keyword_palette.len()];
            let label = sanitize_label(keyword).to_uppercase();
            let safe_keyword = sanitize_label(keyword).replace(' ', "_");
            let clip_path =
                scratch_dir.join(format!("fallback_{safe_keyword}_{request_id}_{index}.mp4"));

            match generator
                .generate(fallback.keyword_clip_secs, &label, color, &clip_path)
                .await
            {
                Ok(asset) => paths.push(asset.path),
                Err(e) => warn!("Failed to create placeholder for '{}': {}", keyword, e),
            }
        }

        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{GeneratedScript, ProviderResult};
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct StubScript {
        script: String,
        keywords: Vec<String>,
    }

    #[async_trait]
    impl ScriptProvider for StubScript {
        async fn generate_script(&self, _prompt: &str) -> ProviderResult<GeneratedScript> {
            Ok(GeneratedScript {
                script: self.script.clone(),
                keywords: self.keywords.clone(),
            })
        }
    }

    struct StubFootage;

    #[async_trait]
    impl FootageProvider for StubFootage {
        async fn fetch_clips(
            &self,
            _keywords: &[String],
            _request_id: &str,
        ) -> ProviderResult<Vec<PathBuf>> {
            Ok(vec![])
        }
    }

    struct StubNarration;

    #[async_trait]
    impl NarrationProvider for StubNarration {
        async fn synthesize(&self, _script: &str, _request_id: &str) -> ProviderResult<PathBuf> {
            Err(ProviderError::NarrationFailed {
                reason: "stub".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_degenerate_script_rejected() {
        let engine = AssemblyEngine::new(Config::default());
        let out_dir = tempdir().unwrap();

        let script = StubScript {
            script: "   ".to_string(),
            keywords: vec!["ocean".to_string()],
        };

        let result = engine
            .generate("a prompt", "req1", &script, &StubFootage, &StubNarration, out_dir.path())
            .await;

        assert!(matches!(
            result,
            Err(AssemblerError::Provider(ProviderError::ScriptFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_missing_audio_is_terminal() {
        let engine = AssemblyEngine::new(Config::default());
        let out_dir = tempdir().unwrap();

        let result = engine
            .assemble(
                &[],
                Path::new("no_such_voiceover.mp3"),
                &out_dir.path().join("out.mp4"),
            )
            .await;

        // Without a narration track there is no target duration to
        // assemble against.
        assert!(result.is_err());
    }
}
