use std::path::{Path, PathBuf};
use std::process::Command;

use tokio::task;
use tracing::{debug, info, warn};

use crate::error::{ComposeError, Result};
use crate::media::{AudioTrack, OutputProfile, VideoAsset};
use crate::timeline::{Timeline, DURATION_TOLERANCE};

/// Report for one successfully muxed output file
#[derive(Debug, Clone)]
pub struct MuxReport {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub file_size: u64,
    pub segment_count: usize,
    pub filler_secs: f64,
}

/// Compositor/muxer: concatenates a reconciled timeline into one continuous
/// video stream, attaches the narration track, and encodes a single output
/// file at the fixed profile.
///
/// One encoder invocation per request: every segment becomes a seek/trim
/// input normalized to the output frame size in the filter graph, an
/// optional black filler source covers any duration deficit, and the output
/// is clamped to the target duration to absorb rounding slack.
pub struct Muxer {
    ffmpeg: PathBuf,
    profile: OutputProfile,
    min_output_bytes: u64,
}

impl Muxer {
    pub fn new(profile: OutputProfile, min_output_bytes: u64) -> Result<Self> {
        let ffmpeg = which::which("ffmpeg").map_err(|_| {
            crate::error::MediaError::ToolMissing { tool: "ffmpeg".to_string() }
        })?;

        Ok(Self { ffmpeg, profile, min_output_bytes })
    }

    /// Encode the timeline with the audio track attached.
    ///
    /// Writes exactly one output file on success. On any failure the partial
    /// output is removed; no half-written file is ever left behind.
    pub async fn assemble(
        &self,
        timeline: &Timeline,
        assets: &[VideoAsset],
        audio: &AudioTrack,
        output_path: &Path,
    ) -> Result<MuxReport> {
        if timeline.is_empty() {
            return Err(ComposeError::OutputFailed {
                reason: "cannot assemble an empty timeline".to_string(),
            }
            .into());
        }

        // Step 2 of the contract: realized vs target. Under-run becomes
        // trailing filler; over-run slack is clamped by the output duration.
        let mut timeline = timeline.clone();
        timeline.balance();

        if timeline.filler_secs > 0.0 {
            info!(
                "Padding {:.3}s of black filler to reach {:.3}s target",
                timeline.filler_secs, timeline.target_secs
            );
        }

        info!(
            "Assembling {} segments + audio {:?} -> {:?}",
            timeline.len(),
            audio.path,
            output_path
        );

        let args = self.build_args(&timeline, assets, audio, output_path);
        debug!("ffmpeg {}", args.join(" "));

        let ffmpeg = self.ffmpeg.clone();
        let output = task::spawn_blocking(move || {
            let mut cmd = Command::new(ffmpeg);
            cmd.args(&args);
            cmd.output()
        })
        .await
        .map_err(|e| ComposeError::EncodeFailed {
            reason: format!("failed to spawn encoder task: {e}"),
        })?
        .map_err(|e| ComposeError::EncodeFailed {
            reason: format!("encoder execution failed: {e}"),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            self.remove_partial(output_path);
            return Err(ComposeError::EncodeFailed {
                reason: format!("ffmpeg failed: {}", stderr.trim()),
            }
            .into());
        }

        let file_size = self.validate_output(output_path)?;

        info!(
            "Encoded {:?}: {:.2}s, {:.1} MB",
            output_path,
            timeline.total_secs(),
            file_size as f64 / 1024.0 / 1024.0
        );

        Ok(MuxReport {
            path: output_path.to_path_buf(),
            duration_secs: timeline.total_secs(),
            file_size,
            segment_count: timeline.len(),
            filler_secs: timeline.filler_secs,
        })
    }

    /// Build the full encoder argument list for a balanced timeline.
    ///
    /// Inputs appear in segment order (order-preserving concatenation),
    /// followed by the filler source when one is needed, then the audio
    /// track mapped as the sole audio stream.
    fn build_args(
        &self,
        timeline: &Timeline,
        assets: &[VideoAsset],
        audio: &AudioTrack,
        output_path: &Path,
    ) -> Vec<String> {
        let (width, height) = (self.profile.width(), self.profile.height());
        let fps = self.profile.fps;
        let mut args: Vec<String> = Vec::new();

        for segment in &timeline.segments {
            let asset = &assets[segment.asset];
            args.extend([
                "-ss".to_string(),
                format!("{:.6}", segment.start),
                "-t".to_string(),
                format!("{:.6}", segment.duration_secs()),
                "-i".to_string(),
                asset.path.display().to_string(),
            ]);
        }

        let has_filler = timeline.filler_secs > DURATION_TOLERANCE;
        if has_filler {
            args.extend([
                "-f".to_string(),
                "lavfi".to_string(),
                "-t".to_string(),
                format!("{:.6}", timeline.filler_secs),
                "-i".to_string(),
                format!("color=c=black:s={width}x{height}:r={fps}"),
            ]);
        }

        let video_inputs = timeline.len() + usize::from(has_filler);
        let audio_index = video_inputs;
        args.extend(["-i".to_string(), audio.path.display().to_string()]);

        // Normalize every input to the fixed frame size and rate, then
        // concatenate in order.
        let mut filter = String::new();
        for i in 0..video_inputs {
            filter.push_str(&format!(
                "[{i}:v]scale={width}:{height}:force_original_aspect_ratio=decrease,\
                 pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}[v{i}];"
            ));
        }
        for i in 0..video_inputs {
            filter.push_str(&format!("[v{i}]"));
        }
        filter.push_str(&format!("concat=n={video_inputs}:v=1:a=0[vout]"));

        args.extend(["-filter_complex".to_string(), filter]);
        args.extend([
            "-map".to_string(),
            "[vout]".to_string(),
            "-map".to_string(),
            format!("{audio_index}:a:0"),
        ]);

        args.extend([
            "-c:v".to_string(),
            self.profile.video_codec.clone(),
            "-crf".to_string(),
            self.profile.crf().to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            fps.to_string(),
            "-c:a".to_string(),
            self.profile.audio_codec.clone(),
            // Clamp to the target: truncates encoder rounding slack
            "-t".to_string(),
            format!("{:.6}", timeline.target_secs),
            "-y".to_string(),
            output_path.display().to_string(),
        ]);

        args
    }

    /// Post-write validation: the output must exist and exceed the byte
    /// floor. A failing file is removed before the error is returned.
    fn validate_output(&self, output_path: &Path) -> Result<u64> {
        let size = std::fs::metadata(output_path).map(|m| m.len()).unwrap_or(0);

        if size <= self.min_output_bytes {
            self.remove_partial(output_path);
            return Err(ComposeError::ValidationFailed {
                path: output_path.display().to_string(),
                size,
                floor: self.min_output_bytes,
            }
            .into());
        }

        Ok(size)
    }

    fn remove_partial(&self, output_path: &Path) {
        if output_path.exists() {
            if let Err(e) = std::fs::remove_file(output_path) {
                warn!("Failed to remove partial output {:?}: {}", output_path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssemblerError;
    use crate::timeline::Segment;
    use tempfile::tempdir;

    fn muxer(min_output_bytes: u64) -> Muxer {
        Muxer {
            ffmpeg: PathBuf::from("ffmpeg"),
            profile: OutputProfile::default(),
            min_output_bytes,
        }
    }

    fn asset(name: &str, duration_secs: f64) -> VideoAsset {
        VideoAsset {
            path: PathBuf::from(name),
            duration_secs,
            width: 1920,
            height: 1080,
            fps: 30.0,
        }
    }

    fn audio() -> AudioTrack {
        AudioTrack {
            path: PathBuf::from("voice.mp3"),
            duration_secs: 10.0,
            sample_rate: 44_100,
        }
    }

    #[test]
    fn test_balanced_timeline_has_no_filler_input() {
        let assets = vec![asset("a.mp4", 6.0), asset("b.mp4", 4.0)];
        let mut timeline = Timeline::new(10.0);
        timeline.push(Segment::full(0, 6.0));
        timeline.push(Segment::full(1, 4.0));
        timeline.balance();

        let args = muxer(10_000).build_args(&timeline, &assets, &audio(), Path::new("out.mp4"));

        assert!(!args.iter().any(|a| a == "lavfi"));
        assert!(args.iter().any(|a| a.contains("concat=n=2")));
    }

    #[test]
    fn test_deficit_adds_filler_input() {
        let assets = vec![asset("a.mp4", 8.5)];
        let mut timeline = Timeline::new(10.0);
        timeline.push(Segment::full(0, 8.5));
        timeline.balance();

        let args = muxer(10_000).build_args(&timeline, &assets, &audio(), Path::new("out.mp4"));

        assert!(args.iter().any(|a| a == "lavfi"));
        assert!(args.iter().any(|a| a.starts_with("color=c=black:s=1920x1080")));
        assert!(args.iter().any(|a| a.contains("concat=n=2")));
    }

    #[test]
    fn test_output_clamped_to_target() {
        let assets = vec![asset("a.mp4", 10.0)];
        let mut timeline = Timeline::new(10.0);
        timeline.push(Segment::full(0, 10.0));
        timeline.balance();

        let args = muxer(10_000).build_args(&timeline, &assets, &audio(), Path::new("out.mp4"));

        let t_pos = args.iter().rposition(|a| a == "-t").unwrap();
        assert_eq!(args[t_pos + 1], "10.000000");
    }

    #[test]
    fn test_audio_mapped_as_sole_stream() {
        let assets = vec![asset("a.mp4", 10.0)];
        let mut timeline = Timeline::new(10.0);
        timeline.push(Segment::full(0, 10.0));
        timeline.balance();

        let args = muxer(10_000).build_args(&timeline, &assets, &audio(), Path::new("out.mp4"));

        // One video input plus the audio input at index 1
        assert!(args.iter().any(|a| a == "1:a:0"));
        assert!(args.iter().any(|a| a == "[vout]"));
    }

    #[test]
    fn test_segments_appear_in_order() {
        let assets = vec![asset("first.mp4", 3.0), asset("second.mp4", 4.0)];
        let mut timeline = Timeline::new(10.0);
        timeline.push(Segment::full(0, 3.0));
        timeline.push(Segment::full(1, 4.0));
        timeline.push(Segment::head(0, 3.0));
        timeline.balance();

        let args = muxer(10_000).build_args(&timeline, &assets, &audio(), Path::new("out.mp4"));

        let input_paths: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(i, a)| *i > 0 && args[i - 1] == "-i" && a.ends_with(".mp4"))
            .map(|(_, a)| a)
            .collect();
        assert_eq!(input_paths, vec!["first.mp4", "second.mp4", "first.mp4"]);
    }

    #[test]
    fn test_undersized_output_fails_validation_and_is_removed() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("small.mp4");
        std::fs::write(&out, vec![0u8; 100]).unwrap();

        let result = muxer(10_000).validate_output(&out);

        assert!(matches!(
            result,
            Err(AssemblerError::Compose(ComposeError::ValidationFailed { size: 100, .. }))
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_missing_output_fails_validation() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("never_written.mp4");

        let result = muxer(10_000).validate_output(&out);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_above_floor_passes_validation() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("big.mp4");
        std::fs::write(&out, vec![0u8; 2048]).unwrap();

        let size = muxer(1_000).validate_output(&out).unwrap();
        assert_eq!(size, 2048);
        assert!(out.exists());
    }

    #[tokio::test]
    async fn test_empty_timeline_rejected() {
        let timeline = Timeline::new(10.0);
        let result = muxer(10_000)
            .assemble(&timeline, &[], &audio(), Path::new("out.mp4"))
            .await;

        assert!(matches!(
            result,
            Err(AssemblerError::Compose(ComposeError::OutputFailed { .. }))
        ));
    }
}
