use std::path::{Path, PathBuf};
use std::process::Command;

use image::{ImageBuffer, Rgb, RgbImage};
use tokio::task;
use tracing::{debug, info};

use crate::error::{MediaError, Result};
use crate::media::types::{OutputProfile, VideoAsset};

/// Caption size in points, rendered centered on the fallback background
const CAPTION_FONT_SIZE: u32 = 96;

/// Placeholder clip generator
///
/// Synthesizes a solid-color clip with a centered caption at the fixed
/// output frame size and frame rate. Used when reconciliation reports empty
/// input, and per-keyword when a footage search yields nothing for that
/// keyword. Output is deterministic for a given label and duration: the same
/// background frame and the same encoder invocation every time.
pub struct FallbackGenerator {
    ffmpeg: PathBuf,
    profile: OutputProfile,
}

impl FallbackGenerator {
    pub fn new(profile: OutputProfile) -> Result<Self> {
        let ffmpeg = which::which("ffmpeg").map_err(|_| MediaError::ToolMissing {
            tool: "ffmpeg".to_string(),
        })?;

        Ok(Self { ffmpeg, profile })
    }

    /// Generate a placeholder clip of exactly `duration_secs` seconds.
    ///
    /// The background frame is rendered in-process and looped by the
    /// encoder; the caption is drawn by the encoder's text filter. The
    /// caption label is sanitized to filesystem- and filter-safe characters
    /// before use.
    pub async fn generate(
        &self,
        duration_secs: f64,
        label: &str,
        color: [u8; 3],
        out_path: &Path,
    ) -> Result<VideoAsset> {
        let caption = sanitize_label(label);
        info!(
            "Generating fallback clip: {:.2}s, caption '{}' -> {:?}",
            duration_secs, caption, out_path
        );

        let background_path = out_path.with_extension("bg.png");
        self.write_background(&background_path, color)?;

        let args = self.build_args(duration_secs, &caption, &background_path, out_path);
        debug!("ffmpeg {}", args.join(" "));

        let ffmpeg = self.ffmpeg.clone();
        let output = task::spawn_blocking(move || {
            let mut cmd = Command::new(ffmpeg);
            cmd.args(&args);
            cmd.output()
        })
        .await
        .map_err(|e| MediaError::FallbackFailed {
            reason: format!("failed to spawn encoder task: {e}"),
        })?
        .map_err(|e| MediaError::FallbackFailed {
            reason: format!("encoder execution failed: {e}"),
        })?;

        // The background frame is scratch either way
        let _ = std::fs::remove_file(&background_path);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let _ = std::fs::remove_file(out_path);
            return Err(MediaError::FallbackFailed {
                reason: format!("encoder failed: {}", stderr.trim()),
            }
            .into());
        }

        if !out_path.is_file() {
            return Err(MediaError::FallbackFailed {
                reason: format!("no clip written at {}", out_path.display()),
            }
            .into());
        }

        // Constructed at the target duration and profile by definition, so
        // the handle is built directly instead of re-probing.
        Ok(VideoAsset {
            path: out_path.to_path_buf(),
            duration_secs,
            width: self.profile.width(),
            height: self.profile.height(),
            fps: self.profile.fps,
        })
    }

    fn write_background(&self, path: &Path, color: [u8; 3]) -> Result<()> {
        let background: RgbImage = ImageBuffer::from_pixel(
            self.profile.width(),
            self.profile.height(),
            Rgb(color),
        );

        background.save(path).map_err(|e| MediaError::FallbackFailed {
            reason: format!("failed to write background frame: {e}"),
        })?;
        Ok(())
    }

    fn build_args(
        &self,
        duration_secs: f64,
        caption: &str,
        background_path: &Path,
        out_path: &Path,
    ) -> Vec<String> {
        let drawtext = format!(
            "drawtext=text='{}':font=Sans:fontsize={}:fontcolor=white:x=(w-text_w)/2:y=(h-text_h)/2",
            caption, CAPTION_FONT_SIZE
        );

        vec![
            "-loop".to_string(),
            "1".to_string(),
            "-framerate".to_string(),
            self.profile.fps.to_string(),
            "-t".to_string(),
            format!("{duration_secs:.6}"),
            "-i".to_string(),
            background_path.display().to_string(),
            "-vf".to_string(),
            drawtext,
            "-c:v".to_string(),
            self.profile.video_codec.clone(),
            "-crf".to_string(),
            self.profile.crf().to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-y".to_string(),
            out_path.display().to_string(),
        ]
    }
}

/// Reduce a label to filesystem- and filter-safe characters
///
/// Keeps alphanumerics, spaces, dashes and underscores; everything else is
/// dropped. Trailing whitespace is stripped.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("home repair"), "home repair");
        assert_eq!(sanitize_label("it's: a test!  "), "its a test");
        assert_eq!(sanitize_label("semi;colon,comma"), "semicoloncomma");
        assert_eq!(sanitize_label("under_score-dash"), "under_score-dash");
    }

    #[test]
    fn test_build_args_is_deterministic() {
        let Ok(generator) = FallbackGenerator::new(OutputProfile::default()) else {
            return;
        };

        let bg = Path::new("/tmp/bg.png");
        let out = Path::new("/tmp/out.mp4");
        let first = generator.build_args(6.0, "AI Generated Video", bg, out);
        let second = generator.build_args(6.0, "AI Generated Video", bg, out);
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_args_carries_duration_and_caption() {
        let Ok(generator) = FallbackGenerator::new(OutputProfile::default()) else {
            return;
        };

        let args = generator.build_args(
            6.0,
            "OCEAN",
            Path::new("bg.png"),
            Path::new("out.mp4"),
        );

        assert!(args.contains(&"6.000000".to_string()));
        assert!(args.iter().any(|a| a.contains("text='OCEAN'")));
        assert!(args.contains(&"libx264".to_string()));
    }
}
