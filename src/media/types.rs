use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Immutable handle to a probed audio resource
///
/// The audio track's duration is the sole driver of the assembly target
/// duration: the finished video is exactly as long as this track.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    /// Path to the audio file
    pub path: PathBuf,

    /// Duration in seconds (always > 0 for a successfully opened track)
    pub duration_secs: f64,

    /// Sample rate reported by the decoder
    pub sample_rate: u32,
}

/// Handle to a probed video resource
#[derive(Debug, Clone, PartialEq)]
pub struct VideoAsset {
    /// Path to the video file
    pub path: PathBuf,

    /// Duration in seconds
    pub duration_secs: f64,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Source frame rate
    pub fps: f64,
}

impl VideoAsset {
    /// Whether this asset may participate in timeline reconciliation.
    ///
    /// Only assets that opened successfully and report a positive duration
    /// and non-zero frame dimensions are eligible; everything else is
    /// discarded with a logged reason, never fatal to the batch.
    pub fn is_eligible(&self) -> bool {
        self.duration_secs > 0.0 && self.width > 0 && self.height > 0
    }

    /// Human-readable reason an ineligible asset was discarded
    pub fn ineligibility_reason(&self) -> Option<&'static str> {
        if self.duration_secs <= 0.0 {
            Some("non-positive duration")
        } else if self.width == 0 || self.height == 0 {
            Some("zero frame dimensions")
        } else {
            None
        }
    }
}

/// Fixed encode target for the assembled output
///
/// One resolution, one frame rate, one video codec and one audio codec
/// profile per build; there is no per-call format negotiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputProfile {
    /// Target frame rate for output
    pub fps: f64,

    /// Target resolution (width, height)
    pub resolution: (u32, u32),

    /// Video codec to use for output
    pub video_codec: String,

    /// Audio codec to use for output
    pub audio_codec: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,
}

impl Default for OutputProfile {
    fn default() -> Self {
        Self {
            fps: 24.0,
            resolution: (1920, 1080),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            quality: 85,
        }
    }
}

impl OutputProfile {
    pub fn width(&self) -> u32 {
        self.resolution.0
    }

    pub fn height(&self) -> u32 {
        self.resolution.1
    }

    /// Map the 0-100 quality setting onto the x264 CRF scale
    pub fn crf(&self) -> u8 {
        (51 - ((self.quality as f32 / 100.0) * 51.0) as u8).clamp(0, 51)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(duration_secs: f64, width: u32, height: u32) -> VideoAsset {
        VideoAsset {
            path: PathBuf::from("clip.mp4"),
            duration_secs,
            width,
            height,
            fps: 30.0,
        }
    }

    #[test]
    fn test_eligibility() {
        assert!(asset(5.0, 1280, 720).is_eligible());
        assert!(!asset(0.0, 1280, 720).is_eligible());
        assert!(!asset(-1.0, 1280, 720).is_eligible());
        assert!(!asset(5.0, 0, 720).is_eligible());
        assert!(!asset(5.0, 1280, 0).is_eligible());
    }

    #[test]
    fn test_ineligibility_reason() {
        assert_eq!(asset(5.0, 1280, 720).ineligibility_reason(), None);
        assert_eq!(
            asset(0.0, 1280, 720).ineligibility_reason(),
            Some("non-positive duration")
        );
        assert_eq!(
            asset(5.0, 1280, 0).ineligibility_reason(),
            Some("zero frame dimensions")
        );
    }

    #[test]
    fn test_default_profile_crf() {
        let profile = OutputProfile::default();
        assert!(profile.crf() <= 51);
        assert_eq!(profile.width(), 1920);
        assert_eq!(profile.height(), 1080);
    }
}
