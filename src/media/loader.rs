use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

use crate::error::{MediaError, Result};
use crate::media::types::{AudioTrack, VideoAsset};

/// Media asset loader
///
/// Opens video and audio resources and extracts duration, frame-size and
/// rate metadata into normalized handles. Video files are probed with an
/// `ffprobe` subprocess; audio durations are read natively (WAV via hound,
/// compressed formats via symphonia). Per-asset failures are reported to the
/// caller and never abort a batch.
#[derive(Debug, Clone)]
pub struct MediaLoader {
    ffprobe: PathBuf,
}

impl MediaLoader {
    pub fn new() -> Result<Self> {
        let ffprobe = which::which("ffprobe").map_err(|_| MediaError::ToolMissing {
            tool: "ffprobe".to_string(),
        })?;

        debug!("Using ffprobe at {:?}", ffprobe);
        Ok(Self { ffprobe })
    }

    /// Probe a single video file
    pub fn open_video<P: AsRef<Path>>(&self, path: P) -> Result<VideoAsset> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(MediaError::OpenFailed {
                path: path.display().to_string(),
                reason: "file not found".to_string(),
            }
            .into());
        }

        let probe = self.run_ffprobe(path)?;
        let stream = probe
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| MediaError::OpenFailed {
                path: path.display().to_string(),
                reason: "no video stream".to_string(),
            })?;

        // Stream-level duration is missing from some containers; fall back
        // to the format-level value.
        let duration_secs = stream
            .duration
            .as_deref()
            .or(probe.format.as_ref().and_then(|f| f.duration.as_deref()))
            .and_then(|d| d.parse::<f64>().ok())
            .ok_or_else(|| MediaError::OpenFailed {
                path: path.display().to_string(),
                reason: "duration probing failed".to_string(),
            })?;

        let asset = VideoAsset {
            path: path.to_path_buf(),
            duration_secs,
            width: stream.width.unwrap_or(0),
            height: stream.height.unwrap_or(0),
            fps: stream
                .r_frame_rate
                .as_deref()
                .map(parse_frame_rate)
                .unwrap_or(0.0),
        };

        debug!(
            "Probed video {:?}: {:.2}s, {}x{} @ {:.2} fps",
            path, asset.duration_secs, asset.width, asset.height, asset.fps
        );
        Ok(asset)
    }

    /// Probe a single audio file
    pub fn open_audio<P: AsRef<Path>>(&self, path: P) -> Result<AudioTrack> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(MediaError::OpenFailed {
                path: path.display().to_string(),
                reason: "file not found".to_string(),
            }
            .into());
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        let track = match extension.as_str() {
            "wav" => Self::probe_wav(path)?,
            "mp3" | "flac" | "ogg" | "m4a" | "aac" => Self::probe_with_symphonia(path)?,
            _ => {
                return Err(MediaError::UnsupportedFormat { format: extension }.into());
            }
        };

        if track.duration_secs <= 0.0 {
            return Err(MediaError::OpenFailed {
                path: path.display().to_string(),
                reason: "non-positive audio duration".to_string(),
            }
            .into());
        }

        info!(
            "Opened audio track {:?}: {:.2}s @ {} Hz",
            path, track.duration_secs, track.sample_rate
        );
        Ok(track)
    }

    /// Probe a batch of video paths concurrently, keeping only eligible
    /// assets in the original input order.
    ///
    /// Any individual failure is logged and skipped; ordering of the
    /// surviving assets is load-bearing for reconciliation.
    pub async fn load_eligible(&self, paths: &[PathBuf]) -> Vec<VideoAsset> {
        let mut handles = Vec::with_capacity(paths.len());

        for path in paths {
            let loader = self.clone();
            let path = path.clone();
            handles.push(tokio::task::spawn_blocking(move || loader.open_video(&path)));
        }

        let mut assets = Vec::new();
        for (handle, path) in handles.into_iter().zip(paths) {
            match handle.await {
                Ok(Ok(asset)) => {
                    if asset.is_eligible() {
                        info!("Loaded video: {:?} ({:.2}s)", path, asset.duration_secs);
                        assets.push(asset);
                    } else {
                        // An asset without positive duration and dimensions
                        // cannot be normalized to the output frame size
                        let mismatch = MediaError::FormatMismatch {
                            path: path.display().to_string(),
                            reason: asset
                                .ineligibility_reason()
                                .unwrap_or("unknown")
                                .to_string(),
                        };
                        warn!("Skipping video: {}", mismatch);
                    }
                }
                Ok(Err(e)) => {
                    warn!("Skipping video {:?}: {}", path, e);
                }
                Err(e) => {
                    warn!("Skipping video {:?}: probe task failed: {}", path, e);
                }
            }
        }

        assets
    }

    fn run_ffprobe(&self, path: &Path) -> Result<ProbeOutput> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .output()
            .map_err(|e| MediaError::OpenFailed {
                path: path.display().to_string(),
                reason: format!("ffprobe execution failed: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::OpenFailed {
                path: path.display().to_string(),
                reason: format!("ffprobe failed: {}", stderr.trim()),
            }
            .into());
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| {
                MediaError::OpenFailed {
                    path: path.display().to_string(),
                    reason: format!("unparseable ffprobe output: {e}"),
                }
                .into()
            })
    }

    /// WAV durations come straight from the header via hound
    fn probe_wav(path: &Path) -> Result<AudioTrack> {
        let reader = hound::WavReader::open(path).map_err(|e| MediaError::OpenFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let spec = reader.spec();
        let duration_secs = reader.duration() as f64 / spec.sample_rate as f64;

        Ok(AudioTrack {
            path: path.to_path_buf(),
            duration_secs,
            sample_rate: spec.sample_rate,
        })
    }

    /// Compressed formats go through symphonia. When the container reports a
    /// frame count the duration is immediate; otherwise the packets are
    /// walked to find the final timestamp.
    fn probe_with_symphonia(path: &Path) -> Result<AudioTrack> {
        let open_failed = |reason: String| MediaError::OpenFailed {
            path: path.display().to_string(),
            reason,
        };

        let file = File::open(path).map_err(|e| open_failed(e.to_string()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| open_failed(e.to_string()))?;

        let mut format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| open_failed("no decodable audio track".to_string()))?;

        let track_id = track.id;
        let params = track.codec_params.clone();
        let sample_rate = params
            .sample_rate
            .ok_or_else(|| open_failed("unknown sample rate".to_string()))?;

        let duration_secs = match params.n_frames {
            Some(n_frames) => n_frames as f64 / sample_rate as f64,
            None => {
                // Frame count unknown (common for VBR streams): walk the
                // packets and take the final timestamp.
                let mut last_ts = 0u64;
                loop {
                    match format.next_packet() {
                        Ok(packet) => {
                            if packet.track_id() == track_id {
                                last_ts = packet.ts() + packet.dur();
                            }
                        }
                        Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::ResetRequired) => {
                            break;
                        }
                        Err(e) => return Err(open_failed(e.to_string()).into()),
                    }
                }

                let time_base = params
                    .time_base
                    .ok_or_else(|| open_failed("unknown time base".to_string()))?;
                let time = time_base.calc_time(last_ts);
                time.seconds as f64 + time.frac
            }
        };

        Ok(AudioTrack {
            path: path.to_path_buf(),
            duration_secs,
            sample_rate,
        })
    }
}

/// `ffprobe -print_format json` output shapes (only the fields we read)
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parse an ffprobe rational frame rate like "30000/1001"
fn parse_frame_rate(raw: &str) -> f64 {
    match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().unwrap_or(0.0);
            let den: f64 = den.parse().unwrap_or(1.0);
            if den == 0.0 {
                0.0
            } else {
                num / den
            }
        }
        None => raw.parse().unwrap_or(0.0),
    }
}
