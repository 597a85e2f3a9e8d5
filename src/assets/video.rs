use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use crate::foundation::error::{EaselError, EaselResult};

/// Playback state of a video element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PlaybackState {
    Playing,
    Paused,
}

/// Stand-in for a native video element: a source plus a pausable playback clock.
///
/// The clock accumulates wall time while playing; `stop` pauses and rewinds to zero.
/// Frame pixels are decoded on demand by the renderer (see [`probe_video`] and
/// [`decode_frame_rgba8`], available with the `media-ffmpeg` feature).
#[derive(Debug)]
pub struct VideoElement {
    source: PathBuf,
    width: u32,
    height: u32,
    base_position_sec: f64,
    playing_since: Option<Instant>,
}

impl VideoElement {
    pub fn new(source: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            source: source.into(),
            width,
            height,
            base_position_sec: 0.0,
            playing_since: None,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn state(&self) -> PlaybackState {
        if self.playing_since.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }

    pub fn is_paused(&self) -> bool {
        self.playing_since.is_none()
    }

    pub fn play(&mut self) {
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        if let Some(since) = self.playing_since.take() {
            self.base_position_sec += since.elapsed().as_secs_f64();
        }
    }

    /// Invert the playback state.
    pub fn toggle(&mut self) {
        if self.is_paused() {
            self.play();
        } else {
            self.pause();
        }
    }

    /// Pause and rewind to the start. Idempotent.
    pub fn stop(&mut self) {
        self.playing_since = None;
        self.base_position_sec = 0.0;
    }

    /// Current playback position in seconds.
    pub fn current_time(&self) -> f64 {
        let running = self
            .playing_since
            .map(|since| since.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.base_position_sec + running
    }

    pub fn seek(&mut self, position_sec: f64) -> EaselResult<()> {
        if !position_sec.is_finite() || position_sec < 0.0 {
            return Err(EaselError::validation(
                "seek position must be finite and >= 0",
            ));
        }
        self.base_position_sec = position_sec;
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
        Ok(())
    }
}

/// Probed metadata for a video source.
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub duration_sec: f64,
}

#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> EaselResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| EaselError::asset(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(EaselError::asset(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| EaselError::asset(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| EaselError::asset("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| EaselError::asset("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| EaselError::asset("missing video height from ffprobe"))?;

    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| EaselError::asset("invalid video r_frame_rate"))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_source_path: &Path) -> EaselResult<VideoSourceInfo> {
    Err(EaselError::asset(
        "video frame decode requires the 'media-ffmpeg' feature",
    ))
}

/// Decode the straight-alpha RGBA8 frame at `source_time_sec`.
#[cfg(feature = "media-ffmpeg")]
pub fn decode_frame_rgba8(source: &VideoSourceInfo, source_time_sec: f64) -> EaselResult<Vec<u8>> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{source_time_sec:.9}")])
        .arg("-i")
        .arg(&source.source_path)
        .args([
            "-frames:v",
            "1",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| EaselError::asset(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(EaselError::asset(format!(
            "ffmpeg video decode failed for '{}': {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = source.width as usize * source.height as usize * 4;
    if expected_len == 0 {
        return Err(EaselError::asset(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if out.stdout.len() < expected_len {
        return Err(EaselError::asset(format!(
            "decoded video frame has invalid size: got {} bytes, expected {expected_len}",
            out.stdout.len()
        )));
    }

    Ok(out.stdout[..expected_len].to_vec())
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn decode_frame_rgba8(
    _source: &VideoSourceInfo,
    _source_time_sec: f64,
) -> EaselResult<Vec<u8>> {
    Err(EaselError::asset(
        "video frame decode requires the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}
