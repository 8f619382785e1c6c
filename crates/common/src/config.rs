//! Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BeatcutError, BeatcutResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where finished renders are written.
    pub output_dir: PathBuf,

    /// Parent directory for per-job scratch directories.
    pub scratch_root: PathBuf,

    /// Composition engine settings.
    pub engine: EngineConfig,

    /// Worker pool settings.
    pub workers: WorkerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Parameters of the single composition engine.
///
/// Every job renders through one engine configured here; per-job
/// requests only carry sources, beat times and layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Canonical canvas width in pixels.
    pub canvas_width: u32,

    /// Canonical canvas height in pixels.
    pub canvas_height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// How long each beat clip stays on screen (seconds).
    pub beat_frame_duration_secs: f64,

    /// Seconds taken before the beat time when cutting a beat clip.
    pub beat_lead_in_secs: f64,

    /// Fade duration for beat clips; also the blend overlap between
    /// timeline entries when a transition is configured.
    pub fade_duration_secs: f64,

    /// Optional solid-colour filler between timeline slots.
    pub transition: Option<TransitionConfig>,

    /// Peak zoom amplitude (0.05 = up to 105%).
    pub zoom_amplitude: f64,

    /// Zoom oscillation period in seconds. `None` uses the clip duration.
    pub zoom_period_secs: Option<f64>,

    /// Video encoder settings.
    pub video: VideoCodecConfig,

    /// Audio encoder settings used by the muxer.
    pub audio: AudioCodecConfig,

    /// Hard limit for the external mux step (seconds).
    pub mux_timeout_secs: u64,

    /// External binaries.
    pub tools: ToolPaths,
}

/// Solid-colour filler inserted between timeline slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// Filler duration in seconds.
    pub duration_secs: f64,

    /// Filler colour (ffmpeg colour syntax, e.g. `black` or `0x101010`).
    pub color: String,
}

/// Video encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoCodecConfig {
    /// Encoder name.
    pub codec: String,

    /// Encoder preset.
    pub preset: String,

    /// Constant rate factor.
    pub crf: u32,

    /// Output pixel format.
    pub pix_fmt: String,
}

/// Audio encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioCodecConfig {
    /// Encoder name used when muxing.
    pub codec: String,

    /// Bitrate in kbps.
    pub bitrate_kbps: u32,

    /// Sample rate of the prepared background track.
    pub sample_rate: u32,
}

/// Locations of the external media binaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of render threads, fixed at process start.
    pub threads: usize,

    /// Maximum queued jobs before `submit` blocks.
    pub queue_capacity: usize,

    /// Extract independent segments of one job in parallel.
    pub parallel_extraction: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "beatcut=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            scratch_root: std::env::temp_dir(),
            engine: EngineConfig::default(),
            workers: WorkerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1920,
            canvas_height: 1080,
            fps: 30,
            beat_frame_duration_secs: 1.0,
            beat_lead_in_secs: 0.1,
            fade_duration_secs: 0.5,
            transition: None,
            zoom_amplitude: 0.05,
            zoom_period_secs: None,
            video: VideoCodecConfig::default(),
            audio: AudioCodecConfig::default(),
            mux_timeout_secs: 300,
            tools: ToolPaths::default(),
        }
    }
}

impl Default for VideoCodecConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 18,
            pix_fmt: "yuv420p".to_string(),
        }
    }
}

impl Default for AudioCodecConfig {
    fn default() -> Self {
        Self {
            codec: "aac".to_string(),
            bitrate_kbps: 192,
            sample_rate: 48000,
        }
    }
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            queue_capacity: 64,
            parallel_extraction: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl EngineConfig {
    /// Duration of one output frame in seconds.
    pub fn frame_interval_secs(&self) -> f64 {
        1.0 / self.fps.max(1) as f64
    }

    /// Validate the engine parameters.
    pub fn validate(&self) -> BeatcutResult<()> {
        if self.canvas_width < 2 || self.canvas_height < 2 {
            return Err(BeatcutError::config(format!(
                "canvas must be at least 2x2, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        if self.fps == 0 {
            return Err(BeatcutError::config("fps must be positive"));
        }
        if !(self.beat_frame_duration_secs > 0.0) {
            return Err(BeatcutError::config(
                "beat_frame_duration_secs must be positive",
            ));
        }
        if self.beat_lead_in_secs < 0.0 {
            return Err(BeatcutError::config("beat_lead_in_secs must not be negative"));
        }
        if self.fade_duration_secs < 0.0 {
            return Err(BeatcutError::config("fade_duration_secs must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.zoom_amplitude) {
            return Err(BeatcutError::config(format!(
                "zoom_amplitude must be within [0, 1], got {}",
                self.zoom_amplitude
            )));
        }
        if let Some(period) = self.zoom_period_secs {
            if !(period > 0.0) {
                return Err(BeatcutError::config("zoom_period_secs must be positive"));
            }
        }
        if let Some(transition) = &self.transition {
            if !(transition.duration_secs > 0.0) {
                return Err(BeatcutError::config(
                    "transition duration_secs must be positive",
                ));
            }
            if transition.color.trim().is_empty() {
                return Err(BeatcutError::config("transition color must not be empty"));
            }
        }
        if self.mux_timeout_secs == 0 {
            return Err(BeatcutError::config("mux_timeout_secs must be positive"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Errors are returned, not defaulted.
    pub fn load_from(path: &Path) -> BeatcutResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Validate the whole configuration before any job is accepted.
    pub fn validate(&self) -> BeatcutResult<()> {
        self.engine.validate()?;
        if self.workers.threads == 0 {
            return Err(BeatcutError::config("workers.threads must be positive"));
        }
        if self.workers.queue_capacity == 0 {
            return Err(BeatcutError::config(
                "workers.queue_capacity must be positive",
            ));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("beatcut").join("config.json")
}
