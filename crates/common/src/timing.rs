//! Frame timing utilities.
//!
//! Every duration in beatcut is a float number of seconds. Encoders snap
//! those to whole frames, so equality checks between planned and rendered
//! durations are made in frame intervals rather than exact seconds.

use std::time::Instant;

/// Converts between seconds and frames at a fixed rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    fps: u32,
}

impl FrameClock {
    /// Create a clock for the given frame rate (0 is treated as 1).
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Length of one frame in seconds.
    pub fn interval_secs(&self) -> f64 {
        1.0 / self.fps as f64
    }

    /// Number of whole frames an encoder emits for `secs` (rounded).
    pub fn frames_for(&self, secs: f64) -> u64 {
        (secs.max(0.0) * self.fps as f64).round() as u64
    }

    /// Seconds covered by `frames` frames.
    pub fn secs_for(&self, frames: u64) -> f64 {
        frames as f64 / self.fps as f64
    }

    /// Snap a duration to the nearest whole frame.
    pub fn snap(&self, secs: f64) -> f64 {
        self.secs_for(self.frames_for(secs))
    }

    /// Whether two durations agree within one frame interval.
    pub fn within_one_frame(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.interval_secs() + 1e-9
    }
}

/// Format seconds as a `mm:ss` clock (minutes are not wrapped at 60).
pub fn format_clock(secs: f64) -> String {
    let whole = secs.max(0.0).floor() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Wall-clock anchored stopwatch for job timing.
#[derive(Debug, Clone)]
pub struct Stopwatch {
    started: Instant,
    started_wall: String,
}

impl Stopwatch {
    /// Start a stopwatch anchored to now.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            started_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Seconds since start.
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Milliseconds since start.
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Wall-clock time at start (RFC 3339).
    pub fn started_wall(&self) -> &str {
        &self.started_wall
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_conversion() {
        let clock = FrameClock::new(30);
        assert_eq!(clock.frames_for(1.0), 30);
        assert_eq!(clock.frames_for(0.5), 15);
        assert!((clock.secs_for(45) - 1.5).abs() < 1e-12);
        assert_eq!(clock.frames_for(-2.0), 0);
    }

    #[test]
    fn test_zero_fps_is_clamped() {
        let clock = FrameClock::new(0);
        assert_eq!(clock.fps(), 1);
        assert!((clock.interval_secs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_within_one_frame() {
        let clock = FrameClock::new(25);
        assert!(clock.within_one_frame(9.0, 9.04));
        assert!(clock.within_one_frame(9.0, 8.97));
        assert!(!clock.within_one_frame(9.0, 9.1));
    }

    #[test]
    fn test_snap() {
        let clock = FrameClock::new(30);
        assert!((clock.snap(1.01) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(5.9), "00:05");
        assert_eq!(format_clock(61.0), "01:01");
        assert_eq!(format_clock(3600.0), "60:00");
        assert_eq!(format_clock(-1.0), "00:00");
    }

    #[test]
    fn test_stopwatch() {
        let watch = Stopwatch::start();
        assert!(watch.elapsed_secs() < 1.0);
        assert!(!watch.started_wall().is_empty());
    }
}
