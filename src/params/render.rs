//! Rendering and recording configuration.

use serde::Deserialize;
use std::path::PathBuf;

/// Rendering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Present with vsync (Fifo) instead of lowest latency
    pub vsync: bool,

    /// Shader shown at startup (gallery name, case-insensitive)
    pub initial_shader: Option<String>,

    /// Directory of user shaders appended to the gallery
    pub shader_dir: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            vsync: true,
            initial_shader: None,
            shader_dir: None,
        }
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames and audio
    pub output_dir: PathBuf,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: PathBuf::from("recording"),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> PathBuf {
        self.output_dir.join("frames")
    }

    /// Audio file path
    pub fn audio_path(&self) -> PathBuf {
        self.output_dir.join("audio.wav")
    }

    /// Path of a single captured frame
    pub fn frame_path(&self, frame_num: usize) -> PathBuf {
        self.frames_dir().join(format!("frame_{:05}.png", frame_num))
    }

    /// Fixed timestep used while recording, so output is frame-exact
    pub fn frame_time_s(&self, frame_num: usize) -> f32 {
        frame_num as f32 / self.fps as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_frames() {
        let config = RecordingConfig::new(2.5);
        assert_eq!(config.total_frames(), 150);
        assert_eq!(config.frame_time_s(60), 1.0);
        assert!(config
            .frame_path(7)
            .ends_with("recording/frames/frame_00007.png"));
    }
}
