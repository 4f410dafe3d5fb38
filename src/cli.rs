//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::music::{theory::parse_pitch_class, Mode, PlaybackMode};
use crate::params::RecordingConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "vibescope")]
#[command(about = "Audio-reactive shader gallery with a generative music engine", long_about = None)]
pub struct Args {
    /// Settings file (TOML); flags below override it
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Record frames and audio for the given duration, then exit
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Shader to show first (gallery name)
    #[arg(long, value_name = "NAME")]
    pub shader: Option<String>,

    /// Directory of extra .frag/.glsl shaders
    #[arg(long, value_name = "DIR")]
    pub shader_dir: Option<PathBuf>,

    /// Tempo in BPM
    #[arg(long)]
    pub bpm: Option<f32>,

    /// Mode name (ionian..locrian, major, minor)
    #[arg(long)]
    pub mode: Option<String>,

    /// Key of the tonic (e.g. "c", "f#", "eb")
    #[arg(long, value_name = "PITCH")]
    pub key: Option<String>,

    /// Playback mode: sustained, arpeggio, bass
    #[arg(long)]
    pub playback: Option<String>,

    /// Enable microphone beatbox/pitch input
    #[arg(long)]
    pub mic: bool,

    /// OSC listen port for landmarks and speech
    #[arg(long, value_name = "PORT")]
    pub osc_port: Option<u16>,

    /// Disable the OSC listener
    #[arg(long)]
    pub no_osc: bool,

    /// Disable reading commands from stdin
    #[arg(long)]
    pub no_console: bool,

    /// Log level (RUST_LOG overrides)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Load the settings file (if any) and apply flag overrides
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(name) = &self.shader {
            settings.render.initial_shader = Some(name.clone());
        }
        if let Some(dir) = &self.shader_dir {
            settings.render.shader_dir = Some(dir.clone());
        }
        if let Some(bpm) = self.bpm {
            settings.music.bpm = bpm;
        }
        if let Some(name) = &self.mode {
            settings.music.mode = Mode::parse(name)
                .ok_or_else(|| Error::InvalidParameter(format!("Unknown mode '{}'", name)))?;
        }
        if let Some(key) = &self.key {
            let pitch_class = parse_pitch_class(key)
                .ok_or_else(|| Error::InvalidParameter(format!("Unknown key '{}'", key)))?;
            settings.music.root_midi = settings.music.root_for_pitch_class(pitch_class);
        }
        if let Some(name) = &self.playback {
            settings.music.playback = match name.to_lowercase().as_str() {
                "sustained" | "sustain" => PlaybackMode::Sustained,
                "arpeggio" | "arp" => PlaybackMode::Arpeggio,
                "bass" => PlaybackMode::Bass,
                other => {
                    return Err(Error::InvalidParameter(format!(
                        "Unknown playback mode '{}'",
                        other
                    )))
                }
            };
        }
        if self.mic {
            settings.mic.enabled = true;
        }
        if let Some(port) = self.osc_port {
            settings.input.osc_port = port;
        }
        if self.no_osc {
            settings.input.osc_enabled = false;
        }
        if self.no_console {
            settings.input.console = false;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> Result<Option<RecordingConfig>> {
        let Some(duration) = self.record else {
            return Ok(None);
        };
        if duration <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "Recording duration must be positive, got {}",
                duration
            )));
        }
        let config = RecordingConfig::new(duration);

        // Create output directories
        std::fs::create_dir_all(config.frames_dir())?;
        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "vibescope", "--bpm", "128", "--mode", "dorian", "--key", "eb", "--playback", "bass",
            "--no-osc",
        ]);
        let settings = args.settings().unwrap();
        assert_eq!(settings.music.bpm, 128.0);
        assert_eq!(settings.music.mode, Mode::Dorian);
        // Default tonic is C3 (48)
        assert_eq!(settings.music.root_midi, 51);
        assert_eq!(settings.music.playback, PlaybackMode::Bass);
        assert!(!settings.input.osc_enabled);
    }

    #[test]
    fn test_key_at_top_of_range_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("high.toml");
        std::fs::write(&path, "[music]\nroot_midi = 96\n").unwrap();
        let args = Args::parse_from([
            "vibescope",
            "--config",
            path.to_str().unwrap(),
            "--key",
            "b",
        ]);
        assert_eq!(args.settings().unwrap().music.root_midi, 95);
    }

    #[test]
    fn test_bad_flags_rejected() {
        assert!(Args::parse_from(["vibescope", "--mode", "blues"]).settings().is_err());
        assert!(Args::parse_from(["vibescope", "--bpm", "900"]).settings().is_err());
        assert!(Args::parse_from(["vibescope", "--playback", "drone"]).settings().is_err());
        assert!(Args::parse_from(["vibescope", "--record", "0"])
            .create_recording_config()
            .is_err());
    }

    #[test]
    fn test_no_recording_by_default() {
        let args = Args::parse_from(["vibescope"]);
        assert!(args.create_recording_config().unwrap().is_none());
    }
}
