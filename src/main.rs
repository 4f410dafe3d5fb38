//! vibescope - a gallery of audio-reactive shaders over a generative score.
//!
//! The music follows your hands, face, voice, and beatboxing; the visuals
//! follow the music.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use winit::event_loop::EventLoop;

use vibescope::{app::App, cli::Args, logging};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    info!("vibescope - audio-reactive shader gallery");

    let settings = args.settings().context("Invalid settings")?;
    let recording = args
        .create_recording_config()
        .context("Failed to prepare recording output")?;
    if let Some(config) = &recording {
        info!(
            "Recording {:.1}s ({} frames @ {} fps) to {}",
            config.duration_secs,
            config.total_frames(),
            config.fps,
            config.output_dir.display()
        );
    }

    let mut app = App::new(settings, recording);
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.run_app(&mut app).context("Event loop failed")?;

    if let Some(err) = app.take_error() {
        return Err(err).context("Startup failed");
    }
    Ok(())
}
