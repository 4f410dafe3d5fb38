//! Audio system managing synthesis output and per-frame analysis.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use glicol::Engine;
use parking_lot::Mutex;
use ringbuf::{
    traits::{Consumer, Producer, Split},
    HeapCons, HeapRb,
};
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::analysis::{AudioBands, BandAnalyzer, Waveform};
use super::effects::OutputStage;
use crate::error::{Error, Result};
use crate::params::{
    audio_constants::{BLOCK_SIZE, LIMITER, WAVEFORM_LEN},
    FFTConfig, RecordingConfig,
};

/// Samples buffered between the audio callback and the render loop
const ANALYSIS_RING_SIZE: usize = 16384;

type WavFile = hound::WavWriter<BufWriter<File>>;

/// State shared with the audio callback
struct SynthState {
    engine: Engine<BLOCK_SIZE>,
    output: OutputStage,
    playing: bool,
    wav: Option<WavFile>,
}

/// Audio system: glicol synthesis to the output device, plus band analysis
pub struct AudioSystem {
    synth: Arc<Mutex<SynthState>>,
    consumer: HeapCons<f32>,
    analyzer: BandAnalyzer,
    waveform: Waveform,
    scratch: Vec<f32>,
    sample_rate: u32,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,
}

impl AudioSystem {
    /// Create and start the audio system with an initial patch
    pub fn new(
        mut fft_config: FFTConfig,
        initial_patch: &str,
        recording_config: Option<&RecordingConfig>,
    ) -> Result<Self> {
        // Setup audio output device
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("No audio output device found".to_string()))?;

        let config = device
            .default_output_config()
            .map_err(|e| Error::Audio(format!("Failed to get audio config: {}", e)))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        info!(
            "Audio: {} @ {}Hz, {} channels",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            channels
        );

        // Analysis follows the device rate
        fft_config.sample_rate_hz = sample_rate as usize;
        fft_config.validate().map_err(Error::InvalidParameter)?;

        // Create WAV writer if recording
        let wav = match recording_config {
            Some(rec) => {
                let spec = hound::WavSpec {
                    channels: 2,
                    sample_rate,
                    bits_per_sample: 32,
                    sample_format: hound::SampleFormat::Float,
                };
                let writer = hound::WavWriter::create(rec.audio_path(), spec)
                    .map_err(|e| Error::Audio(format!("Failed to create WAV writer: {}", e)))?;
                Some(writer)
            }
            None => None,
        };

        // Create Glicol engine
        let mut engine = Engine::<BLOCK_SIZE>::new();
        engine.set_sr(sample_rate as usize);
        engine.update_with_code(initial_patch);
        engine
            .update()
            .map_err(|e| Error::Synthesis(format!("Glicol engine init failed: {:?}", e)))?;

        let synth = Arc::new(Mutex::new(SynthState {
            engine,
            output: OutputStage::default(),
            playing: true,
            wav,
        }));
        let synth_cb = Arc::clone(&synth);

        let ring = HeapRb::<f32>::new(ANALYSIS_RING_SIZE);
        let (mut producer, consumer) = ring.split();

        // Build audio output stream
        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut guard = synth_cb.lock();
                    let state = &mut *guard;

                    if !state.playing {
                        data.fill(0.0);
                        return;
                    }

                    let frames_needed = data.len() / channels;
                    let mut frame_idx = 0;

                    // Generate multiple blocks if needed to fill the entire buffer
                    while frame_idx < frames_needed {
                        let (buffers, _) = state.engine.next_block(vec![]);
                        let samples_to_copy = (frames_needed - frame_idx).min(BLOCK_SIZE);

                        for i in 0..samples_to_copy {
                            let (left, right) =
                                state.output.process(buffers[0][i], buffers[1][i], LIMITER);

                            let out_idx = (frame_idx + i) * channels;
                            for ch in 0..channels {
                                data[out_idx + ch] = if ch % 2 == 0 { left } else { right };
                            }

                            // Analysis is best effort; drop samples when the ring is full
                            let _ = producer.try_push(left);

                            if let Some(writer) = state.wav.as_mut() {
                                let _ = writer.write_sample(left);
                                let _ = writer.write_sample(right);
                            }
                        }

                        frame_idx += samples_to_copy;
                    }
                },
                |err| error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| Error::Audio(format!("Failed to build audio stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| Error::Audio(format!("Failed to start audio stream: {}", e)))?;

        // Keep roughly one frame's worth of time in the drawn waveform
        let decimation = (sample_rate as usize / 60 / WAVEFORM_LEN).max(1);

        Ok(Self {
            synth,
            consumer,
            analyzer: BandAnalyzer::new(fft_config),
            waveform: Waveform::new(decimation),
            scratch: vec![0.0; 4096],
            sample_rate,
            _stream: stream,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Hot-swap the running glicol program
    pub fn update_patch(&self, code: &str) -> Result<()> {
        let mut state = self.synth.lock();
        state.engine.update_with_code(code);
        state
            .engine
            .update()
            .map_err(|e| Error::Synthesis(format!("{:?}", e)))
    }

    /// Adopt bitcrush/gate settings from the effect rack
    pub fn set_output_stage(&self, stage: &OutputStage) {
        self.synth.lock().output.update_from(stage);
    }

    /// Mute or resume output
    pub fn set_playing(&self, playing: bool) {
        self.synth.lock().playing = playing;
    }

    /// Drain samples produced since the last frame and analyze them
    pub fn analyze(&mut self) -> AudioBands {
        loop {
            let n = self.consumer.pop_slice(&mut self.scratch);
            if n == 0 {
                break;
            }
            self.analyzer.push_samples(&self.scratch[..n]);
            self.waveform.push_samples(&self.scratch[..n]);
        }
        self.analyzer.analyze()
    }

    /// Latest waveform samples, oldest first
    pub fn waveform(&self) -> [f32; WAVEFORM_LEN] {
        self.waveform.snapshot()
    }

    /// Finalize the WAV file if recording
    pub fn finish_recording(&self) {
        if let Some(writer) = self.synth.lock().wav.take() {
            match writer.finalize() {
                Ok(()) => info!("Audio recording finalized"),
                Err(e) => warn!("Failed to finalize WAV file: {}", e),
            }
        }
    }
}
