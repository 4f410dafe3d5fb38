//! Microphone capture for beatbox and pitch input.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use ringbuf::{
    traits::{Consumer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use tracing::{error, info};

use crate::error::{Error, Result};

const MIC_RING_SIZE: usize = 16384;

/// Microphone input stream delivering mono samples to the render loop
pub struct MicInput {
    consumer: HeapCons<f32>,
    sample_rate: u32,
    _stream: cpal::Stream,
}

impl MicInput {
    /// Open the default input device
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("No microphone found".to_string()))?;
        let supported = device
            .default_input_config()
            .map_err(|e| Error::Audio(format!("Microphone config unavailable: {}", e)))?;

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let format = supported.sample_format();
        info!(
            "Microphone: {} @ {}Hz ({:?})",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            format
        );

        let ring = HeapRb::<f32>::new(MIC_RING_SIZE);
        let (producer, consumer) = ring.split();
        let config: cpal::StreamConfig = supported.into();
        let on_error = |err: cpal::StreamError| error!("Microphone stream error: {}", err);

        let stream = match format {
            SampleFormat::F32 => {
                let mut producer = producer;
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        push_mono(&mut producer, data, channels, |s| s)
                    },
                    on_error,
                    None,
                )
            }
            SampleFormat::I16 => {
                let mut producer = producer;
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        push_mono(&mut producer, data, channels, |s| s as f32 / i16::MAX as f32)
                    },
                    on_error,
                    None,
                )
            }
            other => {
                return Err(Error::Audio(format!(
                    "Unsupported microphone sample format: {:?}",
                    other
                )))
            }
        }
        .map_err(|e| Error::Audio(format!("Failed to open microphone: {}", e)))?;

        stream
            .play()
            .map_err(|e| Error::Audio(format!("Failed to start microphone: {}", e)))?;

        Ok(Self {
            consumer,
            sample_rate,
            _stream: stream,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Move all captured samples into `out`
    pub fn drain_into(&mut self, out: &mut Vec<f32>) {
        let mut chunk = [0.0f32; 1024];
        loop {
            let n = self.consumer.pop_slice(&mut chunk);
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
    }
}

/// Downmix interleaved frames to mono and queue them
fn push_mono<T: Copy>(
    producer: &mut HeapProd<f32>,
    data: &[T],
    channels: usize,
    to_f32: impl Fn(T) -> f32,
) {
    for frame in data.chunks(channels.max(1)) {
        let sum: f32 = frame.iter().map(|&s| to_f32(s)).sum();
        let _ = producer.try_push(sum / frame.len() as f32);
    }
}
