//! Audio capture from microphone

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Captures audio from the default input device
pub struct AudioCapture {
    #[allow(dead_code)]
    device: Device,
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Create a new audio capture instance
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] when no input device exists, or
    /// [`Error::Audio`] when no speech-suitable stream config is available.
    pub fn new() -> Result<Self> {
        Self::with_buffer(Arc::new(Mutex::new(Vec::new())))
    }

    /// Create a capture instance writing into a caller-owned buffer
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::new`].
    pub fn with_buffer(buffer: Arc<Mutex<Vec<f32>>>) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Unsupported("no audio input device".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Permission(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable capture config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "audio capture initialized"
        );

        Ok(Self {
            device,
            config,
            buffer,
            stream: None,
        })
    }

    /// Start capturing audio. Resolves once the stream is live; a no-op if
    /// already capturing (the same stream keeps running).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Permission`] when the device refuses to open a
    /// stream, [`Error::Audio`] on other stream failures.
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Unsupported("no audio input device".to_string()))?;

        let config = self.config.clone();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| match e {
                cpal::BuildStreamError::DeviceNotAvailable => {
                    Error::Permission("input device not available".to_string())
                }
                other => Error::Audio(other.to_string()),
            })?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    /// Stop capturing audio; idempotent
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("audio capture stopped");
        }
    }

    /// Get captured audio buffer and clear it
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Clear the audio buffer
    pub fn clear_buffer(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }

    /// Check if currently capturing
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Commands accepted by the capture worker thread
enum CaptureCmd {
    Start(tokio::sync::oneshot::Sender<Result<()>>),
    Stop(tokio::sync::oneshot::Sender<()>),
}

/// Thread-owning wrapper around [`AudioCapture`]
///
/// `cpal` streams are not `Send`, so the stream lives on a dedicated worker
/// thread and the service communicates over channels. The sample buffer is
/// shared, so reads never round-trip through the worker.
pub struct CaptureService {
    cmd_tx: std::sync::mpsc::Sender<CaptureCmd>,
    buffer: Arc<Mutex<Vec<f32>>>,
}

impl CaptureService {
    /// Probe the input device and spawn the worker thread
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] when no input device exists, or
    /// [`Error::Audio`] when the worker thread cannot be spawned.
    pub fn spawn() -> Result<Self> {
        // Fail fast on platforms with no microphone at all
        if cpal::default_host().default_input_device().is_none() {
            return Err(Error::Unsupported("no audio input device".to_string()));
        }

        let (cmd_tx, cmd_rx) = std::sync::mpsc::channel::<CaptureCmd>();
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let worker_buffer = Arc::clone(&buffer);

        std::thread::Builder::new()
            .name("voxcart-capture".to_string())
            .spawn(move || {
                let mut capture: Option<AudioCapture> = None;
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        CaptureCmd::Start(reply) => {
                            let result = match &mut capture {
                                Some(existing) => existing.start(),
                                None => match AudioCapture::with_buffer(Arc::clone(
                                    &worker_buffer,
                                )) {
                                    Ok(mut fresh) => {
                                        let started = fresh.start();
                                        capture = Some(fresh);
                                        started
                                    }
                                    Err(e) => Err(e),
                                },
                            };
                            let _ = reply.send(result);
                        }
                        CaptureCmd::Stop(reply) => {
                            if let Some(capture) = &mut capture {
                                capture.stop();
                            }
                            let _ = reply.send(());
                        }
                    }
                }
                tracing::debug!("capture worker stopped");
            })
            .map_err(|e| Error::Audio(format!("capture thread spawn failed: {e}")))?;

        Ok(Self { cmd_tx, buffer })
    }

    /// Start capturing; resolves once the stream is live
    ///
    /// # Errors
    ///
    /// Propagates [`AudioCapture::start`] failures, or [`Error::Audio`]
    /// when the worker is gone.
    pub async fn start(&self) -> Result<()> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.cmd_tx
            .send(CaptureCmd::Start(tx))
            .map_err(|_| Error::Audio("capture worker unavailable".to_string()))?;
        rx.await
            .map_err(|_| Error::Audio("capture worker dropped request".to_string()))?
    }

    /// Stop capturing; idempotent
    pub async fn stop(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        if self.cmd_tx.send(CaptureCmd::Stop(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Take the accumulated samples, clearing the buffer
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Clear the buffer without reading it
    pub fn clear_buffer(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }
}

/// RMS energy of audio samples, used by the utterance endpointer
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_of_silence_and_tone() {
        let silence = vec![0.0f32; 100];
        assert!(rms_energy(&silence) < 0.001);

        let loud = vec![0.5f32; 100];
        assert!(rms_energy(&loud) > 0.4);
    }

    #[test]
    fn wav_header_and_roundtrip() {
        let samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
        let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read.len(), samples.len());
    }
}
