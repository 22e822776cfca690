//! Live audio capture via cpal.
//!
//! The recorder drives the `{Idle → Recording ⇄ Paused → Finished}` state
//! machine. Samples stream from the cpal callback into a shared buffer;
//! pausing flips an atomic flag checked inside the callback instead of
//! tearing the stream down, so resume is instant. `stop()` encodes the
//! buffer as 16-bit WAV and hands back a [`Recording`] with the duration
//! computed from the captured sample count.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use thiserror::Error;

use super::import::sanitize_title;
use crate::model::{Recording, RecordingState};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device available")]
    NoDevice,
    #[error("failed to query input device: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to open audio stream: {0}")]
    StreamBuild(#[from] cpal::BuildStreamError),
    #[error("failed to start audio stream: {0}")]
    StreamPlay(#[from] cpal::PlayStreamError),
    #[error("unsupported sample format: {0:?}")]
    SampleFormat(SampleFormat),
    #[error("no active recording")]
    NotRecording,
    #[error("failed to encode WAV file: {0}")]
    Encode(#[from] hound::Error),
}

pub struct AudioRecorder {
    state: RecordingState,
    stream: Option<Stream>,
    samples: Arc<Mutex<Vec<f32>>>,
    paused: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
    title: String,
}

impl AudioRecorder {
    pub fn new() -> Self {
        Self {
            state: RecordingState::Idle,
            stream: None,
            samples: Arc::new(Mutex::new(Vec::new())),
            paused: Arc::new(AtomicBool::new(false)),
            sample_rate: 0,
            channels: 0,
            title: String::new(),
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Seconds of audio captured so far.
    pub fn elapsed_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        let sample_count = self.samples.lock().unwrap().len();
        sample_count as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Open the default input device and start capturing.
    pub fn start(&mut self, title: impl Into<String>) -> Result<(), CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;
        let supported = device.default_input_config()?;

        let config: StreamConfig = supported.config();
        self.sample_rate = config.sample_rate;
        self.channels = config.channels;
        self.title = title.into();
        self.samples.lock().unwrap().clear();
        self.paused.store(false, Ordering::SeqCst);

        let samples = Arc::clone(&self.samples);
        let paused = Arc::clone(&self.paused);

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, samples, paused)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, samples, paused)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, samples, paused)?,
            other => return Err(CaptureError::SampleFormat(other)),
        };
        stream.play()?;

        self.stream = Some(stream);
        self.state = RecordingState::Recording;
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state == RecordingState::Recording {
            self.paused.store(true, Ordering::SeqCst);
            self.state = RecordingState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == RecordingState::Paused {
            self.paused.store(false, Ordering::SeqCst);
            self.state = RecordingState::Recording;
        }
    }

    /// Stop capturing, write the WAV file into `audio_dir` and return the
    /// finished [`Recording`].
    pub fn stop(&mut self, audio_dir: &Path) -> Result<Recording, CaptureError> {
        if !matches!(
            self.state,
            RecordingState::Recording | RecordingState::Paused
        ) {
            return Err(CaptureError::NotRecording);
        }

        // Dropping the stream ends capture
        self.stream = None;
        self.state = RecordingState::Finished;

        let samples = std::mem::take(&mut *self.samples.lock().unwrap());
        let duration_secs =
            samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64);

        let path = audio_dir.join(format!(
            "{}_{}.wav",
            sanitize_title(&self.title),
            chrono::Utc::now().timestamp()
        ));
        write_wav(&path, &samples, self.sample_rate, self.channels)?;

        Ok(Recording::new(self.title.clone(), duration_secs, path))
    }
}

impl Default for AudioRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an input stream feeding the shared sample buffer. Paused input is
/// dropped at the callback so the stream itself stays live.
fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    samples: Arc<Mutex<Vec<f32>>>,
    paused: Arc<AtomicBool>,
) -> Result<Stream, CaptureError>
where
    T: cpal::Sample + cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    let err_fn = |err| {
        crate::verbose!("audio stream error (non-fatal): {err}");
    };

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if paused.load(Ordering::SeqCst) {
                return;
            }
            let mut buffer = samples.lock().unwrap();
            buffer.extend(data.iter().map(|&s| -> f32 { cpal::Sample::from_sample(s) }));
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

fn write_wav(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<(), CaptureError> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_without_start_is_rejected() {
        let mut recorder = AudioRecorder::new();
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            recorder.stop(dir.path()),
            Err(CaptureError::NotRecording)
        ));
    }

    #[test]
    fn pause_and_resume_only_apply_to_active_states() {
        let mut recorder = AudioRecorder::new();
        assert_eq!(recorder.state(), RecordingState::Idle);

        // Neither transition applies from Idle
        recorder.pause();
        assert_eq!(recorder.state(), RecordingState::Idle);
        recorder.resume();
        assert_eq!(recorder.state(), RecordingState::Idle);
    }

    #[test]
    fn wav_encoding_round_trips_sample_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.wav");
        let samples = vec![0.0f32; 16000];
        write_wav(&path, &samples, 16000, 1).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.duration(), 16000);
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
    }
}
