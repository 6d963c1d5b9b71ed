//! Instrumental playback with volume and rate control.
//!
//! [`Player`] loads a WAV file and streams it to the default output device.
//! It exposes the transport surface the karaoke session needs — play, pause,
//! seek, volume, playback rate — and implements
//! [`PositionSource`](corista_lyrics::PositionSource) so the lyric sampler
//! can poll it. Before a file is loaded the reported position is NaN, which
//! the sampler treats as "skip this tick".

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use corista_lyrics::PositionSource;

use crate::backend::StreamHandle;
use crate::wav::read_wav_stereo;
use crate::{Error, Result};

/// State shared with the audio callback.
///
/// The playhead is a fractional source-frame index stored as `f64` bits; the
/// callback advances it by `rate × (file_rate / device_rate)` per output
/// frame and the UI thread reads it for position display.
struct Transport {
    playhead: AtomicU64,
    volume: AtomicU32,
    rate: AtomicU32,
    playing: AtomicBool,
}

impl Transport {
    fn new() -> Self {
        Self {
            playhead: AtomicU64::new(0f64.to_bits()),
            volume: AtomicU32::new(0.9f32.to_bits()),
            rate: AtomicU32::new(1.0f32.to_bits()),
            playing: AtomicBool::new(false),
        }
    }

    fn playhead(&self) -> f64 {
        f64::from_bits(self.playhead.load(Ordering::Relaxed))
    }

    fn set_playhead(&self, frames: f64) {
        self.playhead.store(frames.to_bits(), Ordering::Relaxed);
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    fn rate(&self) -> f32 {
        f32::from_bits(self.rate.load(Ordering::Relaxed))
    }
}

/// WAV player bound to the default output device.
pub struct Player {
    transport: Arc<Transport>,
    file_rate: f32,
    duration_secs: f32,
    _stream: StreamHandle,
}

impl Player {
    /// Loads `path` and opens an output stream, initially paused.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let (left, right, file_rate) = read_wav_stereo(path.as_ref())?;
        let frames = left.len();
        let duration_secs = frames as f32 / file_rate as f32;
        tracing::debug!(
            "loaded instrumental: {} frames at {} Hz ({duration_secs:.1} s)",
            frames,
            file_rate
        );

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(Error::NoDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?;
        let device_rate = config.sample_rate();
        let channels = config.channels() as usize;

        let transport = Arc::new(Transport::new());
        let callback_transport = Arc::clone(&transport);
        let left = Arc::new(left);
        let right = Arc::new(right);
        let step_base = f64::from(file_rate) / f64::from(device_rate);

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !callback_transport.playing.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }
                    let volume = callback_transport.volume();
                    let step = step_base * f64::from(callback_transport.rate().max(0.01));
                    let mut playhead = callback_transport.playhead();

                    for frame in data.chunks_mut(channels) {
                        let (l, r) = sample_at(&left, &right, playhead);
                        frame[0] = l * volume;
                        if frame.len() > 1 {
                            frame[1] = r * volume;
                        }
                        for extra in frame.iter_mut().skip(2) {
                            *extra = 0.0;
                        }
                        playhead += step;
                    }

                    if playhead >= left.len() as f64 {
                        // Ran off the end: stop, keep the position at the end.
                        playhead = left.len() as f64;
                        callback_transport.playing.store(false, Ordering::Relaxed);
                    }
                    callback_transport.set_playhead(playhead);
                },
                |err| tracing::error!("playback stream error: {err}"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;
        stream.play().map_err(|e| Error::Stream(e.to_string()))?;

        Ok(Self {
            transport,
            file_rate: file_rate as f32,
            duration_secs,
            _stream: StreamHandle::new(stream),
        })
    }

    /// Starts or resumes playback.
    pub fn play(&self) {
        self.transport.playing.store(true, Ordering::Relaxed);
    }

    /// Pauses playback, keeping the position.
    pub fn pause(&self) {
        self.transport.playing.store(false, Ordering::Relaxed);
    }

    /// Stops playback and rewinds to the start.
    pub fn stop(&self) {
        self.transport.playing.store(false, Ordering::Relaxed);
        self.transport.set_playhead(0.0);
    }

    /// Whether playback is running.
    pub fn is_playing(&self) -> bool {
        self.transport.playing.load(Ordering::Relaxed)
    }

    /// Seeks to `secs`, clamped to the file duration.
    pub fn seek(&self, secs: f32) {
        let frames = f64::from(secs.clamp(0.0, self.duration_secs)) * f64::from(self.file_rate);
        self.transport.set_playhead(frames);
    }

    /// Sets the output volume (0.0 to 1.0).
    pub fn set_volume(&self, volume: f32) {
        self.transport
            .volume
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    /// Sets the playback rate (0.5 = half speed, 2.0 = double).
    pub fn set_rate(&self, rate: f32) {
        self.transport
            .rate
            .store(rate.clamp(0.25, 4.0).to_bits(), Ordering::Relaxed);
    }

    /// Total duration of the loaded file in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.duration_secs
    }
}

impl PositionSource for Player {
    fn position_secs(&self) -> f32 {
        (self.transport.playhead() / f64::from(self.file_rate)) as f32
    }
}

/// Linear-interpolated stereo sample lookup at a fractional frame index.
fn sample_at(left: &[f32], right: &[f32], playhead: f64) -> (f32, f32) {
    if playhead < 0.0 {
        return (0.0, 0.0);
    }
    let base = playhead as usize;
    if base >= left.len() {
        return (0.0, 0.0);
    }
    let next = (base + 1).min(left.len() - 1);
    let frac = (playhead - base as f64) as f32;
    (
        left[base] * (1.0 - frac) + left[next] * frac,
        right[base] * (1.0 - frac) + right[next] * frac,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_blends_neighbors() {
        let left = [0.0, 1.0];
        let right = [1.0, 0.0];
        let (l, r) = sample_at(&left, &right, 0.25);
        assert!((l - 0.25).abs() < 1e-6);
        assert!((r - 0.75).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_playhead_is_silent() {
        let samples = [0.5, 0.5];
        assert_eq!(sample_at(&samples, &samples, -1.0), (0.0, 0.0));
        assert_eq!(sample_at(&samples, &samples, 2.0), (0.0, 0.0));
    }

    #[test]
    fn transport_defaults_match_stage_setup() {
        let t = Transport::new();
        assert!((t.volume() - 0.9).abs() < 1e-6);
        assert!((t.rate() - 1.0).abs() < 1e-6);
        assert!(!t.playing.load(Ordering::Relaxed));
    }
}
