//! cpal-backed capture acquisition and graph realization.

use std::collections::{HashMap, VecDeque};
use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host};

use corista_core::EffectToggles;
use corista_core::graph::{CompiledGraph, GraphSpec};

use crate::backend::{
    Acquisition, AcquisitionTicket, AudioDevice, CaptureBackend, CaptureConfig, CaptureStream,
    StreamHandle,
};
use crate::realize::{GraphHandle, GraphRealizer, NodeHandle};
use crate::{Error, Result};

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// List all available audio devices.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(inputs) = host.input_devices() {
        for device in inputs {
            if let Ok(name) = device_name(&device) {
                let sample_rate = device
                    .default_input_config()
                    .map(|c| c.sample_rate())
                    .unwrap_or(48000);
                let is_output = device.default_output_config().is_ok();
                devices.push(AudioDevice {
                    name,
                    is_input: true,
                    is_output,
                    default_sample_rate: sample_rate,
                });
            }
        }
    }

    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device_name(&device) {
                if devices.iter().any(|d| d.name == name) {
                    continue;
                }
                let sample_rate = device
                    .default_output_config()
                    .map(|c| c.sample_rate())
                    .unwrap_or(48000);
                devices.push(AudioDevice {
                    name,
                    is_input: false,
                    is_output: true,
                    default_sample_rate: sample_rate,
                });
            }
        }
    }

    Ok(devices)
}

fn find_input_device(host: &Host, name: &str) -> Result<Device> {
    let mut devices = host
        .input_devices()
        .map_err(|e| Error::Stream(e.to_string()))?;
    devices
        .find(|d| device_name(d).map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| Error::DeviceUnavailable(format!("input device '{name}' not found")))
}

/// Capture backend over the system's default cpal host.
///
/// cpal opens input streams synchronously, so a request resolves on its
/// first poll — the request/poll shape exists for callers and tests that
/// must survive acquisition staying pending across ticks.
pub struct CpalCaptureBackend {
    resolved: HashMap<u64, Acquisition>,
    next_ticket: u64,
}

impl CpalCaptureBackend {
    /// Creates a backend over the default host.
    pub fn new() -> Self {
        Self {
            resolved: HashMap::new(),
            next_ticket: 0,
        }
    }

    fn open_capture(config: &CaptureConfig) -> Result<CaptureStream> {
        let host = cpal::default_host();
        let device = match &config.device_name {
            Some(name) => find_input_device(&host, name)?,
            None => host
                .default_input_device()
                .ok_or_else(|| Error::DeviceUnavailable("no default input device".to_string()))?,
        };
        let name = device_name(&device).map_err(|e| Error::Stream(e.to_string()))?;

        let input_config = device
            .default_input_config()
            .map_err(|e| Error::AccessDenied(e.to_string()))?;
        let channels = input_config.channels();
        let sample_rate = input_config.sample_rate();

        let (tx, rx) = mpsc::sync_channel::<Vec<f32>>(8);
        let stream = device
            .build_input_stream(
                &input_config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Dropped blocks are preferable to blocking the device
                    // callback when the consumer stalls.
                    let _ = tx.try_send(data.to_vec());
                },
                |err| tracing::error!("input stream error: {err}"),
                None,
            )
            .map_err(|e| Error::AccessDenied(e.to_string()))?;
        stream.play().map_err(|e| Error::Stream(e.to_string()))?;

        tracing::debug!("capture open on '{name}' ({channels} ch, {sample_rate} Hz)");
        Ok(CaptureStream::new(
            name,
            sample_rate,
            channels,
            rx,
            StreamHandle::new(stream),
        ))
    }
}

impl Default for CpalCaptureBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for CpalCaptureBackend {
    fn name(&self) -> &str {
        "cpal"
    }

    fn request_capture(&mut self, config: &CaptureConfig) -> AcquisitionTicket {
        let ticket = AcquisitionTicket(self.next_ticket);
        self.next_ticket += 1;
        let result = match Self::open_capture(config) {
            Ok(stream) => Acquisition::Granted(stream),
            Err(error) => Acquisition::Refused(error),
        };
        self.resolved.insert(ticket.0, result);
        ticket
    }

    fn poll(&mut self, ticket: AcquisitionTicket) -> Acquisition {
        self.resolved.remove(&ticket.0).unwrap_or_else(|| {
            Acquisition::Refused(Error::DeviceUnavailable(
                "unknown acquisition ticket".to_string(),
            ))
        })
    }
}

/// Derives a kernel seed that differs per build.
fn fresh_seed() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(0x9e37_79b9)
}

/// Realizes a graph description into live audio: the capture stream feeds
/// the compiled graph inside a cpal output callback.
///
/// The duplex plumbing is a channel: the input callback pushes interleaved
/// blocks, the output callback drains them, runs the graph block by block,
/// and interleaves the result into the device buffer.
pub struct CpalRealizer {
    block_size: usize,
}

impl CpalRealizer {
    /// Creates a realizer processing in blocks of `block_size` frames.
    pub fn new(block_size: usize) -> Self {
        Self { block_size }
    }
}

impl GraphRealizer for CpalRealizer {
    fn realize(
        &mut self,
        spec: &GraphSpec,
        capture: CaptureStream,
        toggles: EffectToggles,
    ) -> Result<GraphHandle> {
        let block = self.block_size;
        // The graph runs at the capture rate; capture and output must share
        // a clock domain or the channel between them drifts.
        let sample_rate = capture.sample_rate();
        let mut graph = CompiledGraph::compile(spec, sample_rate as f32, block, fresh_seed())?;

        let labels: Vec<&'static str> = graph.labels().to_vec();
        let (device_name, _rate, in_channels, frames, capture_handle) = capture.into_parts();
        let in_channels = in_channels as usize;

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(Error::NoDevice)?;
        let output_config = device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?;
        let out_channels = output_config.channels() as usize;

        let mut pending: Vec<f32> = Vec::new();
        let mut in_l = vec![0.0f32; block];
        let mut in_r = vec![0.0f32; block];
        let mut out_l = vec![0.0f32; block];
        let mut out_r = vec![0.0f32; block];
        let mut ready: VecDeque<(f32, f32)> = VecDeque::new();

        let output_stream = device
            .build_output_stream(
                &output_config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    while let Ok(chunk) = frames.try_recv() {
                        pending.extend(chunk);
                    }

                    let frames_needed = data.len() / out_channels;
                    while ready.len() < frames_needed && pending.len() >= block * in_channels {
                        for i in 0..block {
                            let base = i * in_channels;
                            in_l[i] = pending[base];
                            in_r[i] = if in_channels > 1 {
                                pending[base + 1]
                            } else {
                                pending[base]
                            };
                        }
                        pending.drain(..block * in_channels);
                        graph.process_block(&in_l, &in_r, &mut out_l, &mut out_r);
                        for i in 0..block {
                            ready.push_back((out_l[i], out_r[i]));
                        }
                    }

                    for frame in data.chunks_mut(out_channels) {
                        let (l, r) = ready.pop_front().unwrap_or((0.0, 0.0));
                        frame[0] = l;
                        if frame.len() > 1 {
                            frame[1] = r;
                        }
                        for extra in frame.iter_mut().skip(2) {
                            *extra = 0.0;
                        }
                    }
                },
                |err| tracing::error!("output stream error: {err}"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;
        output_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;

        tracing::debug!("voice chain live: '{device_name}' → default output");
        let nodes = labels
            .into_iter()
            .map(|label| NodeHandle::new(label, None))
            .collect();
        Ok(GraphHandle::new(
            toggles,
            nodes,
            vec![capture_handle, StreamHandle::new(output_stream)],
        ))
    }
}
