//! Pluggable capture backend abstraction.
//!
//! [`CaptureBackend`] decouples the mic controller from any platform audio
//! API. Acquisition is asynchronous in the cooperative sense: requesting
//! returns a ticket immediately, and the result is collected later via
//! [`poll`](CaptureBackend::poll). The controller keeps pumping its event
//! loop while a grant is pending, which is what lets a Disable or a newer
//! Reconfigure supersede an acquisition that has not resolved yet.
//!
//! The default implementation wraps cpal (where acquisition resolves on the
//! first poll); the [`mock`](crate::mock) backend scripts grant/denial
//! schedules for lifecycle tests.

use std::sync::mpsc::Receiver;

/// Configuration for acquiring a capture stream.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Optional device name (system default if `None`).
    pub device_name: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 256,
            device_name: None,
        }
    }
}

/// Identifies one acquisition request.
///
/// Tickets are issued by [`CaptureBackend::request_capture`] and resolve at
/// most once; polling a ticket that already resolved (or was never issued)
/// reports the device as unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AcquisitionTicket(pub(crate) u64);

/// Result of polling an acquisition ticket.
pub enum Acquisition {
    /// The host has not answered yet; poll again next tick.
    Pending,
    /// Access granted: the capture stream is live and delivering frames.
    Granted(CaptureStream),
    /// Access denied or the device is gone.
    Refused(crate::Error),
}

impl std::fmt::Debug for Acquisition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Acquisition::Pending => write!(f, "Pending"),
            Acquisition::Granted(_) => write!(f, "Granted(..)"),
            Acquisition::Refused(e) => write!(f, "Refused({e})"),
        }
    }
}

/// Type-erased audio stream handle.
///
/// Wraps a backend-specific stream object. The stream is active while this
/// handle exists; dropping it stops capture or playback. Keeps platform
/// types out of the controller and the graph handle.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wraps a backend-specific stream object, keeping it alive until the
    /// handle is dropped.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// A live capture stream plus the channel its frames arrive on.
///
/// Frames are interleaved `f32` blocks as delivered by the device callback.
/// Dropping the stream (or the [`GraphHandle`](crate::GraphHandle) that owns
/// it) stops capture and releases the device.
pub struct CaptureStream {
    device_name: String,
    sample_rate: u32,
    channels: u16,
    frames: Receiver<Vec<f32>>,
    handle: StreamHandle,
}

impl CaptureStream {
    /// Assembles a capture stream from backend parts.
    pub fn new(
        device_name: String,
        sample_rate: u32,
        channels: u16,
        frames: Receiver<Vec<f32>>,
        handle: StreamHandle,
    ) -> Self {
        Self {
            device_name,
            sample_rate,
            channels,
            frames,
            handle,
        }
    }

    /// Name of the device delivering the frames.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Capture sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels per frame.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Splits the stream into the frame receiver and the RAII handle, for a
    /// realizer that moves the receiver into an output callback.
    pub fn into_parts(self) -> (String, u32, u16, Receiver<Vec<f32>>, StreamHandle) {
        (
            self.device_name,
            self.sample_rate,
            self.channels,
            self.frames,
            self.handle,
        )
    }
}

impl std::fmt::Debug for CaptureStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureStream")
            .field("device_name", &self.device_name)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

/// Audio device information, for enumeration UIs.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether the device supports capture.
    pub is_input: bool,
    /// Whether the device supports playback.
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
}

/// Pluggable capture backend.
///
/// Object-safe so the controller can hold `Box<dyn CaptureBackend>` and
/// tests can substitute a scripted implementation.
pub trait CaptureBackend: Send {
    /// Human-readable backend name (e.g. "cpal", "mock").
    fn name(&self) -> &str;

    /// Starts acquiring the capture device. Never blocks; the result is
    /// collected through [`poll`](Self::poll).
    fn request_capture(&mut self, config: &CaptureConfig) -> AcquisitionTicket;

    /// Polls one acquisition request. A ticket resolves at most once; the
    /// caller must stop polling a ticket after it resolves.
    fn poll(&mut self, ticket: AcquisitionTicket) -> Acquisition;
}
