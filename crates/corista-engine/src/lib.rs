//! Audio device layer for corista.
//!
//! Everything that touches a device lives here, behind two seams:
//!
//! - [`CaptureBackend`] — acquires the microphone. Acquisition is
//!   request/poll so a pending grant can be superseded without blocking the
//!   caller: the cpal backend resolves immediately, the [`mock`] backend on
//!   a scripted schedule.
//! - [`GraphRealizer`] — turns a validated graph description plus a capture
//!   stream into a live [`GraphHandle`]. [`CpalRealizer`] runs real audio;
//!   [`NullRealizer`] allocates counted handles only, for topology and
//!   lifecycle tests.
//!
//! [`MicController`] owns the capture lifecycle: the `Off → Acquiring → On`
//! state machine, generation-token fencing of in-flight acquisitions, and
//! latest-wins reconfiguration. [`Player`] plays the instrumental and is the
//! position source the lyric sampler polls.

pub mod backend;
pub mod controller;
pub mod cpal_backend;
pub mod mock;
pub mod playback;
pub mod realize;
pub mod wav;

pub use backend::{
    Acquisition, AcquisitionTicket, AudioDevice, CaptureBackend, CaptureConfig, CaptureStream,
    StreamHandle,
};
pub use controller::{MicController, MicEvent, MicPhase};
pub use cpal_backend::{CpalCaptureBackend, CpalRealizer, list_devices};
pub use playback::Player;
pub use realize::{GraphHandle, GraphRealizer, NodeHandle, NullRealizer};
pub use wav::{read_wav_stereo, write_wav_stereo};

/// Errors from device acquisition, graph realization, and audio I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host refused access to the capture device.
    #[error("microphone access denied: {0}")]
    AccessDenied(String),

    /// No usable capture device, or the device vanished.
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The graph description failed validation.
    #[error("invalid graph topology: {0}")]
    Topology(#[from] corista_core::graph::GraphError),

    /// A node could not be allocated while building a graph. Everything
    /// created earlier in the same build has already been released.
    #[error("failed to construct {node} node: {reason}")]
    GraphConstruction {
        /// Label of the node that failed.
        node: String,
        /// Human-readable cause.
        reason: String,
    },

    /// Audio stream setup or runtime error.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// No audio output device available on the system.
    #[error("no audio device available")]
    NoDevice,

    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
