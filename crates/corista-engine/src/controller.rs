//! Microphone lifecycle controller.
//!
//! [`MicController`] owns the one live voice graph and serializes every
//! transition around it:
//!
//! ```text
//!        enable                acquisition grants, graph builds
//! Off ─────────▶ Acquiring ──────────────────────────────────▶ On
//!  ▲                │  │                                        │
//!  │   disable /    │  │ refused / build failed                 │ disable
//!  ◀────────────────┘  ◀──────────────────────────────────────◀─┘
//! ```
//!
//! Each enable attempt carries a monotonically increasing generation token.
//! When a Disable or a newer Reconfigure supersedes a pending acquisition,
//! its ticket is parked; the parked grant — whenever the backend finally
//! produces it — is dropped on arrival, which stops the stream and releases
//! the device. The controller therefore never holds a device the caller did
//! not most recently ask for, and never builds a second graph while a first
//! one exists.

use corista_core::EffectToggles;
use corista_core::graph::voice_topology;

use crate::Error;
use crate::backend::{Acquisition, AcquisitionTicket, CaptureBackend, CaptureConfig};
use crate::realize::{GraphHandle, GraphRealizer};

/// Externally visible controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicPhase {
    /// No graph, no pending acquisition.
    Off,
    /// Waiting for the capture device.
    Acquiring,
    /// A graph is live.
    On,
}

/// Events surfaced by [`MicController::pump`] for the caller to report.
#[derive(Debug)]
pub enum MicEvent {
    /// The graph for this snapshot went live.
    Enabled(EffectToggles),
    /// An enable or reconfigure attempt failed; the controller is Off.
    Failed(Error),
}

enum State {
    Off,
    Acquiring {
        ticket: AcquisitionTicket,
        generation: u64,
        toggles: EffectToggles,
    },
    On {
        graph: GraphHandle,
    },
}

/// Owns the capture device lifecycle and the live [`GraphHandle`].
pub struct MicController {
    backend: Box<dyn CaptureBackend>,
    realizer: Box<dyn GraphRealizer>,
    capture_config: CaptureConfig,
    state: State,
    generation: u64,
    /// Superseded acquisitions still awaiting a result. Their grants are
    /// discarded (and the device released) the moment they arrive.
    parked: Vec<AcquisitionTicket>,
}

impl MicController {
    /// Creates a controller in the Off state.
    ///
    /// The backend and realizer are injected so tests substitute the mock
    /// backend and the null realizer; nothing here touches a device until
    /// [`enable`](Self::enable).
    pub fn new(
        backend: Box<dyn CaptureBackend>,
        realizer: Box<dyn GraphRealizer>,
        capture_config: CaptureConfig,
    ) -> Self {
        Self {
            backend,
            realizer,
            capture_config,
            state: State::Off,
            generation: 0,
            parked: Vec::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> MicPhase {
        match self.state {
            State::Off => MicPhase::Off,
            State::Acquiring { .. } => MicPhase::Acquiring,
            State::On { .. } => MicPhase::On,
        }
    }

    /// The live graph, when On.
    pub fn graph(&self) -> Option<&GraphHandle> {
        match &self.state {
            State::On { graph } => Some(graph),
            _ => None,
        }
    }

    /// The snapshot the controller is running (On) or working toward
    /// (Acquiring).
    pub fn toggles(&self) -> Option<EffectToggles> {
        match &self.state {
            State::Off => None,
            State::Acquiring { toggles, .. } => Some(*toggles),
            State::On { graph } => Some(graph.toggles()),
        }
    }

    /// Number of superseded acquisitions still awaiting their result.
    pub fn parked_acquisitions(&self) -> usize {
        self.parked.len()
    }

    /// Turns the mic on with the given snapshot.
    ///
    /// From Off this starts an acquisition; from Acquiring or On it behaves
    /// like [`reconfigure`](Self::reconfigure).
    pub fn enable(&mut self, toggles: EffectToggles) {
        match self.state {
            State::Off => self.begin_acquisition(toggles),
            _ => self.reconfigure(toggles),
        }
    }

    /// Turns the mic off.
    ///
    /// From On this drops the graph — all node handles released, capture
    /// stopped — synchronously. From Acquiring the pending ticket is parked;
    /// its eventual grant is discarded by [`pump`](Self::pump).
    pub fn disable(&mut self) {
        match std::mem::replace(&mut self.state, State::Off) {
            State::Off => {}
            State::On { graph } => {
                tracing::debug!("mic disabled, releasing {} nodes", graph.node_count());
                drop(graph);
            }
            State::Acquiring { ticket, .. } => {
                tracing::debug!("enable cancelled while acquiring");
                self.parked.push(ticket);
            }
        }
    }

    /// Applies a new configuration snapshot.
    ///
    /// Equal snapshots are a no-op. Otherwise the current instance is fully
    /// torn down and a fresh acquisition starts with the new snapshot.
    /// Bursts serialize latest-wins: each call supersedes the previous
    /// pending attempt, so only the newest snapshot is ever realized.
    pub fn reconfigure(&mut self, toggles: EffectToggles) {
        match &self.state {
            State::On { graph } if graph.toggles() == toggles => return,
            State::Acquiring {
                toggles: pending, ..
            } if *pending == toggles => return,
            State::Off => {
                tracing::debug!("reconfigure ignored while off");
                return;
            }
            _ => {}
        }

        match std::mem::replace(&mut self.state, State::Off) {
            State::Off => unreachable!("handled above"),
            State::On { graph } => {
                tracing::debug!("reconfiguring: tearing down live graph");
                drop(graph);
            }
            State::Acquiring { ticket, .. } => {
                tracing::debug!("reconfiguring: superseding pending acquisition");
                self.parked.push(ticket);
            }
        }
        self.begin_acquisition(toggles);
    }

    /// Drives pending work: drains superseded acquisitions and advances the
    /// active one. Call this from the application's event loop tick.
    pub fn pump(&mut self) -> Vec<MicEvent> {
        let mut events = Vec::new();

        // Parked grants are released the moment they arrive.
        let backend = &mut self.backend;
        self.parked.retain(|&ticket| match backend.poll(ticket) {
            Acquisition::Pending => true,
            Acquisition::Granted(stream) => {
                tracing::debug!("superseded grant arrived; releasing device immediately");
                drop(stream);
                false
            }
            Acquisition::Refused(_) => false,
        });

        let (ticket, generation, toggles) = match &self.state {
            State::Acquiring {
                ticket,
                generation,
                toggles,
            } => (*ticket, *generation, *toggles),
            _ => return events,
        };

        match self.backend.poll(ticket) {
            Acquisition::Pending => {}
            Acquisition::Granted(stream) => {
                if generation != self.generation {
                    // Fenced out: a newer attempt owns the controller now.
                    // Parking keeps this branch unreachable in practice, but
                    // the token makes the discard unconditional.
                    tracing::warn!("stale acquisition grant discarded");
                    drop(stream);
                    return events;
                }
                let spec = voice_topology(toggles);
                match self.realizer.realize(&spec, stream, toggles) {
                    Ok(graph) => {
                        tracing::debug!("mic enabled: {:?}", toggles);
                        self.state = State::On { graph };
                        events.push(MicEvent::Enabled(toggles));
                    }
                    Err(error) => {
                        tracing::warn!("graph construction failed: {error}");
                        self.state = State::Off;
                        events.push(MicEvent::Failed(error));
                    }
                }
            }
            Acquisition::Refused(error) => {
                tracing::warn!("capture acquisition refused: {error}");
                self.state = State::Off;
                events.push(MicEvent::Failed(error));
            }
        }
        events
    }

    fn begin_acquisition(&mut self, toggles: EffectToggles) {
        self.generation += 1;
        let ticket = self.backend.request_capture(&self.capture_config);
        tracing::debug!(
            "acquiring capture device (generation {}, {:?})",
            self.generation,
            toggles
        );
        self.state = State::Acquiring {
            ticket,
            generation: self.generation,
            toggles,
        };
    }
}
