//! Declarative voice-graph description and execution.
//!
//! The graph is described up front as an explicit node list plus edge list
//! ([`GraphSpec`]), validated before anything heavier than a `Vec` exists,
//! and only then compiled into a runnable [`CompiledGraph`]. That split keeps
//! topology checking independent of any audio backend: a test can validate
//! and compile graphs without ever opening a device.
//!
//! [`voice_topology`] builds the one shape this application uses:
//!
//! ```text
//! capture ─ input ─ echo ─ (shaper | passthrough) ─ reverb ─ wet ─┐
//!              └──────────────── dry ────────────────────────── master ─ sink
//! ```
//!
//! The shape is fixed; only node parameters follow the
//! [`EffectToggles`](crate::EffectToggles) snapshot. Toggling an effect off
//! makes its node transparent (zero delay, passthrough slot, zero wet gain)
//! rather than rewiring edges.

mod compiled;
mod spec;

pub use compiled::CompiledGraph;
pub use spec::{
    DRY_GAIN, ECHO_DELAY_SECS, ECHO_FEEDBACK, GraphError, GraphSpec, NodeId, NodeSpec,
    REVERB_DECAY, REVERB_DURATION_SECS, WET_GAIN, voice_topology,
};
