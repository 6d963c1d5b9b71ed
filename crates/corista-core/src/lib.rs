//! Corista core — DSP nodes and the voice-effects graph.
//!
//! This crate holds everything that shapes audio but touches no device:
//!
//! - [`Effect`] — block-based stereo processing trait implemented by every
//!   node in the voice chain.
//! - Nodes: [`Gain`], [`EchoDelay`], [`SoftShaper`], [`Convolver`], plus a
//!   transparent [`Passthrough`].
//! - [`ImpulseBuffer`] — the decaying-noise kernel the convolution reverb
//!   runs against, regenerated fresh for every graph build.
//! - [`graph`] — a declarative node/edge description of the signal topology,
//!   validated before anything is allocated, and a compiled executor that
//!   runs it block by block.
//!
//! The graph here is *description and execution* only. Devices, capture
//! lifecycles, and teardown policy live in `corista-engine`, which realizes
//! a [`graph::GraphSpec`] against a backend.

pub mod effect;
pub mod gain;
pub mod echo;
pub mod shaper;
pub mod noise;
pub mod impulse;
pub mod convolver;
pub mod toggles;
pub mod graph;

pub use convolver::Convolver;
pub use echo::EchoDelay;
pub use effect::{Effect, Passthrough};
pub use gain::Gain;
pub use impulse::ImpulseBuffer;
pub use noise::NoiseSource;
pub use shaper::SoftShaper;
pub use toggles::EffectToggles;
