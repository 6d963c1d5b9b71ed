//! Lyric timing engine for corista.
//!
//! This crate turns raw timestamped lyric text into an ordered [`CueSequence`]
//! and maps a continuously advancing playback position onto the active cue:
//!
//! - [`parse`] — total parser for `[mm:ss]` / `[mm:ss.cc]` lines. Never fails;
//!   lines without a timestamp are retained and spaced synthetically.
//! - [`CueTracker`] — stateful position→index mapping with wholesale sequence
//!   swaps (a tick observes either the old or the new sequence, never a mix).
//! - [`Sampler`] — periodic polling task around a [`PositionSource`], with an
//!   explicit [`SamplerHandle`] for cancellation.
//!
//! The crate is pure bookkeeping: it owns no audio and no UI. The display
//! layer consumes the emitted indices; the playback position comes from
//! whatever transport the application runs.

mod cue;
mod sampler;
mod tracker;

pub use cue::{Cue, CueSequence, parse};
pub use sampler::{PositionSource, Sampler, SamplerHandle};
pub use tracker::{CueAdvance, CueTracker, active_cue_index};
