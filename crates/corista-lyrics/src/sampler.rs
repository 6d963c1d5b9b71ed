//! Periodic cue sampling with explicit cancellation.
//!
//! The sampler polls an external [`PositionSource`] on a fixed schedule
//! (display-frame rate by default) and feeds the position through a
//! [`CueTracker`]. It is cooperative: the owner calls
//! [`poll`](Sampler::poll) from its event loop, or hands the whole loop to
//! [`run`](Sampler::run). Either way a [`SamplerHandle`] cloned off the
//! sampler stops it from anywhere.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::cue::CueSequence;
use crate::tracker::{CueAdvance, CueTracker};

/// A readable playback position in seconds.
///
/// Implemented by whatever transport plays the instrumental. May legitimately
/// report NaN before media is loaded; the sampler skips those ticks.
pub trait PositionSource {
    /// Current playback position in seconds, or NaN when not yet known.
    fn position_secs(&self) -> f32;
}

impl<P: PositionSource + ?Sized> PositionSource for Arc<P> {
    fn position_secs(&self) -> f32 {
        (**self).position_secs()
    }
}

/// Cancellation handle for a [`Sampler`].
///
/// Cheap to clone; cancelling is idempotent and takes effect on the next
/// poll.
#[derive(Debug, Clone)]
pub struct SamplerHandle {
    cancelled: Arc<AtomicBool>,
}

impl SamplerHandle {
    /// Stops the sampler.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Periodic position sampler driving a [`CueTracker`].
pub struct Sampler<S> {
    source: S,
    tracker: CueTracker,
    period: Duration,
    next_due: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl<S: PositionSource> Sampler<S> {
    /// Default sampling period, roughly one display frame.
    pub const DEFAULT_PERIOD: Duration = Duration::from_millis(16);

    /// Creates a sampler over `source` at the default ~60 Hz period.
    pub fn new(source: S, sequence: Arc<CueSequence>) -> Self {
        Self::with_period(source, sequence, Self::DEFAULT_PERIOD)
    }

    /// Creates a sampler with an explicit period.
    pub fn with_period(source: S, sequence: Arc<CueSequence>, period: Duration) -> Self {
        Self {
            source,
            tracker: CueTracker::new(sequence),
            period,
            next_due: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A cancellation handle for this sampler.
    pub fn handle(&self) -> SamplerHandle {
        SamplerHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// The tracker, e.g. to swap in a freshly parsed sequence.
    pub fn tracker_mut(&mut self) -> &mut CueTracker {
        &mut self.tracker
    }

    /// Read-only view of the tracker.
    pub fn tracker(&self) -> &CueTracker {
        &self.tracker
    }

    /// Polls once if a period has elapsed since the previous sample.
    ///
    /// Returns the tick outcome when the schedule fired and the tracker
    /// emitted; `None` when cancelled, not yet due, or the tick was skipped
    /// (NaN position / empty sequence). Taking `now` as an argument keeps the
    /// schedule deterministic under test.
    pub fn poll(&mut self, now: Instant) -> Option<CueAdvance> {
        if self.cancelled.load(Ordering::SeqCst) {
            return None;
        }
        match self.next_due {
            Some(due) if now < due => return None,
            _ => {}
        }
        // Schedule from now rather than from the missed deadline so a stalled
        // host loop does not cause a burst of catch-up ticks.
        self.next_due = Some(now + self.period);
        self.tracker.tick(self.source.position_secs())
    }

    /// Runs the sampling loop until cancelled, invoking `on_advance` for
    /// every emitted tick.
    pub fn run(mut self, mut on_advance: impl FnMut(CueAdvance)) {
        while !self.cancelled.load(Ordering::SeqCst) {
            if let Some(advance) = self.poll(Instant::now()) {
                on_advance(advance);
            }
            std::thread::sleep(self.period.min(Duration::from_millis(4)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::parse;
    use std::cell::Cell;

    struct FakeClock(Cell<f32>);

    impl PositionSource for FakeClock {
        fn position_secs(&self) -> f32 {
            self.0.get()
        }
    }

    fn sequence() -> Arc<CueSequence> {
        Arc::new(parse("[00:00] a\n[00:04] b\n[00:08] c"))
    }

    #[test]
    fn poll_respects_period() {
        let clock = FakeClock(Cell::new(0.0));
        let mut sampler = Sampler::with_period(clock, sequence(), Duration::from_millis(16));

        let t0 = Instant::now();
        assert!(sampler.poll(t0).is_some());
        // Too soon: schedule has not elapsed.
        assert!(sampler.poll(t0 + Duration::from_millis(1)).is_none());
        // One period later it fires again.
        assert!(sampler.poll(t0 + Duration::from_millis(16)).is_some());
    }

    #[test]
    fn cancelled_sampler_stops_emitting() {
        let clock = FakeClock(Cell::new(1.0));
        let mut sampler = Sampler::new(clock, sequence());
        let handle = sampler.handle();

        assert!(sampler.poll(Instant::now()).is_some());
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(sampler.poll(Instant::now() + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn nan_position_skips_tick_and_retries() {
        let clock = FakeClock(Cell::new(f32::NAN));
        let mut sampler = Sampler::with_period(clock, sequence(), Duration::ZERO);

        let t0 = Instant::now();
        assert!(sampler.poll(t0).is_none());

        sampler.source.0.set(4.5);
        let adv = sampler.poll(t0 + Duration::from_millis(1)).unwrap();
        assert_eq!(adv.index, 1);
    }

    #[test]
    fn sequence_swap_between_ticks_is_atomic() {
        let clock = FakeClock(Cell::new(5.0));
        let mut sampler = Sampler::with_period(clock, sequence(), Duration::ZERO);

        let t0 = Instant::now();
        assert_eq!(sampler.poll(t0).unwrap().index, 1);

        sampler
            .tracker_mut()
            .swap_sequence(Arc::new(parse("[00:05] x\n[00:06] y")));
        let adv = sampler.poll(t0 + Duration::from_millis(1)).unwrap();
        assert_eq!(adv.index, 0);
        assert!(adv.changed);
    }
}
