//! Active-cue lookup and stateful position tracking.

use std::sync::Arc;

use crate::cue::CueSequence;

/// Maps a playback position to the index of the active cue.
///
/// Returns `None` when the sequence is empty or the position is NaN (media
/// not ready yet) — the caller should simply try again on its next tick.
/// Otherwise returns the first index `i` with `cues[i].time <= position` and
/// either `i` is the last cue or `position < cues[i + 1].time`.
///
/// A position earlier than every cue maps to the *last* index. That fallback
/// is deliberate and stable across calls; the non-decreasing-index guarantee
/// therefore holds once the position has reached the first cue's time.
pub fn active_cue_index(cues: &CueSequence, position: f32) -> Option<usize> {
    if cues.is_empty() || position.is_nan() {
        return None;
    }
    for (i, cue) in cues.iter().enumerate() {
        let next_starts_later = cues.get(i + 1).is_none_or(|next| position < next.time);
        if position >= cue.time && next_starts_later {
            return Some(i);
        }
    }
    Some(cues.len() - 1)
}

/// Result of one tracker tick: the active index and whether it changed.
///
/// `changed` is what the display layer keys its scroll-into-view on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueAdvance {
    /// Index of the cue active at the sampled position.
    pub index: usize,
    /// True when this tick moved to a different cue than the previous one.
    pub changed: bool,
}

/// Stateful position→cue mapping over a swappable sequence.
///
/// The sequence lives behind an `Arc`: a re-parse builds a fresh
/// [`CueSequence`] and [`swap_sequence`](Self::swap_sequence) replaces it
/// wholesale, so any single [`tick`](Self::tick) reads exactly one complete
/// sequence — never a partially updated one.
#[derive(Debug, Clone)]
pub struct CueTracker {
    sequence: Arc<CueSequence>,
    current: Option<usize>,
}

impl CueTracker {
    /// Creates a tracker over `sequence` with no cue active yet.
    pub fn new(sequence: Arc<CueSequence>) -> Self {
        Self {
            sequence,
            current: None,
        }
    }

    /// The sequence currently being tracked.
    pub fn sequence(&self) -> &Arc<CueSequence> {
        &self.sequence
    }

    /// Replaces the tracked sequence wholesale.
    ///
    /// Clears the remembered index so the next tick re-emits even if the new
    /// sequence happens to resolve to the same position.
    pub fn swap_sequence(&mut self, sequence: Arc<CueSequence>) {
        tracing::debug!("cue sequence swapped: {} cues", sequence.len());
        self.sequence = sequence;
        self.current = None;
    }

    /// Index emitted by the most recent successful tick.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Samples `position` against the tracked sequence.
    ///
    /// Returns `None` when nothing can be emitted this tick (empty sequence
    /// or NaN position); the tick is skipped, not an error.
    pub fn tick(&mut self, position: f32) -> Option<CueAdvance> {
        let index = active_cue_index(&self.sequence, position)?;
        let changed = self.current != Some(index);
        self.current = Some(index);
        Some(CueAdvance { index, changed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::parse;

    fn three_cues() -> Arc<CueSequence> {
        Arc::new(parse("[00:00] zero\n[00:04] four\n[00:08] eight"))
    }

    #[test]
    fn position_between_cues_selects_earlier_cue() {
        assert_eq!(active_cue_index(&three_cues(), 5.0), Some(1));
    }

    #[test]
    fn position_past_end_selects_last() {
        assert_eq!(active_cue_index(&three_cues(), 9.0), Some(2));
    }

    #[test]
    fn position_before_first_cue_falls_back_to_last() {
        let cues = Arc::new(parse("[00:02] a\n[00:04] b"));
        assert_eq!(active_cue_index(&cues, -1.0), Some(1));
        // Stable across repeated calls.
        assert_eq!(active_cue_index(&cues, -1.0), Some(1));
    }

    #[test]
    fn nan_position_skips() {
        assert_eq!(active_cue_index(&three_cues(), f32::NAN), None);
    }

    #[test]
    fn empty_sequence_never_emits() {
        let empty = Arc::new(CueSequence::default());
        assert_eq!(active_cue_index(&empty, 3.0), None);
        let mut tracker = CueTracker::new(empty);
        assert_eq!(tracker.tick(3.0), None);
        assert_eq!(tracker.current(), None);
    }

    #[test]
    fn tick_reports_changes_only_on_movement() {
        let mut tracker = CueTracker::new(three_cues());
        assert_eq!(
            tracker.tick(0.5),
            Some(CueAdvance {
                index: 0,
                changed: true
            })
        );
        assert_eq!(
            tracker.tick(1.0),
            Some(CueAdvance {
                index: 0,
                changed: false
            })
        );
        assert_eq!(
            tracker.tick(4.5),
            Some(CueAdvance {
                index: 1,
                changed: true
            })
        );
    }

    #[test]
    fn nan_tick_keeps_previous_index() {
        let mut tracker = CueTracker::new(three_cues());
        tracker.tick(4.5);
        assert_eq!(tracker.tick(f32::NAN), None);
        assert_eq!(tracker.current(), Some(1));
    }

    #[test]
    fn swap_is_wholesale_and_reemits() {
        let mut tracker = CueTracker::new(three_cues());
        tracker.tick(4.5);
        assert_eq!(tracker.current(), Some(1));

        tracker.swap_sequence(Arc::new(parse("[00:01] only")));
        assert_eq!(tracker.current(), None);
        let adv = tracker.tick(4.5).unwrap();
        assert_eq!(adv.index, 0);
        assert!(adv.changed);
    }

    #[test]
    fn monotonic_positions_emit_monotonic_indices() {
        let mut tracker = CueTracker::new(three_cues());
        let mut last = 0usize;
        for step in 0..100 {
            let position = step as f32 * 0.1; // 0.0 ..= 9.9
            let adv = tracker.tick(position).unwrap();
            assert!(adv.index >= last, "index regressed at t={position}");
            last = adv.index;
        }
        assert_eq!(last, 2);
    }
}
