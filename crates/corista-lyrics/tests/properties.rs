//! Property-based tests for the lyric parser and cue tracker.
//!
//! Parsing is a total function over arbitrary text; these tests pin down the
//! invariants that must survive any input: purity, ordering, and the
//! monotone-index guarantee of the tracker.

use proptest::prelude::*;
use std::sync::Arc;

use corista_lyrics::{CueTracker, active_cue_index, parse};

/// Arbitrary multi-line text, mixing plausible timestamps with junk.
fn arb_lyric_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            r"\[[0-9]{1,2}:[0-9]{1,2}\] [a-z ]{0,20}",
            r"\[[0-9]{1,2}:[0-9]{1,2}\.[0-9]{1,2}\][a-z ]{0,20}",
            ".{0,30}",
        ],
        0..20,
    )
    .prop_map(|lines| lines.join("\n"))
}

proptest! {
    /// Parsing never panics and yields one cue per non-empty line.
    #[test]
    fn parse_is_total(text in arb_lyric_text()) {
        let seq = parse(&text);
        let non_empty_lines = text.lines().filter(|l| !l.is_empty()).count();
        prop_assert_eq!(seq.len(), non_empty_lines);
    }

    /// Parsing identical text twice yields identical sequences.
    #[test]
    fn parse_is_pure(text in arb_lyric_text()) {
        prop_assert_eq!(parse(&text), parse(&text));
    }

    /// Cue times are sorted ascending after construction.
    #[test]
    fn parse_output_is_sorted(text in arb_lyric_text()) {
        let seq = parse(&text);
        for window in seq.as_slice().windows(2) {
            prop_assert!(window[0].time <= window[1].time);
        }
    }

    /// Untimed-only input is spaced at exact 2.5 s multiples.
    #[test]
    fn untimed_lines_space_evenly(lines in prop::collection::vec("[a-z]{1,12}", 1..20)) {
        let text = lines.join("\n");
        let seq = parse(&text);
        for (i, cue) in seq.iter().enumerate() {
            let expected = 2.5 * (i as f32 + 1.0);
            prop_assert!((cue.time - expected).abs() < 1e-4,
                "cue {} at {} expected {}", i, cue.time, expected);
        }
    }

    /// For sorted timed cues and any in-range monotone position walk, the
    /// tracker's emitted index never decreases.
    #[test]
    fn tracker_index_is_monotone(
        starts in prop::collection::vec(0u32..600, 2..12),
        steps in prop::collection::vec(0.0f32..2.0, 1..64),
    ) {
        let mut starts = starts;
        starts.sort_unstable();
        starts.dedup();
        prop_assume!(starts.len() >= 2);

        let text: String = starts
            .iter()
            .map(|s| format!("[{:02}:{:02}] line\n", s / 60, s % 60))
            .collect();
        let seq = Arc::new(parse(&text));

        let mut tracker = CueTracker::new(Arc::clone(&seq));
        let mut position = starts[0] as f32; // start in range
        let mut last_index = 0usize;
        for step in steps {
            position += step;
            let adv = tracker.tick(position).unwrap();
            prop_assert!(adv.index >= last_index);
            last_index = adv.index;
        }
    }

    /// The pure lookup agrees with a linear-scan oracle for in-range input.
    #[test]
    fn active_index_matches_oracle(
        starts in prop::collection::vec(0u32..600, 1..12),
        offset in 0.0f32..700.0,
    ) {
        let mut starts = starts;
        starts.sort_unstable();
        starts.dedup();

        let text: String = starts
            .iter()
            .map(|s| format!("[{:02}:{:02}] line\n", s / 60, s % 60))
            .collect();
        let seq = parse(&text);
        let position = starts[0] as f32 + offset;

        let oracle = seq
            .iter()
            .rposition(|c| c.time <= position)
            .expect("position starts at the first cue");
        prop_assert_eq!(active_cue_index(&seq, position), Some(oracle));
    }
}
