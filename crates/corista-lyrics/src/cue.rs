//! Cue model and the LRC-style lyric parser.

use serde::{Deserialize, Serialize};

/// Synthetic spacing applied to lines that carry no timestamp.
///
/// Untimed lines are placed this many seconds after the previous line so
/// plain text (titles, section markers, pasted prose) still scrolls.
const UNTIMED_SPACING_SECS: f32 = 2.5;

/// One lyric line paired with its start time in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Start time in seconds from the beginning of the track.
    pub time: f32,
    /// Display text (may be empty for instrumental markers like `[01:30]`).
    pub text: String,
}

/// An ordered, immutable sequence of cues.
///
/// Sorted ascending by time at construction; ties keep their original
/// relative order (stable sort). A sequence is never mutated in place —
/// re-parsing produces a fresh sequence that replaces the old one wholesale,
/// typically behind an `Arc` so in-flight readers keep a consistent view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CueSequence {
    cues: Vec<Cue>,
}

impl CueSequence {
    /// Number of cues.
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the sequence holds no cues.
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Cue at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }

    /// Iterator over cues in time order.
    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    /// The cues as a slice.
    pub fn as_slice(&self) -> &[Cue] {
        &self.cues
    }
}

impl<'a> IntoIterator for &'a CueSequence {
    type Item = &'a Cue;
    type IntoIter = std::slice::Iter<'a, Cue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}

/// Parses raw lyric text into a [`CueSequence`].
///
/// Total over arbitrary input: every non-empty line becomes a cue and no
/// input can make this fail. Lines matching `[mm:ss]text` or `[mm:ss.cc]text`
/// get `time = mm*60 + ss + cc/100`; anything else is kept as an untimed line
/// and assigned `previous resolved time + 2.5 s`.
///
/// A single fractional digit is read as hundredths, not tenths: `[00:01.5]`
/// is 1.05 s. That matches the lyric files this player grew up with; see
/// DESIGN.md for the tradeoff.
pub fn parse(text: &str) -> CueSequence {
    let mut cues: Vec<Cue> = Vec::new();
    let mut last_time = 0.0f32;

    for line in text.lines().filter(|l| !l.is_empty()) {
        match parse_timed_line(line) {
            Some((time, rest)) => {
                last_time = time;
                cues.push(Cue {
                    time,
                    text: rest.to_string(),
                });
            }
            None => {
                last_time += UNTIMED_SPACING_SECS;
                cues.push(Cue {
                    time: last_time,
                    text: line.trim().to_string(),
                });
            }
        }
    }

    // total_cmp keeps the sort stable and total; parsed times are never NaN.
    cues.sort_by(|a, b| a.time.total_cmp(&b.time));
    tracing::debug!("parsed {} cues", cues.len());
    CueSequence { cues }
}

/// Matches `[mm:ss]` or `[mm:ss.cc]` (1-2 digits per field) after optional
/// leading whitespace. Returns the resolved time and the trailing text with
/// leading whitespace stripped.
fn parse_timed_line(line: &str) -> Option<(f32, &str)> {
    let rest = line.trim_start();
    let rest = rest.strip_prefix('[')?;

    let (minutes, rest) = take_digits(rest)?;
    let rest = rest.strip_prefix(':')?;
    let (seconds, rest) = take_digits(rest)?;

    let (centis, rest) = match rest.strip_prefix('.') {
        Some(after_dot) => take_digits(after_dot)?,
        None => (0, rest),
    };

    let rest = rest.strip_prefix(']')?;
    let time = minutes as f32 * 60.0 + seconds as f32 + centis as f32 / 100.0;
    Some((time, rest.trim_start()))
}

/// Consumes one or two ASCII digits; more than two is a non-match.
fn take_digits(input: &str) -> Option<(u32, &str)> {
    let digits: &str = {
        let end = input
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map_or(input.len(), |(i, _)| i);
        &input[..end]
    };
    if digits.is_empty() || digits.len() > 2 {
        return None;
    }
    // one or two ASCII digits always fit u32
    let value = digits.parse::<u32>().ok()?;
    Some((value, &input[digits.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_lines_sort_ascending() {
        let seq = parse("[00:04.00] A\n[00:02.00] B\n");
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.get(0).unwrap().time, 2.0);
        assert_eq!(seq.get(0).unwrap().text, "B");
        assert_eq!(seq.get(1).unwrap().time, 4.0);
        assert_eq!(seq.get(1).unwrap().text, "A");
    }

    #[test]
    fn untimed_lines_get_synthetic_spacing() {
        let seq = parse("A\nB\nC");
        let times: Vec<f32> = seq.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![2.5, 5.0, 7.5]);
    }

    #[test]
    fn untimed_after_timed_continues_from_resolved_time() {
        let seq = parse("[00:10] sung line\nspoken line");
        assert_eq!(seq.get(0).unwrap().time, 10.0);
        assert_eq!(seq.get(1).unwrap().time, 12.5);
    }

    #[test]
    fn fraction_is_hundredths_even_with_one_digit() {
        let seq = parse("[00:01.5] x");
        assert!((seq.get(0).unwrap().time - 1.05).abs() < 1e-6);
    }

    #[test]
    fn two_digit_fraction() {
        let seq = parse("[01:30.25] chorus");
        assert!((seq.get(0).unwrap().time - 90.25).abs() < 1e-4);
    }

    #[test]
    fn empty_input_is_empty_sequence() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn blank_lines_are_dropped() {
        let seq = parse("[00:01] a\n\n\n[00:02] b\n");
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn timestamp_without_text_keeps_empty_text() {
        let seq = parse("[00:05]");
        assert_eq!(seq.get(0).unwrap().text, "");
        assert_eq!(seq.get(0).unwrap().time, 5.0);
    }

    #[test]
    fn leading_whitespace_before_timestamp_is_ok() {
        let seq = parse("   [00:03] indented");
        assert_eq!(seq.get(0).unwrap().time, 3.0);
        assert_eq!(seq.get(0).unwrap().text, "indented");
    }

    #[test]
    fn three_digit_minutes_is_untimed() {
        let seq = parse("[100:00] nope");
        // Falls back to the untimed path: trimmed line text, synthetic time.
        assert_eq!(seq.get(0).unwrap().time, 2.5);
        assert_eq!(seq.get(0).unwrap().text, "[100:00] nope");
    }

    #[test]
    fn malformed_bracket_is_untimed() {
        let seq = parse("[ab:cd] not a time");
        assert_eq!(seq.get(0).unwrap().time, 2.5);
    }

    #[test]
    fn equal_times_preserve_input_order() {
        let seq = parse("[00:05] first\n[00:05] second");
        assert_eq!(seq.get(0).unwrap().text, "first");
        assert_eq!(seq.get(1).unwrap().text, "second");
    }

    #[test]
    fn parse_is_idempotent() {
        let text = "[00:04] A\nplain\n[00:02] B";
        assert_eq!(parse(text), parse(text));
    }
}
