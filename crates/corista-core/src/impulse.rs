//! Synthetic impulse responses for the convolution reverb.

use crate::noise::NoiseSource;

/// An immutable two-channel impulse response.
///
/// Owned by exactly one graph instance and regenerated on every build — the
/// noise content is randomized, so there is nothing to cache across rebuilds.
#[derive(Debug, Clone)]
pub struct ImpulseBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
    sample_rate: f32,
}

impl ImpulseBuffer {
    /// Synthesizes a decaying-noise kernel.
    ///
    /// `len = round(sample_rate * duration_secs)`; each channel is filled
    /// independently with `uniform(-1, 1) * (1 - i/len)^decay`. The envelope
    /// is deterministic, the content is not — tests should check length and
    /// envelope bounds, never exact samples.
    pub fn decaying_noise(sample_rate: f32, duration_secs: f32, decay: f32, seed: u32) -> Self {
        let len = (sample_rate * duration_secs).round() as usize;
        let mut rng = NoiseSource::new(seed);
        let mut channel = |rng: &mut NoiseSource| -> Vec<f32> {
            (0..len)
                .map(|i| {
                    let envelope = (1.0 - i as f32 / len as f32).powf(decay);
                    rng.next_bipolar() * envelope
                })
                .collect()
        };
        let left = channel(&mut rng);
        let mut right_rng = rng.split();
        let right = channel(&mut right_rng);
        Self {
            left,
            right,
            sample_rate,
        }
    }

    /// Builds a buffer from explicit channel data. The channels must be the
    /// same length; used by tests and offline tools.
    pub fn from_channels(left: Vec<f32>, right: Vec<f32>, sample_rate: f32) -> Self {
        assert_eq!(left.len(), right.len(), "channel lengths must match");
        Self {
            left,
            right,
            sample_rate,
        }
    }

    /// Kernel length in samples (per channel).
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Whether the kernel is empty.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Left-channel samples.
    pub fn left(&self) -> &[f32] {
        &self.left
    }

    /// Right-channel samples.
    pub fn right(&self) -> &[f32] {
        &self.right
    }

    /// Sample rate the kernel was generated for.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_rounded_rate_times_duration() {
        let ir = ImpulseBuffer::decaying_noise(44100.0, 1.6, 2.8, 1);
        assert_eq!(ir.len(), (44100.0f32 * 1.6).round() as usize);
        assert_eq!(ir.left().len(), ir.right().len());
    }

    #[test]
    fn first_sample_is_within_unit_range() {
        let ir = ImpulseBuffer::decaying_noise(48000.0, 0.5, 2.0, 2);
        assert!(ir.left()[0].abs() <= 1.0);
        assert!(ir.right()[0].abs() <= 1.0);
    }

    #[test]
    fn envelope_bound_decays_to_the_end() {
        let ir = ImpulseBuffer::decaying_noise(8000.0, 0.25, 2.8, 3);
        let len = ir.len();
        // The bound at the last index is (1 - (len-1)/len)^decay, far below
        // the bound of 1.0 at index 0.
        let final_bound = (1.0 - (len - 1) as f32 / len as f32).powf(2.8);
        assert!(final_bound < 1.0);
        assert!(ir.left()[len - 1].abs() <= final_bound + 1e-6);
        assert!(ir.right()[len - 1].abs() <= final_bound + 1e-6);
    }

    #[test]
    fn channels_are_independent() {
        let ir = ImpulseBuffer::decaying_noise(8000.0, 0.1, 1.0, 9);
        assert_ne!(ir.left(), ir.right());
    }

    #[test]
    fn different_seeds_differ() {
        let a = ImpulseBuffer::decaying_noise(8000.0, 0.1, 1.0, 1);
        let b = ImpulseBuffer::decaying_noise(8000.0, 0.1, 1.0, 2);
        assert_ne!(a.left(), b.left());
    }
}
