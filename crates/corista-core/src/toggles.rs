//! Effect configuration snapshot.

/// Which voice effects are engaged.
///
/// An immutable snapshot: the controller compares a new snapshot against the
/// one the live graph was built with to decide whether a rebuild is needed.
/// Equality is the whole protocol — there are no partial updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EffectToggles {
    /// Feedback echo on the wet path.
    pub echo: bool,
    /// Convolution reverb on the wet path.
    pub reverb: bool,
    /// Soft-clip distortion ahead of the reverb.
    pub distortion: bool,
}

impl Default for EffectToggles {
    /// The stage default: echo and reverb on, distortion off.
    fn default() -> Self {
        Self {
            echo: true,
            reverb: true,
            distortion: false,
        }
    }
}

impl EffectToggles {
    /// All effects disabled; the graph passes the dry signal only.
    pub fn none() -> Self {
        Self {
            echo: false,
            reverb: false,
            distortion: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_stage_setup() {
        let t = EffectToggles::default();
        assert!(t.echo && t.reverb && !t.distortion);
    }

    #[test]
    fn snapshots_compare_by_value() {
        assert_eq!(EffectToggles::none(), EffectToggles::none());
        assert_ne!(EffectToggles::none(), EffectToggles::default());
    }
}
