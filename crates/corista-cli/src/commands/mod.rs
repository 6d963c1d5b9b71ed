//! Subcommand implementations.

pub mod devices;
pub mod lyrics;
pub mod play;
pub mod render;

use clap::Args;
use corista_core::EffectToggles;

/// Effect toggle flags shared by `play` and `render`.
///
/// The flags adjust a base snapshot (the config file's, or the defaults), so
/// `--distortion` alone keeps echo and reverb at their configured values.
#[derive(Args, Debug, Clone, Copy)]
pub struct EffectFlags {
    /// Disable the feedback echo
    #[arg(long)]
    pub no_echo: bool,

    /// Disable the convolution reverb
    #[arg(long)]
    pub no_reverb: bool,

    /// Enable soft-clip distortion
    #[arg(long)]
    pub distortion: bool,
}

impl EffectFlags {
    /// Applies the flags on top of `base`.
    pub fn apply(self, base: EffectToggles) -> EffectToggles {
        EffectToggles {
            echo: base.echo && !self.no_echo,
            reverb: base.reverb && !self.no_reverb,
            distortion: base.distortion || self.distortion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_layer_over_the_base_snapshot() {
        let flags = EffectFlags {
            no_echo: true,
            no_reverb: false,
            distortion: true,
        };
        let toggles = flags.apply(EffectToggles::default());
        assert!(!toggles.echo);
        assert!(toggles.reverb);
        assert!(toggles.distortion);
    }

    #[test]
    fn no_flags_keep_the_base() {
        let flags = EffectFlags {
            no_echo: false,
            no_reverb: false,
            distortion: false,
        };
        assert_eq!(flags.apply(EffectToggles::default()), EffectToggles::default());
    }
}
