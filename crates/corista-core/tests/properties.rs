//! Property-based tests for the DSP nodes and the compiled voice graph.

use proptest::prelude::*;

use corista_core::graph::{CompiledGraph, voice_topology};
use corista_core::{Effect, EchoDelay, EffectToggles, ImpulseBuffer, SoftShaper};

proptest! {
    /// The shaper never produces output outside [-1, 1] for any input,
    /// including out-of-range input.
    #[test]
    fn shaper_output_is_bounded(input in prop::collection::vec(-4.0f32..=4.0, 1..256)) {
        let mut shaper = SoftShaper::new();
        let mut left = input.clone();
        let mut right = input;
        shaper.process_block(&mut left, &mut right);
        for s in left.iter().chain(right.iter()) {
            prop_assert!(s.abs() <= 1.0 + 1e-4);
        }
    }

    /// The echo loop stays finite for any clamped feedback and bounded input.
    #[test]
    fn echo_is_stable(
        feedback in 0.0f32..=2.0,
        delay_ms in 1.0f32..50.0,
        input in prop::collection::vec(-1.0f32..=1.0, 64..512),
    ) {
        let mut echo = EchoDelay::new(8000.0, delay_ms / 1000.0, feedback);
        let mut left = input.clone();
        let mut right = input;
        for _ in 0..8 {
            echo.process_block(&mut left, &mut right);
        }
        for s in left.iter().chain(right.iter()) {
            prop_assert!(s.is_finite());
        }
    }

    /// Impulse buffers respect the analytic envelope bound everywhere, not
    /// just at the endpoints.
    #[test]
    fn impulse_respects_envelope(seed in 1u32.., decay in 0.5f32..6.0) {
        let ir = ImpulseBuffer::decaying_noise(4000.0, 0.25, decay, seed);
        let len = ir.len() as f32;
        for (i, s) in ir.left().iter().enumerate() {
            let bound = (1.0 - i as f32 / len).powf(decay);
            prop_assert!(s.abs() <= bound + 1e-5,
                "sample {} = {} exceeds envelope {}", i, s, bound);
        }
    }

    /// The compiled voice graph yields finite output for random input under
    /// every toggle combination.
    #[test]
    fn voice_graph_is_stable(
        bits in 0u8..8,
        input in prop::collection::vec(-1.0f32..=1.0, 64),
    ) {
        let toggles = EffectToggles {
            echo: bits & 1 != 0,
            reverb: bits & 2 != 0,
            distortion: bits & 4 != 0,
        };
        let mut graph = CompiledGraph::compile(&voice_topology(toggles), 4000.0, 64, 9)
            .expect("fixed topology always compiles");

        let mut out_l = vec![0.0; 64];
        let mut out_r = vec![0.0; 64];
        for _ in 0..3 {
            graph.process_block(&input, &input, &mut out_l, &mut out_r);
        }
        for s in out_l.iter().chain(out_r.iter()) {
            prop_assert!(s.is_finite());
        }
    }
}
