//! Offline rendering of the voice chain over a WAV file.
//!
//! Exercises the same graph the live mic runs, with the input file standing
//! in for the capture stream. Useful for auditioning effect settings without
//! a microphone and for end-to-end checks in CI.

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use corista_core::graph::{CompiledGraph, REVERB_DURATION_SECS, voice_topology};
use corista_engine::{read_wav_stereo, write_wav_stereo};

use super::EffectFlags;

#[derive(Args)]
pub struct RenderArgs {
    /// Input WAV file
    input: PathBuf,

    /// Output WAV file
    output: PathBuf,

    #[command(flatten)]
    effects: EffectFlags,

    /// Processing block size in frames
    #[arg(long, default_value = "256")]
    block_size: usize,

    /// Kernel seed (random content is reproducible for a fixed seed)
    #[arg(long, default_value = "1")]
    seed: u32,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let (left, right, sample_rate) = read_wav_stereo(&args.input)?;
    let toggles = args.effects.apply(corista_core::EffectToggles::default());
    let spec = voice_topology(toggles);
    let mut graph = CompiledGraph::compile(&spec, sample_rate as f32, args.block_size, args.seed)?;

    // Keep rendering silence after the input ends so the reverb tail lands
    // in the file.
    let tail_frames = (REVERB_DURATION_SECS * sample_rate as f32).round() as usize;
    let total_frames = left.len() + tail_frames;

    println!(
        "Rendering {} ({} frames at {} Hz, {:?})",
        args.input.display(),
        left.len(),
        sample_rate,
        toggles
    );
    let pb = ProgressBar::new(total_frames as u64);
    pb.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} frames ({eta})")
            .expect("static template"),
    );

    let block = args.block_size;
    let mut out_left = Vec::with_capacity(total_frames);
    let mut out_right = Vec::with_capacity(total_frames);
    let mut in_l = vec![0.0f32; block];
    let mut in_r = vec![0.0f32; block];
    let mut out_l = vec![0.0f32; block];
    let mut out_r = vec![0.0f32; block];

    let mut cursor = 0usize;
    while cursor < total_frames {
        let take = block.min(total_frames - cursor);
        for i in 0..block {
            let idx = cursor + i;
            in_l[i] = if idx < left.len() { left[idx] } else { 0.0 };
            in_r[i] = if idx < right.len() { right[idx] } else { 0.0 };
        }
        graph.process_block(&in_l, &in_r, &mut out_l, &mut out_r);
        out_left.extend_from_slice(&out_l[..take]);
        out_right.extend_from_slice(&out_r[..take]);
        cursor += take;
        pb.set_position(cursor as u64);
    }
    pb.finish_and_clear();

    write_wav_stereo(&args.output, &out_left, &out_right, sample_rate)?;
    println!("Wrote {} ({} frames)", args.output.display(), out_left.len());
    Ok(())
}
