//! Convolution reverb via uniformly partitioned FFT convolution.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::effect::Effect;
use crate::impulse::ImpulseBuffer;

/// Per-channel convolution state.
struct ChannelState {
    /// FFT of each impulse-response partition, newest-relevant first.
    partitions: Vec<Vec<Complex<f32>>>,
    /// Frequency-domain delay line: spectra of recent input blocks,
    /// most recent at the front.
    history: VecDeque<Vec<Complex<f32>>>,
    /// Overlap tail carried into the next block.
    overlap: Vec<f32>,
    /// Input samples waiting for a full partition (chunked path only).
    in_fifo: Vec<f32>,
    /// Output samples produced but not yet consumed (chunked path only).
    out_fifo: VecDeque<f32>,
}

impl ChannelState {
    fn new(kernel: &[f32], block: usize, fft: &Arc<dyn Fft<f32>>) -> Self {
        let fft_len = 2 * block;
        let partitions = kernel
            .chunks(block)
            .map(|chunk| {
                let mut buf = vec![Complex::new(0.0, 0.0); fft_len];
                for (slot, &s) in buf.iter_mut().zip(chunk.iter()) {
                    *slot = Complex::new(s, 0.0);
                }
                fft.process(&mut buf);
                buf
            })
            .collect::<Vec<_>>();
        Self {
            partitions,
            history: VecDeque::new(),
            overlap: vec![0.0; block],
            in_fifo: Vec::with_capacity(block),
            out_fifo: VecDeque::new(),
        }
    }

    fn clear(&mut self) {
        self.history.clear();
        self.overlap.fill(0.0);
        self.in_fifo.clear();
        self.out_fifo.clear();
    }
}

/// FIR convolution against a fixed [`ImpulseBuffer`], one kernel channel per
/// output channel.
///
/// The kernel is split into equal partitions; each incoming block is
/// transformed once and multiplied against every partition spectrum
/// (a frequency-domain delay line), so cost grows with kernel length but
/// stays flat per sample. When callers feed blocks of exactly the partition
/// size — the graph executor does — the convolver adds no latency; other
/// block sizes are chunked internally at the cost of one partition of delay.
pub struct Convolver {
    block: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    left: ChannelState,
    right: ChannelState,
    scratch: Vec<Complex<f32>>,
    acc: Vec<Complex<f32>>,
}

impl Convolver {
    /// Builds a convolver for `impulse`, partitioned at `block` samples.
    pub fn new(impulse: &ImpulseBuffer, block: usize) -> Self {
        assert!(block > 0, "partition size must be non-zero");
        let fft_len = 2 * block;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_len);
        let ifft = planner.plan_fft_inverse(fft_len);
        Self {
            block,
            left: ChannelState::new(impulse.left(), block, &fft),
            right: ChannelState::new(impulse.right(), block, &fft),
            scratch: vec![Complex::new(0.0, 0.0); fft_len],
            acc: vec![Complex::new(0.0, 0.0); fft_len],
            fft,
            ifft,
        }
    }

    /// Partition size in samples.
    pub fn partition_len(&self) -> usize {
        self.block
    }

    /// Convolves exactly one partition-sized chunk for one channel, writing
    /// the result over `samples`.
    fn process_chunk(
        fft: &Arc<dyn Fft<f32>>,
        ifft: &Arc<dyn Fft<f32>>,
        scratch: &mut [Complex<f32>],
        acc: &mut [Complex<f32>],
        state: &mut ChannelState,
        samples: &mut [f32],
    ) {
        let block = samples.len();
        let fft_len = scratch.len();

        // Forward transform of the zero-padded input block.
        for slot in scratch.iter_mut() {
            *slot = Complex::new(0.0, 0.0);
        }
        for (slot, &s) in scratch.iter_mut().zip(samples.iter()) {
            *slot = Complex::new(s, 0.0);
        }
        fft.process(scratch);

        // Recycle the oldest history buffer once the delay line is full, so
        // steady-state processing does not allocate.
        let mut spectrum = if state.history.len() >= state.partitions.len() {
            state.history.pop_back().unwrap_or_default()
        } else {
            Vec::new()
        };
        spectrum.clear();
        spectrum.extend_from_slice(scratch);
        state.history.push_front(spectrum);

        // Multiply-accumulate across the frequency-domain delay line.
        for slot in acc.iter_mut() {
            *slot = Complex::new(0.0, 0.0);
        }
        for (spectrum, partition) in state.history.iter().zip(state.partitions.iter()) {
            for ((a, x), h) in acc.iter_mut().zip(spectrum.iter()).zip(partition.iter()) {
                *a += x * h;
            }
        }

        ifft.process(acc);
        let scale = 1.0 / fft_len as f32;

        // First half: fresh output plus the previous block's tail.
        for (i, sample) in samples.iter_mut().enumerate() {
            *sample = acc[i].re * scale + state.overlap[i];
        }
        // Second half becomes the next block's tail.
        for (i, tail) in state.overlap.iter_mut().enumerate() {
            *tail = acc[block + i].re * scale;
        }
    }

    fn process_channel(
        fft: &Arc<dyn Fft<f32>>,
        ifft: &Arc<dyn Fft<f32>>,
        scratch: &mut [Complex<f32>],
        acc: &mut [Complex<f32>],
        state: &mut ChannelState,
        block: usize,
        samples: &mut [f32],
    ) {
        if state.partitions.is_empty() {
            // Empty kernel convolves to silence.
            samples.fill(0.0);
            return;
        }

        // Fast path: exact partition-sized blocks with no chunking backlog.
        if samples.len() == block && state.in_fifo.is_empty() && state.out_fifo.is_empty() {
            Self::process_chunk(fft, ifft, scratch, acc, state, samples);
            return;
        }

        // Chunked path: one partition of latency, arbitrary block lengths.
        if state.out_fifo.is_empty() {
            state.out_fifo.extend(std::iter::repeat_n(0.0, block));
        }
        let mut chunk = vec![0.0f32; block];
        for sample in samples.iter_mut() {
            state.in_fifo.push(*sample);
            if state.in_fifo.len() == block {
                chunk.copy_from_slice(&state.in_fifo);
                state.in_fifo.clear();
                Self::process_chunk(fft, ifft, scratch, acc, state, &mut chunk);
                state.out_fifo.extend(chunk.iter().copied());
            }
            *sample = state.out_fifo.pop_front().unwrap_or(0.0);
        }
    }
}

impl Effect for Convolver {
    fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        Self::process_channel(
            &self.fft,
            &self.ifft,
            &mut self.scratch,
            &mut self.acc,
            &mut self.left,
            self.block,
            left,
        );
        Self::process_channel(
            &self.fft,
            &self.ifft,
            &mut self.scratch,
            &mut self.acc,
            &mut self.right,
            self.block,
            right,
        );
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {
        // The kernel is generated for the build's sample rate; a rate change
        // rebuilds the graph and with it this node.
    }

    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }
}
