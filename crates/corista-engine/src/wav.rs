//! WAV file reading and writing via hound.

use std::path::Path;

use crate::Result;

/// Reads a WAV file as stereo `f32` channels plus the sample rate.
///
/// Mono files are duplicated to both channels; extra channels beyond the
/// first two are dropped. Integer formats are normalized to `[-1, 1]`.
pub fn read_wav_stereo(path: &Path) -> Result<(Vec<f32>, Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let frames = interleaved.len() / channels;
    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);
    for frame in interleaved.chunks_exact(channels) {
        left.push(frame[0]);
        right.push(if channels > 1 { frame[1] } else { frame[0] });
    }
    Ok((left, right, spec.sample_rate))
}

/// Writes stereo `f32` channels as a 32-bit float WAV file.
pub fn write_wav_stereo(path: &Path, left: &[f32], right: &[f32], sample_rate: u32) -> Result<()> {
    debug_assert_eq!(left.len(), right.len());
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for (l, r) in left.iter().zip(right.iter()) {
        writer.write_sample(*l)?;
        writer.write_sample(*r)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.wav");

        let left: Vec<f32> = (0..64).map(|i| (i as f32 * 0.2).sin()).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        write_wav_stereo(&path, &left, &right, 8000).unwrap();

        let (l, r, rate) = read_wav_stereo(&path).unwrap();
        assert_eq!(rate, 8000);
        assert_eq!(l.len(), 64);
        for (a, b) in l.iter().zip(left.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
        for (a, b) in r.iter().zip(right.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn mono_int_is_duplicated_and_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(i16::MAX).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.write_sample(i16::MIN).unwrap();
        writer.finalize().unwrap();

        let (l, r, _) = read_wav_stereo(&path).unwrap();
        assert_eq!(l.len(), 3);
        assert_eq!(l, r, "mono input should appear on both channels");
        assert!((l[0] - 1.0).abs() < 1e-3);
        assert_eq!(l[1], 0.0);
        assert!((l[2] + 1.0).abs() < 1e-3);
    }
}
