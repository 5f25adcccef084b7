//! The built in two tone chime, written out as a wav file on first start.

use std::{
    f64::consts::PI,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
};

pub const SAMPLE_RATE: u32 = 44_100;
const TONES: [f64; 2] = [880.0, 1320.0];
const TONE_SECONDS: f64 = 0.25;
const GAP_SECONDS: f64 = 0.08;
const AMPLITUDE: f64 = 16_000.0;
const PASSES: usize = 2;

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn sample_count(seconds: f64) -> usize {
    (f64::from(SAMPLE_RATE) * seconds) as usize
}

/// mono samples of the chime, each tone fades out with a raised cosine
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn synthesize() -> Vec<i16> {
    let tone_len = sample_count(TONE_SECONDS);
    let gap_len = sample_count(GAP_SECONDS);
    let mut samples = Vec::with_capacity(PASSES * TONES.len() * (tone_len + gap_len));
    for _ in 0..PASSES {
        for freq in TONES {
            samples.extend((0..tone_len).map(|i| {
                let t = i as f64 / f64::from(SAMPLE_RATE);
                let envelope = 0.5f64.mul_add((PI * (t / TONE_SECONDS)).cos(), 0.5);
                let sample = AMPLITUDE * (2.0 * PI * freq * t).sin() * envelope;
                sample.trunc().clamp(-32767.0, 32767.0) as i16
            }));
            samples.extend(std::iter::repeat(0).take(gap_len));
        }
    }
    samples
}

/// writes 16 bit mono pcm in a RIFF/WAVE container
pub fn write_wav<W: Write>(mut out: W, samples: &[i16]) -> io::Result<()> {
    const CHANNELS: u16 = 1;
    const BITS: u16 = 16;
    let block_align = CHANNELS * BITS / 8;
    let byte_rate = SAMPLE_RATE * u32::from(block_align);
    let data_len = u32::try_from(samples.len() * usize::from(block_align))
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many samples for a wav"))?;

    out.write_all(b"RIFF")?;
    out.write_all(&(36 + data_len).to_le_bytes())?;
    out.write_all(b"WAVE")?;
    out.write_all(b"fmt ")?;
    out.write_all(&16u32.to_le_bytes())?;
    // pcm
    out.write_all(&1u16.to_le_bytes())?;
    out.write_all(&CHANNELS.to_le_bytes())?;
    out.write_all(&SAMPLE_RATE.to_le_bytes())?;
    out.write_all(&byte_rate.to_le_bytes())?;
    out.write_all(&block_align.to_le_bytes())?;
    out.write_all(&BITS.to_le_bytes())?;
    out.write_all(b"data")?;
    out.write_all(&data_len.to_le_bytes())?;
    for sample in samples {
        out.write_all(&sample.to_le_bytes())?;
    }
    out.flush()
}

/// writes the chime to `path` unless something is already there
///
/// returns whether a file was written
pub fn write_default_chime(path: &Path) -> io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_wav(BufWriter::new(File::create(path)?), &synthesize())?;
    Ok(true)
}
