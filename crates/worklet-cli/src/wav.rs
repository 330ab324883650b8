use std::path::Path;

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use worklet_rt::AudioBlock;

/// Decoded WAV file, one vector per channel.
#[derive(Debug, Clone)]
pub struct WavClip {
    pub sample_rate: u32,
    pub block: AudioBlock,
}

pub fn read_wav(path: &Path) -> Result<WavClip> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    let channel_count = spec.channels as usize;
    if channel_count == 0 {
        bail!("{} has no channels", path.display());
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("failed to decode {}", path.display()))?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 * scale))
                .collect::<Result<_, _>>()
                .with_context(|| format!("failed to decode {}", path.display()))?
        }
    };

    let mut channels = vec![Vec::with_capacity(interleaved.len() / channel_count); channel_count];
    for (index, sample) in interleaved.into_iter().enumerate() {
        channels[index % channel_count].push(sample);
    }

    Ok(WavClip {
        sample_rate: spec.sample_rate,
        block: AudioBlock::from_channels(channels),
    })
}

/// Writes `block` as 32-bit float WAV.
pub fn write_wav(path: &Path, sample_rate: u32, block: &AudioBlock) -> Result<()> {
    let spec = WavSpec {
        channels: block.num_channels() as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let channels = block.as_slice();
    for frame in 0..block.frames() {
        for channel in channels {
            writer.write_sample(channel.get(frame).copied().unwrap_or(0.0))?;
        }
    }
    writer.finalize()?;
    Ok(())
}
