//! Block layout and channel normalization.

use serde::{Deserialize, Serialize};

/// Frames per callback, fixed by the host scheduler.
pub const FRAMES_PER_BUFFER: usize = 128;

/// Channel counts seen by one block invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelShape {
    pub inputs: usize,
    pub outputs: usize,
}

impl ChannelShape {
    pub fn new(inputs: usize, outputs: usize) -> Self {
        Self { inputs, outputs }
    }

    /// At least one input channel and a stereo output pair.
    pub fn is_processable(&self) -> bool {
        self.inputs >= 1 && self.outputs >= 2
    }
}

/// Stereo pair handed to the engine after fold-up.
#[derive(Debug, Clone, Copy)]
pub struct StereoInput<'a> {
    pub left: &'a [f32],
    pub right: &'a [f32],
}

impl<'a> StereoInput<'a> {
    /// Shortest of the two channels.
    pub fn frames(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    /// True when the right channel is the left channel duplicated.
    pub fn is_folded(&self) -> bool {
        std::ptr::eq(self.left, self.right)
    }
}

/// Picks the stereo pair from the host inputs. A single channel is used for
/// both sides; channels past the second are ignored.
pub fn resolve_stereo<'a, C>(inputs: &'a [C]) -> Option<StereoInput<'a>>
where
    C: AsRef<[f32]>,
{
    let left = inputs.first()?.as_ref();
    let right = inputs.get(1).map_or(left, |channel| channel.as_ref());
    Some(StereoInput { left, right })
}

/// Owned, non-interleaved block of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlock {
    channels: Vec<Vec<f32>>,
}

impl AudioBlock {
    pub fn new(num_channels: usize, frames: usize) -> Self {
        Self {
            channels: vec![vec![0.0; frames]; num_channels],
        }
    }

    /// Block with the host's default frame count.
    pub fn with_channels(num_channels: usize) -> Self {
        Self::new(num_channels, FRAMES_PER_BUFFER)
    }

    pub fn from_channels(channels: Vec<Vec<f32>>) -> Self {
        Self { channels }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.channels
            .first()
            .map(|channel| channel.len())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    pub fn as_slice(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn as_mut_slice(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }
}
