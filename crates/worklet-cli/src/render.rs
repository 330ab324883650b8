use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info};
use worklet_host::{
    worklet_channels, BridgeSnapshot, WorkletConfig, WorkletOptions, WorkletProcessor,
};
use worklet_rt::{AudioBlock, OutgoingMessage, ParameterUpdate, FRAMES_PER_BUFFER};

use crate::wav::{read_wav, write_wav};

/// Parses `id=value`, as accepted by `--set`.
pub fn parse_update(text: &str) -> Result<ParameterUpdate, String> {
    let (id, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{text}'"))?;
    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid parameter id '{id}': {err}"))?;
    let value = value
        .trim()
        .parse::<f32>()
        .map_err(|err| format!("invalid parameter value '{value}': {err}"))?;
    Ok(ParameterUpdate::new(id, value))
}

/// Engine payload and the settings it runs with.
#[derive(Debug, Clone)]
pub struct EngineSource {
    pub payload: PathBuf,
    pub script: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl EngineSource {
    pub fn load_config(&self) -> Result<WorkletConfig> {
        let Some(path) = &self.config else {
            return Ok(WorkletConfig::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        WorkletConfig::from_json(&text)
            .with_context(|| format!("{} is not a valid worklet config", path.display()))
    }

    pub fn options(&self, sample_rate: u32) -> Result<WorkletOptions> {
        let payload = fs::read(&self.payload).with_context(|| {
            format!("failed to read engine payload {}", self.payload.display())
        })?;
        let script = match &self.script {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read bootstrap script {}", path.display()))?,
            None => String::new(),
        };
        Ok(WorkletOptions::new(payload, script, sample_rate))
    }
}

#[derive(Debug, Clone)]
pub struct RenderJob {
    pub engine: EngineSource,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Engine messages are written here, one per line, when set.
    pub messages: Option<PathBuf>,
    pub updates: Vec<ParameterUpdate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    pub sample_rate: u32,
    pub frames: usize,
    pub blocks: usize,
    pub messages: usize,
    pub stats: BridgeSnapshot,
}

/// Runs the engine over the input file block by block on a dedicated audio
/// thread while the calling thread plays the controller.
pub fn render(job: &RenderJob) -> Result<RenderReport> {
    let clip = read_wav(&job.input)?;
    let config = job.engine.load_config()?;
    let options = job.engine.options(clip.sample_rate)?;

    let (controller, endpoint) = worklet_channels(&config);
    let processor = WorkletProcessor::new(options, &config, endpoint);
    if let Some(err) = processor.bootstrap_error() {
        bail!("engine failed to bootstrap: {err}");
    }

    let sample_rate = processor.sample_rate();
    for update in &job.updates {
        controller
            .send(*update)
            .with_context(|| format!("failed to queue parameter {}", update.id))?;
    }

    let input = &clip.block;
    let (output, blocks, messages) = thread::scope(|scope| {
        let audio = scope.spawn(move || run_blocks(processor, input));
        // Ends once the processor, and with it the message sender, is dropped.
        let messages: Vec<OutgoingMessage> = controller.messages().iter().collect();
        audio
            .join()
            .map(|(output, blocks)| (output, blocks, messages))
            .map_err(|_| anyhow!("audio thread panicked"))
    })?;

    write_wav(&job.output, sample_rate, &output)?;
    if let Some(path) = &job.messages {
        write_messages(path, &messages)?;
    }

    let report = RenderReport {
        sample_rate,
        frames: output.frames(),
        blocks,
        messages: messages.len(),
        stats: controller.stats(),
    };
    info!(
        frames = report.frames,
        blocks = report.blocks,
        messages = report.messages,
        "render finished"
    );
    Ok(report)
}

fn run_blocks(mut processor: WorkletProcessor, input: &AudioBlock) -> (AudioBlock, usize) {
    let frames = input.frames();
    let mut output = AudioBlock::new(2, frames);
    let mut scratch = AudioBlock::with_channels(2);
    let mut blocks = 0;

    let mut start = 0;
    while start < frames {
        let end = (start + FRAMES_PER_BUFFER).min(frames);
        let channels: Vec<&[f32]> = input
            .as_slice()
            .iter()
            .map(|channel| &channel[start..end])
            .collect();

        scratch.clear();
        let status = processor.process(&channels, scratch.as_mut_slice());
        if !status.is_processed() {
            debug!(?status, start, "block not processed");
        }

        for (target, source) in output.as_mut_slice().iter_mut().zip(scratch.as_slice()) {
            target[start..end].copy_from_slice(&source[..end - start]);
        }
        blocks += 1;
        start = end;
    }
    (output, blocks)
}

fn write_messages(path: &Path, messages: &[OutgoingMessage]) -> Result<()> {
    let codec = worklet_codec::codec();
    let mut text = String::new();
    for message in messages {
        text.push_str(&codec.decode(message.as_bytes()));
        text.push('\n');
    }
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// Bootstraps the engine once and reports whether it came up.
pub fn check(engine: &EngineSource, sample_rate: u32) -> Result<()> {
    let config = engine.load_config()?;
    let (_controller, endpoint) = worklet_channels(&config);
    let processor = WorkletProcessor::new(engine.options(sample_rate)?, &config, endpoint);
    match processor.bootstrap_error() {
        None => Ok(()),
        Some(err) => bail!("engine failed to bootstrap at {sample_rate} Hz: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_parameter_assignments() {
        assert_eq!(parse_update("3=0.5"), Ok(ParameterUpdate::new(3, 0.5)));
        assert_eq!(parse_update(" 0 = -1 "), Ok(ParameterUpdate::new(0, -1.0)));
    }

    #[test]
    fn rejects_malformed_assignments() {
        assert!(parse_update("gain").is_err());
        assert!(parse_update("-1=0.5").is_err());
        assert!(parse_update("1=loud").is_err());
    }
}
