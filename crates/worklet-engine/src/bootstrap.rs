use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{BootstrapError, Engine, EngineLoader};

/// Inclusive window of sample rates an engine may be created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRateRange {
    pub min: u32,
    pub max: u32,
}

impl Default for SampleRateRange {
    fn default() -> Self {
        Self {
            min: 8_000,
            max: 384_000,
        }
    }
}

impl SampleRateRange {
    pub fn contains(&self, sample_rate: u32) -> bool {
        sample_rate > 0 && (self.min..=self.max).contains(&sample_rate)
    }

    pub fn check(&self, sample_rate: u32) -> Result<(), BootstrapError> {
        if self.contains(sample_rate) {
            Ok(())
        } else {
            Err(BootstrapError::UnsupportedSampleRate {
                sample_rate,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Validates the sample rate and runs `loader` once.
pub fn bootstrap(
    loader: &dyn EngineLoader,
    sample_rate: u32,
    supported: SampleRateRange,
) -> Result<Box<dyn Engine>, BootstrapError> {
    supported.check(sample_rate)?;

    let started = Instant::now();
    match loader.load(sample_rate) {
        Ok(engine) => {
            debug!(
                loader = loader.name(),
                sample_rate,
                elapsed_us = started.elapsed().as_micros() as u64,
                "engine bootstrapped"
            );
            Ok(engine)
        }
        Err(err) => {
            warn!(loader = loader.name(), sample_rate, %err, "engine bootstrap failed");
            Err(err)
        }
    }
}
