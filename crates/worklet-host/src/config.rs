use serde::{Deserialize, Serialize};
use worklet_engine::SampleRateRange;
use worklet_rt::FRAMES_PER_BUFFER;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkletConfig {
    /// Frames per engine call.
    pub block_size: usize,
    pub parameter_queue_capacity: usize,
    pub sample_rates: SampleRateRange,
}

impl Default for WorkletConfig {
    fn default() -> Self {
        Self {
            block_size: FRAMES_PER_BUFFER,
            parameter_queue_capacity: 1024,
            sample_rates: SampleRateRange::default(),
        }
    }
}

impl WorkletConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn with_block_size(mut self, frames: usize) -> Self {
        self.block_size = frames;
        self
    }

    pub fn with_parameter_queue_capacity(mut self, capacity: usize) -> Self {
        self.parameter_queue_capacity = capacity;
        self
    }

    pub fn with_sample_rates(mut self, min: u32, max: u32) -> Self {
        self.sample_rates = SampleRateRange { min, max };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_fields_keep_defaults() {
        let config = WorkletConfig::from_json(r#"{"parameter_queue_capacity": 16}"#).unwrap();
        assert_eq!(
            config,
            WorkletConfig::default().with_parameter_queue_capacity(16)
        );
    }

    #[test]
    fn sample_rate_window_round_trips_through_json() {
        let config = WorkletConfig::default().with_sample_rates(22_050, 96_000);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(WorkletConfig::from_json(&json).unwrap(), config);
    }
}
