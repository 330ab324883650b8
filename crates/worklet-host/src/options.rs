use std::sync::Arc;

use worklet_codec::TextCodec;

/// Construction inputs handed over by the host when it creates an instance.
pub struct WorkletOptions {
    pub binary_module_payload: Arc<[u8]>,
    pub bootstrap_script: String,
    pub sample_rate: u32,
    pub(crate) host_codec: Option<Box<dyn TextCodec>>,
}

impl WorkletOptions {
    pub fn new(
        binary_module_payload: impl Into<Arc<[u8]>>,
        bootstrap_script: impl Into<String>,
        sample_rate: u32,
    ) -> Self {
        Self {
            binary_module_payload: binary_module_payload.into(),
            bootstrap_script: bootstrap_script.into(),
            sample_rate,
            host_codec: None,
        }
    }

    /// Offers the host's own text codec. It is only used if it passes the
    /// probe and no codec has been installed in this process yet.
    pub fn with_host_codec(mut self, codec: impl TextCodec) -> Self {
        self.host_codec = Some(Box::new(codec));
        self
    }
}

impl std::fmt::Debug for WorkletOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkletOptions")
            .field("payload_bytes", &self.binary_module_payload.len())
            .field("bootstrap_script_bytes", &self.bootstrap_script.len())
            .field("sample_rate", &self.sample_rate)
            .field(
                "host_codec",
                &self.host_codec.as_ref().map(|codec| codec.name()),
            )
            .finish()
    }
}
