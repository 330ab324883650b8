use thiserror::Error;

/// Reasons an engine never becomes available.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("sample rate {sample_rate} Hz is outside the supported range {min}..={max} Hz")]
    UnsupportedSampleRate { sample_rate: u32, min: u32, max: u32 },
    #[error("bootstrap script is not a valid linkage descriptor: {0}")]
    InvalidScript(#[from] serde_json::Error),
    #[error("failed to compile engine payload: {0}")]
    Compile(String),
    #[error("failed to link engine module: {0}")]
    Link(String),
    #[error("engine export `{name}` unavailable: {reason}")]
    MissingExport { name: String, reason: String },
    #[error("engine refused to construct a processor at {sample_rate} Hz")]
    ConstructorRefused { sample_rate: u32 },
    #[error("engine buffer at {ptr:#x} ({frames} frames) lies outside engine memory")]
    BufferOutOfBounds { ptr: u32, frames: usize },
    #[error("engine trapped during bootstrap: {0}")]
    Trap(String),
}

/// Failure inside a running engine. The engine stays usable for later calls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineFault {
    #[error("engine trapped: {0}")]
    Trap(String),
    #[error("engine transfer buffer lies outside engine memory")]
    OutOfBounds,
}
