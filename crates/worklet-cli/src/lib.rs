//! Offline host: feeds WAV files through a worklet engine the same way an
//! audio callback would, 128 frames at a time.

pub mod render;
pub mod wav;

pub use render::{check, parse_update, render, EngineSource, RenderJob, RenderReport};
pub use wav::{read_wav, write_wav, WavClip};
