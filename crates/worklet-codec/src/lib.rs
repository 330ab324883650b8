//! Text encode/decode primitives for the audio callback scope.
//!
//! The engine loader decodes text out of engine memory, but the scope it runs
//! in is not guaranteed to carry a working codec. [`install`] probes the codec
//! offered by the host and backfills [`FallbackCodec`] when none is offered or
//! the offered one does not round-trip. Installation happens once per process.

mod fallback;
mod install;

pub use fallback::{FallbackCodec, REPLACEMENT_CHARACTER};
pub use install::{codec, install, installed, CodecSlot, Installation, InstallSource};

/// Encode/decode pair used by everything that moves text across the engine
/// boundary.
pub trait TextCodec: Send + Sync + 'static {
    /// Short identifier used in diagnostics.
    fn name(&self) -> &'static str;

    /// Encodes `text` as UTF-8.
    fn encode(&self, text: &str) -> Vec<u8>;

    /// Decodes UTF-8 bytes. Must never panic on malformed input.
    fn decode(&self, bytes: &[u8]) -> String;
}

/// Conformant codec backed by the standard library, for hosts with full text
/// support.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdCodec;

impl TextCodec for StdCodec {
    fn name(&self) -> &'static str {
        "std"
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        text.as_bytes().to_vec()
    }

    fn decode(&self, bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
