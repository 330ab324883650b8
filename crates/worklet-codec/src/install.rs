use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::{FallbackCodec, TextCodec};

/// Sample covering every UTF-8 length class, including a code point outside
/// the basic multilingual plane.
const PROBE_TEXT: &str = "a\u{e9}\u{20ac}\u{1F3B5}";

static GLOBAL: CodecSlot = CodecSlot::new();

/// Where the installed codec came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallSource {
    /// The host offered a codec and it passed the probe.
    Host,
    /// Nothing usable was offered, [`FallbackCodec`] was installed.
    Fallback,
}

/// Codec chosen for a slot, fixed for the slot's lifetime.
pub struct Installation {
    codec: Box<dyn TextCodec>,
    source: InstallSource,
}

impl Installation {
    pub fn codec(&self) -> &dyn TextCodec {
        self.codec.as_ref()
    }

    pub fn source(&self) -> InstallSource {
        self.source
    }
}

impl std::fmt::Debug for Installation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installation")
            .field("codec", &self.codec.name())
            .field("source", &self.source)
            .finish()
    }
}

/// Write-once holder for a codec.
///
/// The process-wide slot is reached through [`install`], [`installed`] and
/// [`codec`]; separate slots exist so installation can be exercised in
/// isolation.
pub struct CodecSlot {
    cell: OnceLock<Installation>,
}

impl CodecSlot {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Installs `provided` if it is conformant, otherwise the fallback. Once a
    /// codec is installed later calls return it unchanged and `provided` is
    /// dropped.
    pub fn install(&self, provided: Option<Box<dyn TextCodec>>) -> &Installation {
        self.cell.get_or_init(|| select(provided))
    }

    pub fn get(&self) -> Option<&Installation> {
        self.cell.get()
    }
}

impl Default for CodecSlot {
    fn default() -> Self {
        Self::new()
    }
}

fn select(provided: Option<Box<dyn TextCodec>>) -> Installation {
    if let Some(codec) = provided {
        if is_conformant(codec.as_ref()) {
            debug!(codec = codec.name(), "using host text codec");
            return Installation {
                codec,
                source: InstallSource::Host,
            };
        }
        warn!(
            codec = codec.name(),
            "host text codec failed the UTF-8 probe, installing fallback"
        );
    } else {
        debug!("no host text codec offered, installing fallback");
    }
    Installation {
        codec: Box::new(FallbackCodec),
        source: InstallSource::Fallback,
    }
}

fn is_conformant(codec: &dyn TextCodec) -> bool {
    codec.encode(PROBE_TEXT) == PROBE_TEXT.as_bytes()
        && codec.decode(PROBE_TEXT.as_bytes()) == PROBE_TEXT
}

/// Installs the process-wide codec. Idempotent: the first call decides.
pub fn install(provided: Option<Box<dyn TextCodec>>) -> &'static dyn TextCodec {
    GLOBAL.install(provided).codec()
}

/// Returns the process-wide installation, if one has happened.
pub fn installed() -> Option<&'static Installation> {
    GLOBAL.get()
}

/// Returns the process-wide codec, installing the fallback if nothing has been
/// installed yet.
pub fn codec() -> &'static dyn TextCodec {
    install(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StdCodec;

    struct Latin1Codec;

    impl TextCodec for Latin1Codec {
        fn name(&self) -> &'static str {
            "latin1"
        }

        fn encode(&self, text: &str) -> Vec<u8> {
            text.chars().map(|ch| ch as u32 as u8).collect()
        }

        fn decode(&self, bytes: &[u8]) -> String {
            bytes.iter().map(|&b| char::from(b)).collect()
        }
    }

    #[test]
    fn empty_slot_falls_back() {
        let slot = CodecSlot::new();
        assert!(slot.get().is_none());
        let installation = slot.install(None);
        assert_eq!(installation.source(), InstallSource::Fallback);
        assert_eq!(installation.codec().name(), "fallback-utf8");
    }

    #[test]
    fn conformant_host_codec_is_kept() {
        let slot = CodecSlot::new();
        let installation = slot.install(Some(Box::new(StdCodec)));
        assert_eq!(installation.source(), InstallSource::Host);
        assert_eq!(installation.codec().name(), "std");
    }

    #[test]
    fn broken_host_codec_is_replaced() {
        let slot = CodecSlot::new();
        let installation = slot.install(Some(Box::new(Latin1Codec)));
        assert_eq!(installation.source(), InstallSource::Fallback);
    }

    #[test]
    fn second_install_does_not_override() {
        let slot = CodecSlot::new();
        slot.install(Some(Box::new(StdCodec)));
        let again = slot.install(None);
        assert_eq!(again.source(), InstallSource::Host);
        assert_eq!(again.codec().name(), "std");
    }

    #[test]
    fn global_install_is_stable() {
        let first = install(None).name();
        let second = install(Some(Box::new(StdCodec))).name();
        assert_eq!(first, second);
        assert!(installed().is_some());
    }
}
