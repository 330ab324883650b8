//! The processing engine as seen from the audio callback.
//!
//! Engines are opaque: the bridge only creates one for a sample rate, feeds it
//! stereo blocks and forwards parameter updates. [`WasmLoader`] builds engines
//! from a compiled WebAssembly payload; anything else implementing
//! [`EngineLoader`] can stand in for it.

mod bootstrap;
mod error;
mod linkage;
mod wasm;

pub use bootstrap::{bootstrap, SampleRateRange};
pub use error::{BootstrapError, EngineFault};
pub use linkage::LinkageDescriptor;
pub use wasm::WasmLoader;

use worklet_rt::OutgoingMessage;

/// A live engine instance. Only ever touched from the audio thread.
pub trait Engine: Send {
    /// Processes one block. `emit` receives every message the engine produces
    /// during the call, in emission order.
    fn process_block(
        &mut self,
        left: &[f32],
        right: &[f32],
        out_left: &mut [f32],
        out_right: &mut [f32],
        emit: &mut dyn FnMut(OutgoingMessage),
    ) -> Result<(), EngineFault>;

    fn set_parameter(&mut self, id: u32, value: f32) -> Result<(), EngineFault>;
}

/// Creates engines for a given sample rate.
pub trait EngineLoader {
    /// Name used in diagnostics.
    fn name(&self) -> &str {
        "engine"
    }

    fn load(&self, sample_rate: u32) -> Result<Box<dyn Engine>, BootstrapError>;
}
