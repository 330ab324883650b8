//! The audio block processor and the controller handle that talks to it.
//!
//! A [`WorkletProcessor`] lives on the audio thread. It bootstraps its engine
//! once when constructed, applies parameter updates between blocks and posts
//! whatever the engine emits back to the [`WorkletController`].

mod config;
mod controller;
mod options;
mod processor;
mod stats;

pub use config::WorkletConfig;
pub use controller::{worklet_channels, ProcessorEndpoint, WorkletController};
pub use options::WorkletOptions;
pub use processor::{BlockStatus, ProcessorState, WorkletProcessor};
pub use stats::{BridgeSnapshot, BridgeStats};
