use worklet_rt::{
    message_port, parameter_channel, MessageReceiver, MessageSender, ParameterReceiver,
    ParameterSender, ParameterUpdate, TrySendError,
};

use crate::{BridgeSnapshot, BridgeStats, WorkletConfig};

/// Controlling-thread side of an instance.
#[derive(Debug)]
pub struct WorkletController {
    parameters: ParameterSender,
    messages: MessageReceiver,
    stats: BridgeStats,
}

impl WorkletController {
    /// Fire-and-forget. An `Ok` only means the update was queued; it may still
    /// be dropped if the engine is not running when it is dispatched.
    pub fn send(&self, update: ParameterUpdate) -> Result<(), TrySendError> {
        self.parameters.send(update)
    }

    pub fn set_parameter(&self, id: u32, value: f32) -> Result<(), TrySendError> {
        self.parameters.set(id, value)
    }

    pub fn messages(&self) -> &MessageReceiver {
        &self.messages
    }

    pub fn stats(&self) -> BridgeSnapshot {
        self.stats.snapshot()
    }
}

/// Audio-thread side, consumed by [`crate::WorkletProcessor`].
#[derive(Debug)]
pub struct ProcessorEndpoint {
    pub(crate) parameters: ParameterReceiver,
    pub(crate) messages: MessageSender,
    pub(crate) stats: BridgeStats,
}

/// Creates the channel pair linking a controller to its processor.
pub fn worklet_channels(config: &WorkletConfig) -> (WorkletController, ProcessorEndpoint) {
    let (parameter_tx, parameter_rx) = parameter_channel(config.parameter_queue_capacity);
    let (message_tx, message_rx) = message_port();
    let stats = BridgeStats::new();

    let controller = WorkletController {
        parameters: parameter_tx,
        messages: message_rx,
        stats: stats.clone(),
    };
    let endpoint = ProcessorEndpoint {
        parameters: parameter_rx,
        messages: message_tx,
        stats,
    };
    (controller, endpoint)
}
