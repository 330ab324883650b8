use tracing::{debug, error, info, trace, warn};
use worklet_engine::{bootstrap, BootstrapError, Engine, EngineLoader, SampleRateRange, WasmLoader};
use worklet_rt::{
    resolve_stereo, ChannelShape, MessageSender, OutgoingMessage, ParameterReceiver,
    ParameterUpdate,
};

use crate::{BridgeStats, ProcessorEndpoint, WorkletConfig, WorkletOptions};

/// Lifecycle of a processor instance.
///
/// `Uninitialized -> Bootstrapping -> Ready | Failed`. Blocks run inside
/// [`WorkletProcessor::process`] and the state stays `Ready` whatever the
/// block outcome. `Failed` is terminal: bootstrap is never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Uninitialized,
    Bootstrapping,
    Ready,
    Failed,
}

/// Outcome of one [`WorkletProcessor::process`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    /// The engine rendered the block.
    Processed,
    /// There is no engine; nothing was touched.
    NoEngine,
    /// Fewer than one input or two output channels.
    ShapeMismatch(ChannelShape),
    /// The engine failed during the block. Outputs were silenced.
    EngineFault,
}

impl BlockStatus {
    pub fn is_processed(&self) -> bool {
        matches!(self, BlockStatus::Processed)
    }

    /// Whether the host should keep scheduling this processor. Always true:
    /// a failed block never ends the instance.
    pub fn keep_alive(&self) -> bool {
        true
    }
}

/// Audio-thread half of a worklet instance.
pub struct WorkletProcessor {
    state: ProcessorState,
    sample_rate: u32,
    engine: Option<Box<dyn Engine>>,
    bootstrap_error: Option<BootstrapError>,
    parameters: ParameterReceiver,
    messages: MessageSender,
    stats: BridgeStats,
    reported_missing_engine: bool,
}

impl WorkletProcessor {
    /// Creates a processor running the WebAssembly engine described by
    /// `options`. Installs the text codec first if none is installed yet.
    pub fn new(
        options: WorkletOptions,
        config: &WorkletConfig,
        endpoint: ProcessorEndpoint,
    ) -> Self {
        let WorkletOptions {
            binary_module_payload,
            bootstrap_script,
            sample_rate,
            host_codec,
        } = options;

        let codec = worklet_codec::install(host_codec);
        let loader = WasmLoader::new(binary_module_payload, bootstrap_script, codec)
            .with_block_size(config.block_size);
        Self::with_loader(&loader, sample_rate, config.sample_rates, endpoint)
    }

    /// Creates a processor whose engine comes from `loader`.
    pub fn with_loader(
        loader: &dyn EngineLoader,
        sample_rate: u32,
        supported: SampleRateRange,
        endpoint: ProcessorEndpoint,
    ) -> Self {
        let ProcessorEndpoint {
            parameters,
            messages,
            stats,
        } = endpoint;

        let mut processor = Self {
            state: ProcessorState::Uninitialized,
            sample_rate,
            engine: None,
            bootstrap_error: None,
            parameters,
            messages,
            stats,
            reported_missing_engine: false,
        };
        processor.start(loader, supported);
        processor
    }

    fn start(&mut self, loader: &dyn EngineLoader, supported: SampleRateRange) {
        if self.state != ProcessorState::Uninitialized {
            return;
        }
        self.state = ProcessorState::Bootstrapping;

        // Anything queued before the engine exists is discarded here.
        self.dispatch_parameters();

        match bootstrap(loader, self.sample_rate, supported) {
            Ok(engine) => {
                info!(
                    loader = loader.name(),
                    sample_rate = self.sample_rate,
                    "worklet engine ready"
                );
                self.engine = Some(engine);
                self.state = ProcessorState::Ready;
            }
            Err(err) => {
                error!(
                    loader = loader.name(),
                    sample_rate = self.sample_rate,
                    error = %err,
                    "worklet engine failed to bootstrap"
                );
                self.bootstrap_error = Some(err);
                self.state = ProcessorState::Failed;
            }
        }
    }

    pub fn state(&self) -> ProcessorState {
        self.state
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Why bootstrap failed, when it did.
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    /// Applies one parameter update. Updates arriving while there is no
    /// engine are dropped.
    pub fn receive_parameter(&mut self, update: ParameterUpdate) {
        apply_parameter(&mut self.engine, &self.stats, update);
    }

    fn dispatch_parameters(&mut self) -> usize {
        let Self {
            parameters,
            engine,
            stats,
            ..
        } = self;
        parameters.dispatch(|update| apply_parameter(engine, stats, update))
    }

    /// Renders one block from `inputs` into the first two `outputs`.
    ///
    /// Pending parameter updates are applied first. A single input channel is
    /// fed to both sides of the engine; inputs past the second and outputs past
    /// the second are left alone.
    pub fn process<I, O>(&mut self, inputs: &[I], outputs: &mut [O]) -> BlockStatus
    where
        I: AsRef<[f32]>,
        O: AsMut<[f32]>,
    {
        self.dispatch_parameters();

        let Some(engine) = self.engine.as_mut() else {
            if !self.reported_missing_engine {
                error!(state = ?self.state, "no engine, block skipped");
                self.reported_missing_engine = true;
            } else {
                trace!("no engine, block skipped");
            }
            self.stats.block_skipped();
            return BlockStatus::NoEngine;
        };

        let shape = ChannelShape::new(inputs.len(), outputs.len());
        let stereo = match resolve_stereo(inputs) {
            Some(stereo) if shape.is_processable() => stereo,
            _ => {
                warn!(
                    inputs = shape.inputs,
                    outputs = shape.outputs,
                    "missing input or output channels, block skipped"
                );
                self.stats.block_skipped();
                return BlockStatus::ShapeMismatch(shape);
            }
        };

        let [out_left, out_right, ..] = outputs else {
            self.stats.block_skipped();
            return BlockStatus::ShapeMismatch(shape);
        };
        let (out_left, out_right) = (out_left.as_mut(), out_right.as_mut());
        let frames = stereo
            .frames()
            .min(out_left.len())
            .min(out_right.len());
        let (out_left, out_right) = (&mut out_left[..frames], &mut out_right[..frames]);

        let messages = &self.messages;
        let stats = &self.stats;
        let result = engine.process_block(
            &stereo.left[..frames],
            &stereo.right[..frames],
            out_left,
            out_right,
            &mut |message| forward_message(messages, stats, message),
        );

        match result {
            Ok(()) => {
                self.stats.block_processed();
                BlockStatus::Processed
            }
            Err(fault) => {
                warn!(error = %fault, "engine fault, block silenced");
                out_left.fill(0.0);
                out_right.fill(0.0);
                self.stats.engine_fault();
                BlockStatus::EngineFault
            }
        }
    }
}

impl std::fmt::Debug for WorkletProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkletProcessor")
            .field("state", &self.state)
            .field("sample_rate", &self.sample_rate)
            .field("bootstrap_error", &self.bootstrap_error)
            .finish_non_exhaustive()
    }
}

fn apply_parameter(
    engine: &mut Option<Box<dyn Engine>>,
    stats: &BridgeStats,
    update: ParameterUpdate,
) {
    let Some(engine) = engine.as_mut() else {
        debug!(
            id = update.id,
            value = update.value,
            "parameter update dropped, no engine"
        );
        stats.parameter_dropped();
        return;
    };
    match engine.set_parameter(update.id, update.value) {
        Ok(()) => stats.parameter_applied(),
        Err(fault) => {
            warn!(
                id = update.id,
                value = update.value,
                error = %fault,
                "engine rejected parameter"
            );
            stats.parameter_dropped();
        }
    }
}

fn forward_message(messages: &MessageSender, stats: &BridgeStats, message: OutgoingMessage) {
    match messages.post(message) {
        Ok(()) => stats.message_forwarded(),
        Err(_) => {
            trace!("controller gone, engine message discarded");
            stats.message_discarded();
        }
    }
}
