//! Engine loader for compiled WebAssembly payloads.

use std::sync::Arc;

use tracing::{debug, warn};
use wasmtime::{
    Caller, Config, Instance, Linker, Memory, Module, Store, TypedFunc, WasmParams, WasmResults,
};
use worklet_codec::TextCodec;
use worklet_rt::{OutgoingMessage, FRAMES_PER_BUFFER};

use crate::{BootstrapError, Engine, EngineFault, EngineLoader, LinkageDescriptor};

const SAMPLE_BYTES: usize = std::mem::size_of::<f32>();
const MAX_BLOCK_FRAMES: usize = 8192;
const OUTBOX_CAPACITY: usize = 64;

/// Per-store state reachable from host imports.
struct HostState {
    outbox: Vec<OutgoingMessage>,
    codec: &'static dyn TextCodec,
}

/// Builds [`Engine`]s from a WebAssembly payload and its bootstrap script.
pub struct WasmLoader {
    payload: Arc<[u8]>,
    script: String,
    codec: &'static dyn TextCodec,
    block_size: usize,
}

impl WasmLoader {
    /// `codec` decodes the text the engine logs; install it before loading.
    pub fn new(
        payload: impl Into<Arc<[u8]>>,
        script: impl Into<String>,
        codec: &'static dyn TextCodec,
    ) -> Self {
        Self {
            payload: payload.into(),
            script: script.into(),
            codec,
            block_size: FRAMES_PER_BUFFER,
        }
    }

    /// Frames per engine call. Longer host blocks are split.
    pub fn with_block_size(mut self, frames: usize) -> Self {
        self.block_size = frames.clamp(1, MAX_BLOCK_FRAMES);
        self
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

impl std::fmt::Debug for WasmLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmLoader")
            .field("payload_bytes", &self.payload.len())
            .field("codec", &self.codec.name())
            .field("block_size", &self.block_size)
            .finish_non_exhaustive()
    }
}

impl EngineLoader for WasmLoader {
    fn name(&self) -> &str {
        "wasm"
    }

    fn load(&self, sample_rate: u32) -> Result<Box<dyn Engine>, BootstrapError> {
        let linkage = LinkageDescriptor::parse(&self.script)?;

        let runtime = wasmtime::Engine::new(&Config::new())
            .map_err(|err| BootstrapError::Compile(err.to_string()))?;
        let module = Module::from_binary(&runtime, &self.payload)
            .map_err(|err| BootstrapError::Compile(err.to_string()))?;
        let linker = host_linker(&runtime, &linkage)?;

        let mut store = Store::new(
            &runtime,
            HostState {
                outbox: Vec::with_capacity(OUTBOX_CAPACITY),
                codec: self.codec,
            },
        );
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|err| BootstrapError::Link(err.to_string()))?;

        let memory = instance
            .get_memory(&mut store, &linkage.memory)
            .ok_or_else(|| BootstrapError::MissingExport {
                name: linkage.memory.clone(),
                reason: "no memory exported under this name".into(),
            })?;
        let constructor: TypedFunc<i32, i32> =
            typed_export(&instance, &mut store, &linkage.constructor)?;
        let set_parameter = typed_export(&instance, &mut store, &linkage.set_parameter)?;
        let process = typed_export(&instance, &mut store, &linkage.process)?;
        let create_buffer: TypedFunc<i32, i32> =
            typed_export(&instance, &mut store, &linkage.create_buffer)?;

        let rate = i32::try_from(sample_rate).map_err(|_| BootstrapError::UnsupportedSampleRate {
            sample_rate,
            min: 1,
            max: i32::MAX as u32,
        })?;
        let processor = constructor
            .call(&mut store, rate)
            .map_err(|err| BootstrapError::Trap(err.to_string()))?;
        if processor == 0 {
            return Err(BootstrapError::ConstructorRefused { sample_rate });
        }

        let buffers = TransferBuffers {
            in_left: allocate(&create_buffer, memory, &mut store, self.block_size)?,
            in_right: allocate(&create_buffer, memory, &mut store, self.block_size)?,
            out_left: allocate(&create_buffer, memory, &mut store, self.block_size)?,
            out_right: allocate(&create_buffer, memory, &mut store, self.block_size)?,
        };

        debug!(
            payload_bytes = self.payload.len(),
            sample_rate,
            block_size = self.block_size,
            "wasm engine instantiated"
        );

        Ok(Box::new(WasmEngine {
            store,
            memory,
            processor,
            set_parameter,
            process,
            buffers,
            block_size: self.block_size,
        }))
    }
}

fn host_linker(
    runtime: &wasmtime::Engine,
    linkage: &LinkageDescriptor,
) -> Result<Linker<HostState>, BootstrapError> {
    let mut linker: Linker<HostState> = Linker::new(runtime);

    let memory = linkage.memory.clone();
    linker
        .func_wrap(
            &linkage.import_module,
            &linkage.emit_import,
            move |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| {
                match guest_bytes(&mut caller, &memory, ptr, len) {
                    Some(bytes) => caller.data_mut().outbox.push(OutgoingMessage::new(bytes)),
                    None => warn!(ptr, len, "engine emitted a message outside its memory"),
                }
            },
        )
        .map_err(|err| BootstrapError::Link(err.to_string()))?;

    let memory = linkage.memory.clone();
    linker
        .func_wrap(
            &linkage.import_module,
            &linkage.log_import,
            move |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| {
                if let Some(bytes) = guest_bytes(&mut caller, &memory, ptr, len) {
                    let line = caller.data().codec.decode(&bytes);
                    debug!(target: "worklet_engine::guest", "{line}");
                }
            },
        )
        .map_err(|err| BootstrapError::Link(err.to_string()))?;

    Ok(linker)
}

fn guest_bytes(
    caller: &mut Caller<'_, HostState>,
    memory: &str,
    ptr: i32,
    len: i32,
) -> Option<Vec<u8>> {
    let memory = caller.get_export(memory)?.into_memory()?;
    let start = usize::try_from(ptr).ok()?;
    let end = start.checked_add(usize::try_from(len).ok()?)?;
    memory.data(&*caller).get(start..end).map(<[u8]>::to_vec)
}

fn typed_export<P, R>(
    instance: &Instance,
    store: &mut Store<HostState>,
    name: &str,
) -> Result<TypedFunc<P, R>, BootstrapError>
where
    P: WasmParams,
    R: WasmResults,
{
    instance
        .get_typed_func::<P, R>(&mut *store, name)
        .map_err(|err| BootstrapError::MissingExport {
            name: name.to_owned(),
            reason: err.to_string(),
        })
}

fn allocate(
    create_buffer: &TypedFunc<i32, i32>,
    memory: Memory,
    store: &mut Store<HostState>,
    frames: usize,
) -> Result<u32, BootstrapError> {
    let ptr = create_buffer
        .call(&mut *store, frames as i32)
        .map_err(|err| BootstrapError::Trap(err.to_string()))? as u32;
    let end = ptr as usize + frames * SAMPLE_BYTES;
    if ptr == 0 || end > memory.data_size(&*store) {
        return Err(BootstrapError::BufferOutOfBounds { ptr, frames });
    }
    Ok(ptr)
}

/// Engine-side f32 buffers the host copies blocks through.
#[derive(Debug, Clone, Copy)]
struct TransferBuffers {
    in_left: u32,
    in_right: u32,
    out_left: u32,
    out_right: u32,
}

struct WasmEngine {
    store: Store<HostState>,
    memory: Memory,
    processor: i32,
    set_parameter: TypedFunc<(i32, i32, f32), ()>,
    process: TypedFunc<(i32, i32, i32, i32, i32, i32), ()>,
    buffers: TransferBuffers,
    block_size: usize,
}

impl WasmEngine {
    fn write_channel(&mut self, ptr: u32, samples: &[f32]) -> Result<(), EngineFault> {
        let start = ptr as usize;
        let bytes = self
            .memory
            .data_mut(&mut self.store)
            .get_mut(start..start + samples.len() * SAMPLE_BYTES)
            .ok_or(EngineFault::OutOfBounds)?;
        for (chunk, sample) in bytes.chunks_exact_mut(SAMPLE_BYTES).zip(samples) {
            chunk.copy_from_slice(&sample.to_le_bytes());
        }
        Ok(())
    }

    fn read_channel(&self, ptr: u32, out: &mut [f32]) -> Result<(), EngineFault> {
        let start = ptr as usize;
        let bytes = self
            .memory
            .data(&self.store)
            .get(start..start + out.len() * SAMPLE_BYTES)
            .ok_or(EngineFault::OutOfBounds)?;
        for (sample, chunk) in out.iter_mut().zip(bytes.chunks_exact(SAMPLE_BYTES)) {
            *sample = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(())
    }

    fn flush_outbox(&mut self, emit: &mut dyn FnMut(OutgoingMessage)) {
        for message in self.store.data_mut().outbox.drain(..) {
            emit(message);
        }
    }
}

impl Engine for WasmEngine {
    fn process_block(
        &mut self,
        left: &[f32],
        right: &[f32],
        out_left: &mut [f32],
        out_right: &mut [f32],
        emit: &mut dyn FnMut(OutgoingMessage),
    ) -> Result<(), EngineFault> {
        let frames = left
            .len()
            .min(right.len())
            .min(out_left.len())
            .min(out_right.len());
        let buffers = self.buffers;

        let mut offset = 0;
        while offset < frames {
            let len = (frames - offset).min(self.block_size);
            let range = offset..offset + len;

            self.write_channel(buffers.in_left, &left[range.clone()])?;
            self.write_channel(buffers.in_right, &right[range.clone()])?;
            let result = self.process.call(
                &mut self.store,
                (
                    self.processor,
                    buffers.in_left as i32,
                    buffers.in_right as i32,
                    buffers.out_left as i32,
                    buffers.out_right as i32,
                    len as i32,
                ),
            );
            // Messages emitted before a trap are still delivered.
            self.flush_outbox(emit);
            result.map_err(|err| EngineFault::Trap(err.to_string()))?;

            self.read_channel(buffers.out_left, &mut out_left[range.clone()])?;
            self.read_channel(buffers.out_right, &mut out_right[range])?;
            offset += len;
        }
        Ok(())
    }

    fn set_parameter(&mut self, id: u32, value: f32) -> Result<(), EngineFault> {
        self.set_parameter
            .call(&mut self.store, (self.processor, id as i32, value))
            .map_err(|err| EngineFault::Trap(err.to_string()))
    }
}
