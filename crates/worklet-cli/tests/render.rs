use std::fs;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use worklet_cli::{check, read_wav, render, EngineSource, RenderJob};
use worklet_rt::ParameterUpdate;

/// Parameter 0 scales both channels. Posts "tick" after every call and
/// refuses sample rates above 96 kHz.
const GAIN_ENGINE: &str = r#"
(module
  (import "env" "emit_message" (func $emit (param i32 i32)))
  (import "env" "log_message" (func $log (param i32 i32)))
  (memory (export "memory") 1)
  (data (i32.const 16) "tick")
  (global $heap (mut i32) (i32.const 1024))
  (global $gain (mut f32) (f32.const 1.0))

  (func (export "create_buffer") (param $frames i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $heap))
    (global.set $heap
      (i32.add (global.get $heap) (i32.shl (local.get $frames) (i32.const 2))))
    (local.get $ptr))

  (func (export "create_processor") (param $rate i32) (result i32)
    (i32.le_u (local.get $rate) (i32.const 96000)))

  (func (export "set_parameter") (param $processor i32) (param $id i32) (param $value f32)
    (if (i32.eqz (local.get $id))
      (then (global.set $gain (local.get $value)))))

  (func (export "process")
    (param $processor i32) (param $in_l i32) (param $in_r i32)
    (param $out_l i32) (param $out_r i32) (param $frames i32)
    (local $offset i32) (local $end i32)
    (local.set $end (i32.shl (local.get $frames) (i32.const 2)))
    (block $done
      (loop $next
        (br_if $done (i32.ge_u (local.get $offset) (local.get $end)))
        (f32.store (i32.add (local.get $out_l) (local.get $offset))
          (f32.mul (f32.load (i32.add (local.get $in_l) (local.get $offset)))
                   (global.get $gain)))
        (f32.store (i32.add (local.get $out_r) (local.get $offset))
          (f32.mul (f32.load (i32.add (local.get $in_r) (local.get $offset)))
                   (global.get $gain)))
        (local.set $offset (i32.add (local.get $offset) (i32.const 4)))
        (br $next)))
    (call $emit (i32.const 16) (i32.const 4)))
)
"#;

fn write_payload(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("gain.wasm");
    fs::write(&path, wat::parse_str(GAIN_ENGINE).unwrap()).unwrap();
    path
}

fn write_mono_input(path: &Path, frames: usize, sample_rate: u32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for _ in 0..frames {
        writer.write_sample(16_384i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn engine(payload: std::path::PathBuf) -> EngineSource {
    EngineSource {
        payload,
        script: None,
        config: None,
    }
}

#[test]
fn renders_mono_input_to_stereo() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    let messages = dir.path().join("messages.txt");
    write_mono_input(&input, 300, 48_000);

    let job = RenderJob {
        engine: engine(write_payload(dir.path())),
        input,
        output: output.clone(),
        messages: Some(messages.clone()),
        updates: vec![ParameterUpdate::new(0, 0.5)],
    };
    let report = render(&job).expect("render succeeds");

    assert_eq!(report.sample_rate, 48_000);
    assert_eq!(report.frames, 300);
    assert_eq!(report.blocks, 3);
    assert_eq!(report.messages, 3);
    assert_eq!(report.stats.parameters_applied, 1);
    assert_eq!(report.stats.blocks_processed, 3);

    let clip = read_wav(&output).unwrap();
    assert_eq!(clip.sample_rate, 48_000);
    assert_eq!(clip.block.num_channels(), 2);
    for channel in clip.block.as_slice() {
        assert_eq!(channel.len(), 300);
        assert!(channel.iter().all(|&sample| sample == 0.25));
    }

    assert_eq!(fs::read_to_string(&messages).unwrap(), "tick\ntick\ntick\n");
}

#[test]
fn bootstrap_failure_is_an_error() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.wav");
    write_mono_input(&input, 16, 192_000);

    let job = RenderJob {
        engine: engine(write_payload(dir.path())),
        input,
        output: dir.path().join("out.wav"),
        messages: None,
        updates: Vec::new(),
    };
    let err = render(&job).unwrap_err();
    assert!(err.to_string().contains("failed to bootstrap"), "{err:#}");
    assert!(!dir.path().join("out.wav").exists());
}

#[test]
fn check_reports_rates_the_engine_refuses() {
    let dir = tempdir().unwrap();
    let engine = engine(write_payload(dir.path()));
    assert!(check(&engine, 44_100).is_ok());
    assert!(check(&engine, 192_000).is_err());
}

#[test]
fn invalid_config_names_the_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("worklet.json");
    fs::write(&config, "{\"block_size\": \"big\"}").unwrap();

    let source = EngineSource {
        config: Some(config),
        ..engine(write_payload(dir.path()))
    };
    let err = check(&source, 48_000).unwrap_err();
    assert!(format!("{err:#}").contains("worklet.json"));
}
