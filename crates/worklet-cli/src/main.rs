use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use worklet_cli::{check, parse_update, render, EngineSource, RenderJob};
use worklet_rt::ParameterUpdate;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render(args) => execute_render(args),
        Commands::Check(args) => execute_check(args),
    }
}

#[derive(Parser)]
#[command(author, version, about = "Run worklet engines offline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a WAV file through an engine.
    Render(RenderArgs),
    /// Bootstrap an engine and report whether it starts.
    Check(CheckArgs),
}

#[derive(Args)]
struct EngineArgs {
    /// Compiled engine module.
    #[arg(long)]
    payload: PathBuf,
    /// Bootstrap script (JSON linkage descriptor).
    #[arg(long)]
    script: Option<PathBuf>,
    /// Worklet configuration (JSON).
    #[arg(long)]
    config: Option<PathBuf>,
}

impl From<EngineArgs> for EngineSource {
    fn from(args: EngineArgs) -> Self {
        EngineSource {
            payload: args.payload,
            script: args.script,
            config: args.config,
        }
    }
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    engine: EngineArgs,
    /// Input WAV file. Mono input is fed to both engine channels.
    #[arg(long)]
    input: PathBuf,
    /// Output path for the stereo result.
    #[arg(long)]
    output: PathBuf,
    /// Write engine messages to this file, one per line.
    #[arg(long)]
    messages: Option<PathBuf>,
    /// Parameter update sent before rendering, as ID=VALUE. Repeatable.
    #[arg(long = "set", value_parser = parse_update)]
    updates: Vec<ParameterUpdate>,
    /// Print the render report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CheckArgs {
    #[command(flatten)]
    engine: EngineArgs,
    #[arg(long, default_value_t = 48_000)]
    sample_rate: u32,
}

fn execute_render(args: RenderArgs) -> Result<()> {
    let job = RenderJob {
        engine: args.engine.into(),
        input: args.input,
        output: args.output,
        messages: args.messages,
        updates: args.updates,
    };
    let report = render(&job)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!(
        "Rendered {} frames at {} Hz ({} blocks)",
        report.frames, report.sample_rate, report.blocks
    );
    println!("  Output: {}", job.output.display());
    println!(
        "  Parameters: {} applied, {} dropped",
        report.stats.parameters_applied, report.stats.parameters_dropped
    );
    println!("  Messages: {}", report.messages);
    if report.stats.engine_faults > 0 {
        println!("  Engine faults: {}", report.stats.engine_faults);
    }
    Ok(())
}

fn execute_check(args: CheckArgs) -> Result<()> {
    let engine: EngineSource = args.engine.into();
    check(&engine, args.sample_rate)?;
    println!(
        "Engine {} ready at {} Hz",
        engine.payload.display(),
        args.sample_rate
    );
    Ok(())
}
