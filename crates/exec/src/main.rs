//! Command-line driver for the Groudon Cairo virtual machine.
//!
//! Loads a compiled program artifact, runs it to completion, and optionally
//! writes the relocated trace and memory images to disk.

mod output;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use groudon_vm::program::Program;
use groudon_vm::runner::{CairoRunner, RunnerConfig};
use tracing_subscriber::EnvFilter;

/// Executes a compiled Cairo program.
#[derive(Debug, Parser)]
#[command(name = "execute", version, about)]
struct Args {
    /// Path to the compiled program artifact (JSON).
    #[arg(long)]
    filename: PathBuf,

    /// The layout to run with.
    #[arg(long, default_value = "plain")]
    layout: String,

    /// Run in proof mode.
    #[arg(long)]
    proof_mode: bool,

    /// Record the register trace during execution.
    #[arg(long)]
    enable_trace: bool,

    /// Where to write the relocated memory image.
    #[arg(long)]
    output_memory: Option<PathBuf>,

    /// Where to write the relocated trace. Implies `--enable-trace`.
    #[arg(long)]
    output_trace: Option<PathBuf>,

    /// Abort the run after this many steps.
    #[arg(long)]
    max_steps: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let source = fs::read_to_string(&args.filename)
        .with_context(|| format!("failed to read {}", args.filename.display()))?;
    let program = Program::from_json(&source)
        .with_context(|| format!("failed to parse {}", args.filename.display()))?;

    let config = RunnerConfig {
        trace_enabled: args.enable_trace || args.output_trace.is_some(),
        max_steps: args.max_steps,
        layout: args.layout.clone(),
        proof_mode: args.proof_mode,
    };

    let mut runner = CairoRunner::new(program, config).context("failed to initialize the run")?;
    runner
        .run()
        .with_context(|| format!("execution failed at pc {}", runner.vm().cpu().pc))?;
    runner.relocate().context("relocation failed")?;

    tracing::info!(steps = runner.vm().current_step(), "execution complete");

    if let Some(path) = &args.output_trace {
        let trace = runner
            .relocated_trace()
            .context("no trace was recorded for this run")?;
        let mut writer = BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        );
        output::write_trace(&mut writer, trace)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if let Some(path) = &args.output_memory {
        let memory = runner
            .relocated_memory()
            .context("the memory image is missing")?;
        let mut writer = BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        );
        output::write_memory(&mut writer, memory)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(())
}
