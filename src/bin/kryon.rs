// src/bin/kryon.rs
//
// The ambient CLI surface (§6): `compile` is a documented stub, since
// the source-language-to-KRB compiler itself is out of scope, and `run`
// drives a loaded runtime headlessly against the null render backend for
// smoke-testing a `.krb` file without a real windowing backend.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use kryon_render::test::NullBackend;
use kryon_runtime::Runtime;

#[derive(Parser)]
#[command(name = "kryon")]
#[command(about = "Loader and headless driver for the Kryon binary UI container (.krb)")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a source markup file into a .krb container.
    Compile {
        input: String,
        output: String,
    },
    /// Load and drive a .krb file headlessly, for smoke-testing.
    Run {
        krb_file: String,

        /// Number of frames to drive before exiting.
        #[arg(long, default_value_t = 60)]
        frames: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if cli.debug { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    match cli.command {
        Command::Compile { input, output } => compile(&input, &output),
        Command::Run { krb_file, frames } => run(&krb_file, frames),
    }
}

/// The source-language compiler is out of scope for this workspace
/// (§1); this subcommand exists so the CLI's surface matches a real
/// toolchain's shape, but it always fails with the same error a missing
/// KRB section would produce.
fn compile(input: &str, _output: &str) -> Result<()> {
    if !Path::new(input).exists() {
        bail!("input file not found: {input}");
    }
    Err(kryon_core::KryonError::MissingSection(
        "no source-to-KRB compiler is built into this workspace".to_string(),
    )
    .into())
}

fn run(krb_file: &str, frames: u32) -> Result<()> {
    if !Path::new(krb_file).exists() {
        bail!("KRB file not found: {krb_file}");
    }

    info!("loading KRB file: {krb_file}");
    let mut runtime = Runtime::load(krb_file).context("failed to load KRB file")?;
    let mut backend = NullBackend::new();

    info!("driving {frames} headless frames against the null backend");
    let mut last_frame_time = Instant::now();
    for frame in 0..frames {
        let now = Instant::now();
        let delta: Duration = now.duration_since(last_frame_time);
        last_frame_time = now;

        if let Err(e) = runtime.update(delta) {
            error!("update failed on frame {frame}: {e}");
            break;
        }
        if let Err(e) = runtime.render(&mut backend) {
            error!("render failed on frame {frame}: {e}");
            break;
        }
        for logged in runtime.drain_errors() {
            error!("runtime error: {}", logged.message);
        }
    }

    info!(
        "done: {} frames begun, {} frames ended, {} commands in the last frame",
        backend.frames_begun,
        backend.frames_ended,
        backend.last_commands.len()
    );
    Ok(())
}
