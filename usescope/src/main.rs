//! # usescope - Main Entry Point
//!
//! Supports three subcommands:
//! - **profile**: capture with the platform profiler, fold, and render
//! - **fold**: raw profiler dump → folded stacks
//! - **render**: folded stacks → SVG flame graph

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use usescope::capture::Backend;
use usescope::cli::args::is_stdio;
use usescope::cli::{Args, Command, FoldArgs, ProfileArgs, RenderArgs};
use usescope::domain::ProfilerError;
use usescope::export::{ArtifactSet, RunSummary};
use usescope::flame::{render_to_vec, FlameTree};
use usescope::folding::{collapse, CollapseOptions};
use usescope::preflight::{check_output_path, run_preflight_checks};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_NOPERM: i32 = 77;
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.chain().find_map(|cause| cause.downcast_ref::<ProfilerError>()) {
        Some(ProfilerError::PermissionDenied { .. }) => EXIT_NOPERM,
        Some(ProfilerError::Cancelled { .. }) => EXIT_INTERRUPTED,
        _ => EXIT_ERROR,
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let args = Args::parse();

    match &args.command {
        Command::Profile(profile_args) => profile(profile_args, args.quiet).await,
        Command::Fold(fold_args) => fold(fold_args, args.quiet),
        Command::Render(render_args) => render(render_args, args.quiet),
    }
}

async fn profile(args: &ProfileArgs, quiet: bool) -> Result<()> {
    let request = args.capture_request();
    let folded_path = args.folded_path();

    let mut artifacts = vec![request.output(), folded_path.as_path()];
    if let Some(summary) = &args.summary {
        artifacts.push(summary.as_path());
    }
    run_preflight_checks(&artifacts, quiet)?;

    // Backend is chosen once; a failed capture is not retried with another
    let backend = Backend::select(request.pid())?;

    if !quiet {
        println!("usescope v{}", env!("CARGO_PKG_VERSION"));
        println!("backend: {backend}");
        match request.pid() {
            Some(pid) => println!("target: {pid}"),
            None => println!("target: system-wide"),
        }
        println!("sampling: {}s at {}", request.whole_seconds(), request.frequency());
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let outcome = backend.capture(&cancel, &request).await?;

    let options = CollapseOptions { demangle: args.demangle };
    let stacks = collapse(outcome.raw.as_slice(), outcome.format(), options)
        .with_context(|| format!("{backend} produced no usable stacks"))?;
    let tree = FlameTree::from_stacks(&stacks)?;
    let svg = render_to_vec(&tree, &args.render.to_spec())?;

    // Artifacts become visible together, only after every stage succeeded
    let mut artifacts = ArtifactSet::new();
    let mut folded = Vec::new();
    stacks.write_to(&mut folded)?;
    artifacts
        .stage(&folded_path, &folded)
        .with_context(|| format!("Failed to write {}", folded_path.display()))?;
    artifacts
        .stage(request.output(), &svg)
        .with_context(|| format!("Failed to write {}", request.output().display()))?;

    if let Some(summary_path) = &args.summary {
        let summary = RunSummary::new(&request, &outcome, &stacks, folded_path.clone());
        let mut json = Vec::new();
        summary.export(&mut json).context("Failed to export run summary")?;
        artifacts
            .stage(summary_path, &json)
            .with_context(|| format!("Failed to write {}", summary_path.display()))?;
    }
    artifacts.commit().context("Failed to save artifacts")?;

    if !quiet {
        println!("samples: {} ({} unique stacks)", stacks.total_samples(), stacks.len());
        println!("saved: {}", folded_path.display());
        println!("saved: {}", request.output().display());
    }
    Ok(())
}

fn fold(args: &FoldArgs, quiet: bool) -> Result<()> {
    let options = CollapseOptions { demangle: args.demangle };
    let stacks = match file_arg(args.input.as_deref()) {
        None => collapse(io::stdin().lock(), args.format, options)?,
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            collapse(BufReader::new(file), args.format, options)
                .with_context(|| format!("Failed to fold {}", path.display()))?
        }
    };
    info!("Folded {} samples into {} unique stacks", stacks.total_samples(), stacks.len());

    match file_arg(args.output.as_deref()) {
        None => stacks.write_to(io::stdout().lock())?,
        Some(path) => {
            check_output_path(path)?;
            let mut folded = Vec::new();
            stacks.write_to(&mut folded)?;
            save(path, &folded)?;
            if !quiet {
                println!("saved: {}", path.display());
            }
        }
    }
    Ok(())
}

fn render(args: &RenderArgs, quiet: bool) -> Result<()> {
    let text = read_text(args.input.as_deref())?;
    let tree = FlameTree::from_folded(&text)?;
    let svg = render_to_vec(&tree, &args.render.to_spec())?;

    check_output_path(&args.output)?;
    save(&args.output, &svg)?;

    if !quiet {
        println!("saved: {} ({} samples)", args.output.display(), tree.total_samples());
    }
    Ok(())
}

fn read_text(input: Option<&Path>) -> Result<String> {
    let bytes = match file_arg(input) {
        None => {
            let mut bytes = Vec::new();
            io::stdin().lock().read_to_end(&mut bytes).context("Failed to read stdin")?;
            bytes
        }
        Some(path) => fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?,
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `None` when the argument means stdin/stdout.
fn file_arg(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !is_stdio(Some(*p)))
}

fn save(path: &Path, contents: &[u8]) -> Result<()> {
    let mut artifacts = ArtifactSet::new();
    artifacts.stage(path, contents)?;
    artifacts.commit().with_context(|| format!("Failed to write {}", path.display()))
}
