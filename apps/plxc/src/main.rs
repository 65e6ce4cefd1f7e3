//! # plx compiler driver
//!
//! Reads every `.plx` file in a directory, runs it through the shared
//! front-end/middle-end pipeline, and lowers the result with either the
//! LLVM or the WebAssembly back-end.
//!
//! ## Exit codes
//! * 0 — success.
//! * 1 — a compiler diagnostic was reported (bad source) or the driver hit
//!   an I/O or subprocess failure.

mod cli;
mod pipeline;
mod sink;

use clap::Parser;
use cli::Cli;
use plx_ast::Pool;
use sink::StderrSink;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Cli::parse();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(true)` on a clean compile, `Ok(false)` when a compiler
/// diagnostic was reported (already printed to stderr), and `Err` for
/// driver-level failures (I/O, subprocess) not attributable to the source.
fn run(args: &Cli) -> anyhow::Result<bool> {
    let files = pipeline::discover_sources(&args.input_dir)?;
    if !args.quiet {
        println!("compiling {} file(s)", files.len());
    }

    let mut pool = Pool::new();
    let mut sink = StderrSink::default();

    let Some((module, mut table)) = pipeline::run_front_end(&mut pool, &mut sink, &files)? else {
        return Ok(false);
    };

    let out_name = out_name(&args.input_dir);
    pipeline::run_back_end(&pool, &mut table, module, args.back_end, &args.output_dir, &out_name, args.debug, args.emit_ir)?;

    Ok(true)
}

fn out_name(input_dir: &std::path::Path) -> String {
    input_dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "module".to_string())
}
