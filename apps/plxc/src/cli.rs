//! Command line argument parsing for the `plx` compiler.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackEnd {
    Llvm,
    Wasm,
}

/// `plxc` compiles every `.plx` file in a directory into one module and
/// lowers it to either a native executable (via textual LLVM IR) or a
/// binary WebAssembly module.
#[derive(Parser)]
#[command(name = "plxc", author, version, about = "plx compiler driver", disable_version_flag = true)]
pub struct Cli {
    /// Print version information and exit.
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    pub version: (),

    /// Directory to read `.plx` source files from. Sub-directories are
    /// skipped; the search is not recursive.
    #[arg(default_value = ".")]
    pub input_dir: PathBuf,

    /// Directory to write the generated artifact into.
    #[arg(short = 'o', long = "output", default_value = ".")]
    pub output_dir: PathBuf,

    /// Build the LLVM back-end's native executable with no optimizations
    /// (`-O0`) instead of the release default (`-O3 -ffast-math`).
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Which back-end lowers the checked, folded tree.
    #[arg(short = 'b', long = "back-end", value_enum, default_value_t = BackEnd::Llvm)]
    pub back_end: BackEnd,

    /// LLVM back-end only: also print the generated `.ll` text to stdout.
    #[arg(long = "emit-ir")]
    pub emit_ir: bool,

    /// Suppress the "compiling N files" progress line. Diagnostics on
    /// stderr are never suppressed.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}
