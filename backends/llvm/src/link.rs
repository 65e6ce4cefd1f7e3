//! Invokes an external native toolchain to turn textual LLVM IR into an
//! executable.
//!
//! This mirrors the WebAssembly back-end's own external-toolchain idiom
//! (write intermediate file, shell out, read back the result) but targets a
//! system C compiler instead of a bundled LLVM fork, since the native
//! target needs no fixed triple or custom intrinsics.

use std::path::Path;
use std::process::Command;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptimizationMode {
    Release,
    Debug,
}

impl OptimizationMode {
    fn flags(self) -> &'static [&'static str] {
        match self {
            OptimizationMode::Release => &["-O3", "-ffast-math"],
            OptimizationMode::Debug => &["-O0"],
        }
    }
}

/// Writes `ir` to `ir_path`, then invokes a C-family compiler found on
/// `PATH` to assemble and link it into the executable at `output_path`.
///
/// # Errors
///
/// Returns an error if the IR cannot be written, no compiler is found, or
/// the compiler exits with a non-zero status — in which case the message
/// includes its complete stderr output.
pub fn link_executable(ir: &str, ir_path: &Path, output_path: &Path, mode: OptimizationMode) -> anyhow::Result<()> {
    std::fs::write(ir_path, ir)?;

    let compiler = locate_c_compiler()?;
    let mut cmd = Command::new(&compiler);
    cmd.args(mode.flags()).arg(ir_path).arg("-o").arg(output_path);
    let output = cmd.output().map_err(|e| anyhow::anyhow!("failed to spawn {compiler}: {e}"))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "{compiler} failed with status: {}\nstderr: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(())
}

/// Picks the first working C compiler off a short, ordered list rather than
/// requiring one specific name: `CC`, when set, always wins.
fn locate_c_compiler() -> anyhow::Result<String> {
    if let Ok(cc) = std::env::var("CC") {
        return Ok(cc);
    }
    for candidate in ["clang", "cc", "gcc"] {
        if Command::new(candidate).arg("--version").output().is_ok_and(|o| o.status.success()) {
            return Ok(candidate.to_string());
        }
    }
    Err(anyhow::anyhow!(
        "no C compiler found on PATH (tried clang, cc, gcc); set the CC environment variable to override"
    ))
}
