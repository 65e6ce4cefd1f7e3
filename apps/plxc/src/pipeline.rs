//! Discovers source files, runs the front-end/middle-end pipeline, and
//! hands the checked, folded tree to the selected back-end.

use std::path::Path;

use anyhow::Context;
use walkdir::WalkDir;

use plx_ast::Pool;
use plx_diagnostics::DiagnosticSink;

use crate::cli::BackEnd;

/// Reads every `.plx` file directly inside `input_dir` (sub-directories are
/// skipped) as bytes, sorted by path so a build is reproducible.
pub fn discover_sources(input_dir: &Path) -> anyhow::Result<Vec<(String, Vec<u8>)>> {
    if !input_dir.is_dir() {
        anyhow::bail!("input directory not found: {}", input_dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "plx") {
            let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            files.push((path.to_string_lossy().into_owned(), bytes));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    if files.is_empty() {
        anyhow::bail!("no .plx files found in {}", input_dir.display());
    }
    Ok(files)
}

/// Runs parse → resolve/typecheck/return-check → fold → validate, halting
/// before any later stage as soon as an earlier one reports failure.
///
/// Returns `Ok(None)` when a stage failed and reported diagnostics (the
/// caller should exit nonzero without treating it as an `anyhow` failure);
/// `Err` is reserved for failures the compiler itself can't attribute to the
/// user's source (I/O, and so on).
pub fn run_front_end(pool: &mut Pool, sink: &mut dyn DiagnosticSink, files: &[(String, Vec<u8>)]) -> anyhow::Result<Option<(plx_ast::NodeId, plx_sema::SymbolTable)>> {
    let (module, parse_ok) = plx_parser::parse_program(pool, sink, files);
    if !parse_ok {
        return Ok(None);
    }

    let Some((mut table, _prims)) = plx_sema::analyze(pool, sink, module) else {
        return Ok(None);
    };

    plx_fold::fold_module(pool, &mut table, module);
    if !plx_fold::validate_module(pool, sink, module) {
        return Ok(None);
    }

    Ok(Some((module, table)))
}

/// Lowers the checked, folded tree with the requested back-end and writes
/// the resulting artifact(s) under `output_dir/<outname>`.
pub fn run_back_end(pool: &Pool, table: &mut plx_sema::SymbolTable, module: plx_ast::NodeId, back_end: BackEnd, output_dir: &Path, out_name: &str, debug: bool, emit_ir: bool) -> anyhow::Result<()> {
    std::fs::create_dir_all(output_dir).with_context(|| format!("creating {}", output_dir.display()))?;

    match back_end {
        BackEnd::Llvm => {
            let ir = plx_llvm_codegen::codegen_module(pool, table, module, out_name).map_err(|e| anyhow::anyhow!("{e}"))?;
            if emit_ir {
                println!("{ir}");
            }
            let ir_path = output_dir.join(format!("{out_name}.ll"));
            let exe_path = output_dir.join(format!("{out_name}.exe"));
            let mode = if debug { plx_llvm_codegen::OptimizationMode::Debug } else { plx_llvm_codegen::OptimizationMode::Release };
            plx_llvm_codegen::link_executable(&ir, &ir_path, &exe_path, mode).context("linking native executable")?;
        }
        BackEnd::Wasm => {
            let bytes = plx_wasm_codegen::codegen_module(pool, module).map_err(|e| anyhow::anyhow!("{e}"))?;
            let wasm_path = output_dir.join(format!("{out_name}.wasm"));
            std::fs::write(&wasm_path, &bytes).with_context(|| format!("writing {}", wasm_path.display()))?;
        }
    }
    Ok(())
}
