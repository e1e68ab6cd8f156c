//! Command-line front end for the HTL compiler.
//!
//! Reads one template file, or a directory of templates, and writes the
//! emitted `.jsx` modules. All I/O lives here; the compiler core never
//! touches the filesystem.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use htlc::{compile_htl, CompileOptions, CompileOutput, IncrementalCache};

#[derive(Parser)]
#[command(name = "htlc", version, about = "HTL (Sightly) to React compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an .html template (or every .html under a directory) to .jsx.
    Build {
        /// Template file or directory
        input: PathBuf,
        /// Output directory (default: alongside each input file)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Fail on directive misuse instead of degrading with a warning
        #[arg(long)]
        strict: bool,
        /// Recompile even when the source is unchanged
        #[arg(long)]
        no_cache: bool,
        /// Cache location
        #[arg(long, default_value = ".htlc/cache")]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            input,
            out_dir,
            strict,
            no_cache,
            cache_dir,
        } => build_cmd(&input, out_dir.as_deref(), strict, no_cache, &cache_dir),
    }
}

fn build_cmd(
    input: &Path,
    out_dir: Option<&Path>,
    strict: bool,
    no_cache: bool,
    cache_dir: &Path,
) -> Result<()> {
    let opts = CompileOptions { strict };
    let cache = if no_cache {
        None
    } else {
        Some(IncrementalCache::new(cache_dir))
    };

    let files = if input.is_dir() {
        find_templates(input)
    } else {
        vec![input.to_path_buf()]
    };

    if files.is_empty() {
        anyhow::bail!("no .html templates found under {}", input.display());
    }

    let results: Vec<Result<()>> = files
        .par_iter()
        .map(|file| compile_one(file, out_dir, &opts, cache.as_ref()))
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    for result in results {
        if let Err(e) = result {
            eprintln!("[htlc] {:#}", e);
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} templates failed", failed, files.len());
    }
    Ok(())
}

fn find_templates(base_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(base_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "html")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect()
}

fn compile_one(
    file: &Path,
    out_dir: Option<&Path>,
    opts: &CompileOptions,
    cache: Option<&IncrementalCache>,
) -> Result<()> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let file_name = file.display().to_string();

    let (output, from_cache) = match cache.and_then(|c| c.get(&file_name, &source, opts)) {
        Some(cached) => (cached, true),
        None => {
            let output: CompileOutput = compile_htl(&source, &file_name, opts)
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
            if let Some(cache) = cache {
                cache.set(&file_name, &source, opts, &output);
            }
            (output, false)
        }
    };

    for warning in &output.warnings {
        eprintln!("[htlc] warning: {}", warning);
    }

    let out_path = output_path(file, out_dir);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&out_path, &output.code)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    println!(
        "[htlc] {} -> {}{}",
        file.display(),
        out_path.display(),
        if from_cache { " (cached)" } else { "" }
    );
    Ok(())
}

fn output_path(file: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("component");
    let file_name = format!("{}.jsx", stem);
    match out_dir {
        Some(dir) => dir.join(file_name),
        None => file.with_file_name(file_name),
    }
}
