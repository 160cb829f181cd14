//! The fab compiler CLI.
//!
//! - `fabc build <dir>` - compile a model directory and write Go sources
//! - `fabc check <dir>` - compile without writing output
//!
//! Options:
//! - `--out` - output directory (default `<dir>/out`)
//! - `--module` - Go module path for emitted imports (default `app`)

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use fab_codegen::Options;

#[derive(Parser)]
#[command(name = "fabc", version, about = "The fab application compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a model directory and write the generated Go sources
    Build {
        /// Path to the model directory
        dir: PathBuf,

        /// Output directory for generated sources
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Go module path emitted into import strings
        #[arg(long, default_value = "app")]
        module: String,
    },
    /// Compile a model directory without writing output
    Check {
        /// Path to the model directory
        dir: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build { dir, out, module } => build(&dir, out.as_deref(), &module),
        Commands::Check { dir } => check(&dir),
    };
    if let Err(message) = result {
        eprintln!("{message}");
        process::exit(1);
    }
}

fn compile(dir: &Path, module: &str) -> Result<Vec<fab_codegen::GeneratedFile>, String> {
    if !dir.is_dir() {
        return Err(format!("model directory '{}' does not exist", dir.display()));
    }
    let app = fabc::load::load_app(dir).map_err(|e| format!("error: {e}"))?;
    let options = Options {
        module: module.to_string(),
    };
    fabc::compile_app(&app, &options).map_err(|e| fabc::render_error(&app, &e))
}

fn build(dir: &Path, out: Option<&Path>, module: &str) -> Result<(), String> {
    let files = compile(dir, module)?;
    let out = match out {
        Some(p) => p.to_path_buf(),
        None => dir.join("out"),
    };
    for file in &files {
        let path = out.join(&file.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
        }
        std::fs::write(&path, &file.source)
            .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    }
    eprintln!("  Generated {} files to {}", files.len(), out.display());
    Ok(())
}

fn check(dir: &Path) -> Result<(), String> {
    let files = compile(dir, "app")?;
    eprintln!("  OK: {} classes", files.len());
    Ok(())
}
