//! Command line inspector for glTF and GLB files.
//!
//! Loads a file with the ingest library and prints its container layout,
//! top-level counts, and optionally accessor and mesh details.

mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use redlilium_ingest::{IngestError, IngestOptions, Loader, load_options};

/// glTF/GLB inspector arguments.
#[derive(Parser, Debug)]
#[command(
    name = "redlilium-inspect",
    version,
    about = "Inspect glTF and GLB files",
    long_about = "Loads a glTF or GLB file with the RedLilium ingest library and prints \
                  its container layout, top-level array counts, accessor metadata and \
                  decoded mesh statistics."
)]
struct Args {
    /// File to inspect (.glb or .gltf).
    file: PathBuf,

    /// TOML file with ingest options.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print one line per accessor.
    #[arg(long)]
    accessors: bool,

    /// Decode every mesh and print per-primitive statistics.
    #[arg(long)]
    meshes: bool,

    /// Print the top-level keys of the JSON document.
    #[arg(long)]
    json_keys: bool,
}

fn run(args: &Args) -> Result<(), IngestError> {
    let options = match &args.config {
        Some(path) => load_options(path)?,
        None => IngestOptions::default(),
    };
    let asset = Loader::new().with_options(options).load_file(&args.file)?;

    report::print_summary(&args.file, &asset);
    if args.json_keys {
        report::print_json_keys(&asset);
    }
    if args.accessors {
        report::print_accessors(&asset);
    }
    if args.meshes {
        report::print_meshes(&asset)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    redlilium_ingest::init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}: {e}", args.file.display());
            ExitCode::FAILURE
        }
    }
}
