//! Darex: exports in-memory annotation datasets to V7 Darwin JSON.
//!
//! Darex takes a collection of annotated images and videos (polygons,
//! bounding boxes, keypoints and friends, plus authorship metadata) and
//! writes one Darwin-layout JSON document per file into a target
//! directory. It is a pure data-to-data transformer: no network, no
//! state beyond the written files.
//!
//! # Modules
//!
//! - [`model`]: The annotation model (AnnotationFile, Annotation, etc.)
//! - [`export`]: Format writers, currently the Darwin JSON writer
//! - [`error`]: Error types for darex operations

pub mod error;
pub mod export;
pub mod model;

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::DarexError;

/// The darex CLI application.
#[derive(Parser)]
#[command(name = "darex")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Export an annotation manifest as Darwin JSON files.
    Export(ExportArgs),
}

/// Arguments for the export subcommand.
#[derive(clap::Args)]
struct ExportArgs {
    /// Input manifest: a JSON array of annotation-file records.
    input: PathBuf,

    /// Directory the Darwin JSON files are written to.
    #[arg(long, short = 'o', default_value = ".")]
    output_dir: PathBuf,
}

/// Run the darex CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), DarexError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Export(args)) => run_export(args),
        None => {
            // No subcommand: just print a usage hint and exit successfully
            println!("darex {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Exports annotation datasets to V7 Darwin JSON.");
            println!();
            println!("Run 'darex --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the export subcommand.
fn run_export(args: ExportArgs) -> Result<(), DarexError> {
    let annotation_files = model::io_json::read_manifest_json(&args.input)?;

    // CLI convenience only; the library-level exporter expects the
    // directory to exist and propagates the write failure otherwise.
    fs::create_dir_all(&args.output_dir)?;

    export::darwin::export(&annotation_files, &args.output_dir)?;

    println!(
        "Exported {} file(s) to {}",
        annotation_files.len(),
        args.output_dir.display()
    );
    Ok(())
}
