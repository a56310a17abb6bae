//! lattice - mesh interchange CLI
//!
//! Thin command-line shell around the session orchestrator: inspect a
//! mesh file's normalized scene, convert it to another format, or list
//! the supported formats. Upload transport and on-screen rendering belong
//! to external collaborators; this binary only moves bytes in and out.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lattice_core::MeshFormat;
use lattice_session::{LoadOutcome, Session};

mod settings;

use settings::Settings;

#[derive(Parser)]
#[command(
    name = "lattice",
    version,
    about = "Decode, normalize, and convert 3D mesh files",
    long_about = "Decode OBJ, STL, PLY, and glTF/GLB files into a canonical scene,\n\
                  recenter it for viewing, and re-export it in any other supported\n\
                  format. Formats that cannot carry color, UV, or material data\n\
                  drop it on export."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a mesh file and report its normalized scene
    Inspect {
        /// Input file; the format tag is taken from the extension
        file: PathBuf,
    },
    /// Convert a mesh file to another format
    Convert {
        /// Input file; the format tag is taken from the extension
        file: PathBuf,
        /// Target format tag: obj, stl, ply, gltf, or glb
        #[arg(long = "to")]
        target: String,
        /// Output path; defaults to the input basename with the target
        /// extension, in the configured output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the supported formats and their delivery content types
    Formats,
}

fn format_tag(path: &Path) -> Result<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .with_context(|| format!("{} has no format extension", path.display()))
}

fn basename(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_string()
}

async fn load_file(session: &Session, file: &Path) -> Result<lattice_session::SceneSummary> {
    let tag = format_tag(file)?;
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let outcome = session
        .load(bytes, &tag, &basename(file))
        .await
        .with_context(|| format!("failed to load {}", file.display()))?;
    match outcome {
        LoadOutcome::Loaded(summary) => Ok(summary),
        LoadOutcome::Superseded => bail!("load was superseded by a newer request"),
    }
}

async fn inspect(file: &Path) -> Result<()> {
    let session = Session::new();
    let summary = load_file(&session, file).await?;

    println!("format:    {}", summary.source_format);
    println!("meshes:    {}", summary.mesh_count);
    println!("vertices:  {}", summary.vertex_count);
    println!("triangles: {}", summary.triangle_count);
    let camera = summary.camera;
    println!(
        "camera:    ({:.3}, {:.3}, {:.3}) looking at the origin",
        camera.position.x, camera.position.y, camera.position.z
    );
    Ok(())
}

async fn convert(
    file: &Path,
    target: &str,
    output: Option<PathBuf>,
    settings: &Settings,
) -> Result<()> {
    let session = Session::new();
    load_file(&session, file).await?;

    let exported = session
        .export(target)
        .await
        .with_context(|| format!("failed to convert {} to {target}", file.display()))?;

    let path = output.unwrap_or_else(|| settings.output.directory.join(&exported.filename));
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(&path, &exported.bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(
        path = %path.display(),
        content_type = exported.content_type,
        len = exported.bytes.len(),
        "wrote export"
    );
    println!("{}", path.display());
    Ok(())
}

fn formats() {
    for format in MeshFormat::ALL {
        println!("{:<5} {}", format.extension(), format.content_type());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load();

    let default_filter = if cli.verbose || settings.logging.verbose {
        "debug"
    } else {
        "info"
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set subscriber")?;

    match cli.command {
        Commands::Inspect { file } => inspect(&file).await,
        Commands::Convert {
            file,
            target,
            output,
        } => convert(&file, &target, output, &settings).await,
        Commands::Formats => {
            formats();
            Ok(())
        }
    }
}
