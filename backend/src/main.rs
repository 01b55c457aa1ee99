//! Limpieza CLI - Clean workforce CSV exports
//!
//! # Main Commands
//!
//! ```bash
//! limpieza serve                                   # Start HTTP server (port 3000)
//! limpieza clean -t topes -o salida a.csv b.csv    # Clean files with one transform
//! limpieza process rq --input-dir entrada --output-dir salida
//! ```
//!
//! # Inspection
//!
//! ```bash
//! limpieza transforms              # List available transforms
//! limpieza show programadas        # Show a transform's schema as JSON
//! ```

use clap::{Parser, Subcommand};
use limpieza::{
    archive_name, zip_outputs, Dispatcher, FileOutcome, FolderConfig, ProcessingResult,
    ServerConfig, TransformRegistry,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "limpieza")]
#[command(about = "Clean and normalize workforce CSV exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available transforms
    Transforms {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the schema of a transform as JSON
    Show {
        /// Transform name or alias
        name: String,
    },

    /// Clean files with a transform (procesado_(<timestamp>)_<name> outputs)
    Clean {
        /// Transform name or alias
        #[arg(short, long)]
        transform: String,

        /// Output folder
        #[arg(short, long)]
        output: PathBuf,

        /// Also package the results into resultados_<timestamp>.zip
        #[arg(long)]
        zip: bool,

        /// Input CSV files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Clean every CSV of a folder (limpio_<name> outputs)
    Process {
        /// Transform name or alias
        name: String,

        /// Folder with the input CSV files
        #[arg(long)]
        input_dir: PathBuf,

        /// Folder for the cleaned files
        #[arg(long)]
        output_dir: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: LIMPIEZA_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let registry = Arc::new(TransformRegistry::with_builtin());

    let result = match cli.command {
        Commands::Transforms { json } => cmd_transforms(&registry, json),

        Commands::Show { name } => cmd_show(&registry, &name),

        Commands::Clean {
            transform,
            output,
            zip,
            files,
        } => cmd_clean(registry, &transform, &output, zip, &files),

        Commands::Process {
            name,
            input_dir,
            output_dir,
        } => cmd_process(&registry, &name, input_dir, output_dir),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_transforms(registry: &TransformRegistry, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let transforms = registry.list();
    if json {
        println!("{}", serde_json::to_string_pretty(&transforms)?);
        return Ok(());
    }

    eprintln!("📋 Available transforms ({}):\n", transforms.len());
    for t in transforms {
        println!("  📄 {}", t.name);
        println!("     {}", t.description);
        if !t.aliases.is_empty() {
            println!("     Aliases: {}", t.aliases.join(", "));
        }
        println!();
    }
    Ok(())
}

fn cmd_show(registry: &TransformRegistry, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let transform = registry
        .get(name)
        .ok_or_else(|| format!("Unknown transform: {}", name))?;
    match transform.schema() {
        Some(schema) => println!("{}", schema.to_json()?),
        None => println!("{}: {}", transform.name(), transform.description()),
    }
    Ok(())
}

fn cmd_clean(
    registry: Arc<TransformRegistry>,
    transform: &str,
    output: &Path,
    zip: bool,
    files: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = Dispatcher::new(registry, output);
    let report = dispatcher.run_detailed(transform, files)?;

    eprintln!("\n📊 Results for '{}':", report.transform);
    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Processed { input, output, summary } => {
                eprintln!(
                    "   ✅ {} → {} ({} rows, {} row errors)",
                    input.display(),
                    output.display(),
                    summary.rows_written,
                    summary.row_errors
                );
            }
            FileOutcome::Failed { input, reason } => {
                eprintln!("   ❌ {}: {}", input.display(), reason);
            }
        }
    }

    let outputs = report.outputs();
    if outputs.is_empty() {
        return Err("No files were processed successfully".into());
    }

    if zip {
        let dest = output.join(archive_name());
        zip_outputs(&outputs, &dest)?;
        eprintln!("   💾 Archive: {}", dest.display());
    }

    eprintln!("\n✨ Done! {} of {} file(s) processed", outputs.len(), files.len());
    Ok(())
}

fn cmd_process(
    registry: &TransformRegistry,
    name: &str,
    input_dir: PathBuf,
    output_dir: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let transform = registry
        .get(name)
        .ok_or_else(|| format!("Unknown transform: {}", name))?;

    let results = transform.process(&FolderConfig::new(input_dir, output_dir))?;
    if results.is_empty() {
        eprintln!("📂 No CSV files found");
        return Ok(());
    }

    let failed = results
        .iter()
        .filter(|r| matches!(r, ProcessingResult::Failed { .. }))
        .count();
    eprintln!("\n📊 {} cleaned, {} failed", results.len() - failed, failed);
    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::from_env()?;
    if let Some(port) = port {
        config = config.with_port(port);
    }
    limpieza::server::start_server(config).await
}
