//! Bomtree CLI - Command-line interface for Bomtree
//!
//! Reads the flat node records a PLM backend returns for one or more
//! designs and prints the reconstructed assembly tree, rollups and search
//! results.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "bomtree")]
#[command(author = "Bomtree Contributors")]
#[command(version)]
#[command(about = "Bill-of-materials hierarchy engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Build the hierarchy and report data-integrity warnings
    Check {
        /// JSON file of node records, or - for stdin
        input: PathBuf,

        /// Fail when any warning is raised
        #[arg(long)]
        strict: bool,
    },

    /// Print the assembly tree with quantities and rollups
    Tree {
        /// JSON file of node records, or - for stdin
        input: PathBuf,

        /// Only this design (defaults to every design in the input)
        #[arg(short, long)]
        design: Option<String>,

        /// Levels to show below each root (defaults to the configured depth)
        #[arg(long)]
        depth: Option<usize>,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Print aggregate metrics per design
    Summary {
        /// JSON file of node records, or - for stdin
        input: PathBuf,

        /// Only this design (defaults to every design in the input)
        #[arg(short, long)]
        design: Option<String>,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Search nodes by text and type, keeping their containing assemblies
    Search {
        /// JSON file of node records, or - for stdin
        input: PathBuf,

        /// Text to find in names, part numbers and reference designators
        query: String,

        /// Only this design (defaults to every design in the input)
        #[arg(short, long)]
        design: Option<String>,

        /// Only nodes of this type (assembly, subassembly, part, hardware)
        #[arg(short = 't', long = "type")]
        node_type: Option<String>,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = match cli.command {
        Commands::Init { path } => commands::init(&path),
        Commands::Check { input, strict } => commands::check(&input, strict),
        Commands::Tree {
            input,
            design,
            depth,
            json,
        } => commands::tree(&input, design.as_deref(), depth, json),
        Commands::Summary {
            input,
            design,
            json,
        } => commands::summary(&input, design.as_deref(), json),
        Commands::Search {
            input,
            query,
            design,
            node_type,
            json,
        } => commands::search(
            &input,
            &query,
            design.as_deref(),
            node_type.as_deref(),
            json,
        ),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
