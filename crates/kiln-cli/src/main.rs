//! Kiln CLI - Command-line interface for the Kiln content pipeline

mod commands;
mod logger;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{build, convert, init, list, new, status, template, toolchain};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Convert authored assets and build per-platform artifacts", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root (contains kiln.toml)
    #[arg(long, short = 'C', global = true, default_value = ".")]
    project: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new Kiln project
    Init {
        /// Project name/directory
        name: String,
    },

    /// Convert every changed asset under the content directory
    Convert {
        /// Reconvert everything regardless of freshness
        #[arg(long)]
        force: bool,

        /// Worker threads (0 = one per core)
        #[arg(long, short, default_value = "0")]
        jobs: usize,
    },

    /// Show the pipeline state of one asset source
    Status {
        /// Path to the asset source
        source: PathBuf,
    },

    /// List compiled assets recorded in the identity index
    List {
        /// Only assets of this output type (e.g. Prefab, TileSet)
        #[arg(long = "type")]
        type_filter: Option<String>,
    },

    /// Create a new asset source from its template
    New {
        /// Asset suffix (e.g. fab, map)
        suffix: String,

        /// Destination path; the suffix is appended when missing
        destination: PathBuf,
    },

    /// Stamp a template file with key=value substitutions
    Template {
        /// Template file
        src: PathBuf,

        /// Output file
        dst: PathBuf,

        /// Substitution, replaces every ${key} (repeatable)
        #[arg(short = 'D', long = "define", value_parser = parse_define)]
        defines: Vec<(String, String)>,
    },

    /// Check the configured build toolchain
    Toolchain,

    /// Build the project artifact with the configured toolchain
    Build {
        /// Target platform (desktop, web, android)
        #[arg(long)]
        platform: Option<String>,

        /// Deployment target; builds an application instead of a library
        #[arg(long)]
        target: Option<PathBuf>,

        /// Native sources to rescan (default: <project>/src)
        #[arg(long)]
        sources: Option<PathBuf>,
    },
}

fn parse_define(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    match cli.command {
        Commands::Init { name } => init::run(&name),
        Commands::Convert { force, jobs } => convert::run(&cli.project, force, jobs),
        Commands::Status { source } => status::run(&cli.project, &source),
        Commands::List { type_filter } => list::run(&cli.project, type_filter.as_deref()),
        Commands::New {
            suffix,
            destination,
        } => new::run(&cli.project, &suffix, &destination),
        Commands::Template { src, dst, defines } => template::run(&src, &dst, defines),
        Commands::Toolchain => toolchain::run(&cli.project),
        Commands::Build {
            platform,
            target,
            sources,
        } => build::run(build::BuildArgs {
            project: cli.project,
            platform,
            target,
            sources,
        }),
    }
}
