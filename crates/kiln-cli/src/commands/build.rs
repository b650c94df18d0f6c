//! Project build command

use anyhow::Result;
use kiln_build::{select_builder, CodeBuilder};
use kiln_core::{KilnError, ProjectConfig};
use std::path::PathBuf;

pub struct BuildArgs {
    pub project: PathBuf,
    pub platform: Option<String>,
    pub target: Option<PathBuf>,
    pub sources: Option<PathBuf>,
}

pub fn run(args: BuildArgs) -> Result<()> {
    let mut config = ProjectConfig::load(&args.project)?;
    if args.platform.is_some() {
        config.build.platform = args.platform;
    }
    if args.target.is_some() {
        config.project.target = args.target;
    }

    let builder = CodeBuilder::from_config(&config)?;
    let mut builder = select_builder(vec![Box::new(builder)])?;

    let sources = match args.sources {
        Some(dir) => std::path::absolute(&dir)?,
        None => config.root.join("src"),
    };
    let found = builder.rescan_sources(&sources).len();
    println!("{} source file(s) under {}", found, sources.display());

    // Register before starting so the completion cannot be missed
    let completion = builder.subscribe();
    if !builder.build_project() {
        return Err(KilnError::BuildInProgress(config.name()).into());
    }

    let result = completion.recv()?;
    let artifact = result.into_result()?;
    println!("Built {}", artifact.display());
    Ok(())
}
