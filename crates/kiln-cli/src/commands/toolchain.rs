//! Toolchain check command

use anyhow::Result;
use kiln_build::{Builder, CodeBuilder};
use kiln_core::{KilnError, ProjectConfig};
use std::path::Path;

pub fn run(project: &Path) -> Result<()> {
    let config = ProjectConfig::load(project)?;
    let builder = CodeBuilder::from_config(&config)?;

    let version = builder.builder_version();
    if version.is_empty() {
        return Err(KilnError::ToolchainUnavailable(format!(
            "{} did not report a version",
            config.build.toolchain.as_deref().unwrap_or_default()
        ))
        .into());
    }

    println!("Toolchain: {}", version);
    println!("Platform:  {}", builder.platform());
    println!("Project:   {}", builder.project().display());
    println!("Artifact:  {}", builder.artifact().display());
    Ok(())
}
