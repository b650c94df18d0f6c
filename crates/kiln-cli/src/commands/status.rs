//! Asset status command

use anyhow::Result;
use kiln_convert::{ConversionOrchestrator, ConverterRegistry};
use kiln_core::ProjectConfig;
use std::path::Path;

pub fn run(project: &Path, source: &Path) -> Result<()> {
    let config = ProjectConfig::load(project)?;
    let orchestrator = ConversionOrchestrator::from_config(&config, ConverterRegistry::with_defaults())?;
    let status = orchestrator.status(source)?;

    println!("Source:      {}", source.display());
    println!("Converter:   {}", status.converter);
    println!("State:       {:?}", status.state);
    match status.identity {
        Some(id) => println!("Identity:    {}", id),
        None => println!("Identity:    (unbound)"),
    }
    println!("Version:     {} (converter {})", status.version, status.format_version);
    if let Some(destination) = &status.destination {
        println!("Destination: {}", destination.display());
    }
    if let Some(icon) = &status.icon {
        println!("Icon:        {}", icon);
    }
    match status.pending {
        Some(reason) => println!("Pending:     {}", reason),
        None => println!("Pending:     up to date"),
    }
    Ok(())
}
