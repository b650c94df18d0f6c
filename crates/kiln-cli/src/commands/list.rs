//! List compiled assets from the identity index

use anyhow::Result;
use kiln_convert::{ConversionOrchestrator, ConverterRegistry};
use kiln_core::ProjectConfig;
use std::path::Path;

pub fn run(project: &Path, type_filter: Option<&str>) -> Result<()> {
    let config = ProjectConfig::load(project)?;
    let orchestrator = ConversionOrchestrator::from_config(&config, ConverterRegistry::with_defaults())?;
    let index = orchestrator.index();

    let ids = match type_filter {
        Some(ty) => index.by_type(ty),
        None => index.ids(),
    };
    for id in &ids {
        let Some(entry) = index.get(*id) else {
            continue;
        };
        let source = entry
            .source
            .strip_prefix(orchestrator.content_dir())
            .unwrap_or(&entry.source);
        println!("{}  {:<10} {}", id, entry.type_identifier, source.display());
    }
    println!("{} asset(s)", ids.len());
    Ok(())
}
