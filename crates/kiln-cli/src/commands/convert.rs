//! Asset conversion command

use anyhow::Result;
use kiln_convert::{ConversionOrchestrator, ConverterRegistry, Outcome};
use kiln_core::ProjectConfig;
use std::path::Path;

pub fn run(project: &Path, force: bool, jobs: usize) -> Result<()> {
    let config = ProjectConfig::load(project)?;
    let orchestrator = ConversionOrchestrator::from_config(&config, ConverterRegistry::with_defaults())?
        .with_force(force)
        .with_jobs(jobs);

    let reports = orchestrator.convert_all()?;

    let (mut converted, mut fresh, mut failed) = (0, 0, 0);
    for report in &reports {
        let source = report
            .source
            .strip_prefix(orchestrator.content_dir())
            .unwrap_or(&report.source);
        match &report.outcome {
            Outcome::UpToDate => fresh += 1,
            Outcome::Converted | Outcome::Copied => {
                converted += 1;
                let reason = report.reason.map(|r| r.to_string()).unwrap_or_default();
                let id = report.identity.map(|i| i.to_string()).unwrap_or_default();
                println!("  {:<40} {}  ({})", source.display(), id, reason);
            }
            Outcome::Aborted => println!("  {:<40} skipped", source.display()),
            Outcome::Failed(message) => {
                failed += 1;
                println!("  {:<40} FAILED: {}", source.display(), message);
            }
        }
    }

    println!(
        "{} converted, {} up to date, {} failed",
        converted, fresh, failed
    );
    if failed > 0 {
        anyhow::bail!("{} asset(s) failed to convert", failed);
    }
    Ok(())
}
