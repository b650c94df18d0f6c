//! Create an asset source from a template

use anyhow::Result;
use kiln_convert::{ConversionOrchestrator, ConverterRegistry};
use kiln_core::ProjectConfig;
use std::path::{Path, PathBuf};

pub fn run(project: &Path, suffix: &str, destination: &Path) -> Result<()> {
    let config = ProjectConfig::load(project)?;
    let orchestrator = ConversionOrchestrator::from_config(&config, ConverterRegistry::with_defaults())?;

    let created = orchestrator.create_from_template(suffix, &content_path(&config, destination))?;
    println!("Created {}", created.display());
    Ok(())
}

/// Relative destinations live under the content directory
fn content_path(config: &ProjectConfig, destination: &Path) -> PathBuf {
    if destination.is_absolute() {
        destination.to_path_buf()
    } else {
        config.content_dir().join(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_new_lands_in_content_dir() {
        let dir = std::env::temp_dir().join(format!("kiln_new_{}", uuid::Uuid::new_v4()));
        let project = dir.join("hero");
        crate::commands::init::run(project.to_str().unwrap()).unwrap();

        run(&project, "fab", Path::new("prefabs/Hero")).unwrap();

        let created = fs::read_to_string(project.join("content/prefabs/Hero.fab")).unwrap();
        assert!(created.contains("\"Name\": \"Hero\""));
        assert!(!Path::new("prefabs/Hero.fab").exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_destination_is_kept() {
        let config = ProjectConfig::with_root("/work/hero");
        assert_eq!(
            content_path(&config, Path::new("/tmp/a.fab")),
            PathBuf::from("/tmp/a.fab")
        );
        assert_eq!(
            content_path(&config, Path::new("maps/a")),
            PathBuf::from("/work/hero/content/maps/a")
        );
    }
}
