//! Layered project configuration
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `KILN_SDK_PATH`, `KILN_TARGET_PATH`, `KILN_TOOLCHAIN`
//! 2. Project-local: `kiln.toml` at the project root
//! 3. Global: `~/.kiln/config.toml`

use crate::error::{KilnError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the project-local config
pub const PROJECT_FILE: &str = "kiln.toml";

/// `[project]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    /// Authored asset sources
    #[serde(default)]
    pub content: Option<PathBuf>,
    /// Compiled resources, sidecar-referenced destinations and the index
    #[serde(default)]
    pub import: Option<PathBuf>,
    /// Generated build project sources
    #[serde(default)]
    pub generated: Option<PathBuf>,
    /// Template files used by `kiln new` and the builders
    #[serde(default)]
    pub templates: Option<PathBuf>,
    /// Explicit deployment target; selects application-style artifacts
    #[serde(default)]
    pub target: Option<PathBuf>,
}

/// `[build]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSection {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub sdk: Option<PathBuf>,
    /// Toolchain program (looked up on PATH when not absolute)
    #[serde(default)]
    pub toolchain: Option<String>,
    #[serde(default)]
    pub version_args: Option<Vec<String>>,
    #[serde(default)]
    pub setup_args: Option<Vec<String>>,
    #[serde(default)]
    pub build_args: Option<Vec<String>>,
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
    #[serde(default)]
    pub library_paths: Vec<PathBuf>,
    #[serde(default)]
    pub libraries: Vec<String>,
}

/// On-disk shape shared by every layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    project: ProjectSection,
    #[serde(default)]
    build: BuildSection,
}

/// Resolved configuration for one project root
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub root: PathBuf,
    pub project: ProjectSection,
    pub build: BuildSection,
}

impl ProjectConfig {
    /// Load config for `root` with layered precedence: global < project < env vars
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut config = ConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                Self::merge_into(&mut config, Self::load_file(&global_path)?);
            }
        }

        let local_path = root.join(PROJECT_FILE);
        if local_path.exists() {
            Self::merge_into(&mut config, Self::load_file(&local_path)?);
        }

        Self::apply_env_overrides(&mut config);
        Ok(Self::resolve(root, config))
    }

    /// Load config from a specific file path only, rooted at its directory
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config);
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::resolve(root, config))
    }

    /// Defaults only, no files or environment
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        Self::resolve(root.as_ref().to_path_buf(), ConfigFile::default())
    }

    /// Project name, defaulting to the root directory name
    pub fn name(&self) -> String {
        self.project
            .name
            .clone()
            .or_else(|| {
                self.root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "project".to_string())
    }

    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(self.project.content.as_deref(), "content")
    }

    pub fn import_dir(&self) -> PathBuf {
        self.resolve_path(self.project.import.as_deref(), "import")
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.resolve_path(self.project.generated.as_deref(), "generated")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.resolve_path(self.project.templates.as_deref(), "templates")
    }

    pub fn target_path(&self) -> Option<PathBuf> {
        self.project.target.as_ref().map(|p| self.root.join(p))
    }

    pub fn sdk_path(&self) -> Option<PathBuf> {
        self.build.sdk.as_ref().map(|p| self.root.join(p))
    }

    fn resolve_path(&self, configured: Option<&Path>, default: &str) -> PathBuf {
        self.root.join(configured.unwrap_or_else(|| Path::new(default)))
    }

    fn resolve(root: PathBuf, config: ConfigFile) -> Self {
        // Builders run toolchains from the generated project directory, so
        // every path published from here on must not depend on the cwd
        let root = std::path::absolute(&root).unwrap_or(root);
        let mut build = config.build;
        build.include_paths = build.include_paths.iter().map(|p| root.join(p)).collect();
        build.library_paths = build.library_paths.iter().map(|p| root.join(p)).collect();
        Self {
            root,
            project: config.project,
            build,
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".kiln").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<ConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            KilnError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge_into(base: &mut ConfigFile, overlay: ConfigFile) {
        let (p, o) = (&mut base.project, overlay.project);
        if o.name.is_some() {
            p.name = o.name;
        }
        if o.company.is_some() {
            p.company = o.company;
        }
        if o.content.is_some() {
            p.content = o.content;
        }
        if o.import.is_some() {
            p.import = o.import;
        }
        if o.generated.is_some() {
            p.generated = o.generated;
        }
        if o.templates.is_some() {
            p.templates = o.templates;
        }
        if o.target.is_some() {
            p.target = o.target;
        }

        let (b, o) = (&mut base.build, overlay.build);
        if o.platform.is_some() {
            b.platform = o.platform;
        }
        if o.sdk.is_some() {
            b.sdk = o.sdk;
        }
        if o.toolchain.is_some() {
            b.toolchain = o.toolchain;
        }
        if o.version_args.is_some() {
            b.version_args = o.version_args;
        }
        if o.setup_args.is_some() {
            b.setup_args = o.setup_args;
        }
        if o.build_args.is_some() {
            b.build_args = o.build_args;
        }
        // Lists accumulate: global search paths first, project paths after
        b.include_paths.extend(o.include_paths);
        b.library_paths.extend(o.library_paths);
        b.libraries.extend(o.libraries);
    }

    fn apply_env_overrides(config: &mut ConfigFile) {
        if let Ok(sdk) = std::env::var("KILN_SDK_PATH") {
            config.build.sdk = Some(PathBuf::from(sdk));
        }
        if let Ok(target) = std::env::var("KILN_TARGET_PATH") {
            config.project.target = Some(PathBuf::from(target));
        }
        if let Ok(toolchain) = std::env::var("KILN_TOOLCHAIN") {
            config.build.toolchain = Some(toolchain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kiln_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(PROJECT_FILE);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_config_from_file() {
        let path = temp_config(
            r#"
[project]
name = "Hero Quest"
company = "Acme"
content = "assets"

[build]
platform = "web"
include_paths = ["include"]
libraries = ["engine"]
"#,
        );
        let root = path.parent().unwrap().to_path_buf();
        let config = ProjectConfig::load_from_file(&path).unwrap();

        assert_eq!(config.name(), "Hero Quest");
        assert_eq!(config.project.company.as_deref(), Some("Acme"));
        assert_eq!(config.content_dir(), root.join("assets"));
        assert_eq!(config.import_dir(), root.join("import"));
        assert_eq!(config.build.platform.as_deref(), Some("web"));
        assert_eq!(config.build.include_paths, vec![root.join("include")]);
        assert_eq!(config.build.libraries, vec!["engine".to_string()]);

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let path = temp_config("[project\nname = ");
        let err = ProjectConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, KilnError::ConfigError(_)));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_merge_overlay_wins_and_lists_accumulate() {
        let mut base = ConfigFile::default();
        base.project.name = Some("global".into());
        base.project.company = Some("Acme".into());
        base.build.libraries = vec!["core".into()];

        let mut overlay = ConfigFile::default();
        overlay.project.name = Some("local".into());
        overlay.build.libraries = vec!["game".into()];

        ProjectConfig::merge_into(&mut base, overlay);
        assert_eq!(base.project.name.as_deref(), Some("local"));
        assert_eq!(base.project.company.as_deref(), Some("Acme"));
        assert_eq!(base.build.libraries, vec!["core".to_string(), "game".to_string()]);
    }

    #[test]
    fn test_defaults_from_root() {
        let config = ProjectConfig::with_root("/work/Hero");
        assert_eq!(config.name(), "Hero");
        assert_eq!(config.generated_dir(), PathBuf::from("/work/Hero/generated"));
        assert!(config.target_path().is_none());
    }

    #[test]
    fn test_relative_root_becomes_absolute() {
        let config = ProjectConfig::with_root(".");
        let cwd = std::env::current_dir().unwrap();
        assert!(config.root.is_absolute());
        assert_eq!(config.root, cwd);
        assert_eq!(config.content_dir(), cwd.join("content"));

        let mut file = ConfigFile::default();
        file.build.include_paths = vec![PathBuf::from("include")];
        let config = ProjectConfig::resolve(PathBuf::from("hero"), file);
        assert_eq!(config.build.include_paths, vec![cwd.join("hero/include")]);
    }
}
