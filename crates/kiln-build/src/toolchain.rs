//! External build toolchains

use kiln_core::{BuildSection, KilnError, Result, TemplateEngine};
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// A native build tool the builders drive
pub trait Toolchain: Send + Sync {
    fn name(&self) -> &str;

    /// Version reported by the tool, `None` when it cannot be run
    fn version(&self) -> Option<String>;

    /// One-time setup (profile detection and the like)
    fn setup(&self) -> Result<()>;

    /// Start a build of the generated project in `project_dir`. Arguments
    /// may reference template values (`${projectName}`, ...).
    fn spawn_build(&self, project_dir: &Path, values: &TemplateEngine) -> Result<Child>;
}

/// Toolchain run as a plain command line
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    program: String,
    version_args: Vec<String>,
    setup_args: Option<Vec<String>>,
    build_args: Vec<String>,
}

impl CommandToolchain {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            version_args: vec!["--version".to_string()],
            setup_args: None,
            build_args: Vec::new(),
        }
    }

    /// Toolchain configured in `[build]`, if any
    pub fn from_config(build: &BuildSection) -> Option<Self> {
        let program = build.toolchain.as_ref()?;
        let mut toolchain = Self::new(program.clone());
        if let Some(args) = &build.version_args {
            toolchain.version_args = args.clone();
        }
        toolchain.setup_args = build.setup_args.clone();
        if let Some(args) = &build.build_args {
            toolchain.build_args = args.clone();
        }
        Some(toolchain)
    }

    pub fn with_version_args<I: IntoIterator<Item = S>, S: Into<String>>(mut self, args: I) -> Self {
        self.version_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_setup_args<I: IntoIterator<Item = S>, S: Into<String>>(mut self, args: I) -> Self {
        self.setup_args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_build_args<I: IntoIterator<Item = S>, S: Into<String>>(mut self, args: I) -> Self {
        self.build_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Toolchain for CommandToolchain {
    fn name(&self) -> &str {
        &self.program
    }

    fn version(&self) -> Option<String> {
        let output = Command::new(&self.program)
            .args(&self.version_args)
            .stdin(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8_lossy(&output.stdout);
        text.lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    fn setup(&self) -> Result<()> {
        let Some(args) = &self.setup_args else {
            return Ok(());
        };
        log::info!("Setting up toolchain {}", self.program);
        let status = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| KilnError::ToolchainUnavailable(format!("{}: {}", self.program, e)))?;
        if status.success() {
            Ok(())
        } else {
            Err(KilnError::ToolchainUnavailable(format!(
                "{} setup exited with {}",
                self.program, status
            )))
        }
    }

    fn spawn_build(&self, project_dir: &Path, values: &TemplateEngine) -> Result<Child> {
        let args: Vec<String> = self.build_args.iter().map(|a| values.render(a)).collect();
        log::debug!("Running {} {}", self.program, args.join(" "));
        Command::new(&self.program)
            .args(&args)
            .current_dir(project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| KilnError::ToolchainUnavailable(format!("{}: {}", self.program, e)))
    }
}

/// Log level for one line of toolchain output
pub fn classify_line(line: &str) -> log::Level {
    let lower = line.to_ascii_lowercase();
    if lower.contains(" error ") || lower.contains(" error:") || lower.starts_with("error") {
        log::Level::Error
    } else if lower.contains(" warning ") || lower.contains(" warning:") || lower.starts_with("warning") {
        log::Level::Warn
    } else {
        log::Level::Info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line("main.cpp:3: error: expected ';'"), log::Level::Error);
        assert_eq!(classify_line("error[E0425]: cannot find value"), log::Level::Error);
        assert_eq!(classify_line("foo.h:1: warning: unused"), log::Level::Warn);
        assert_eq!(classify_line("Compiling hero v0.1.0"), log::Level::Info);
        assert_eq!(classify_line("terrors.cpp compiled"), log::Level::Info);
    }

    #[test]
    fn test_missing_program_has_no_version() {
        let toolchain = CommandToolchain::new("kiln-definitely-not-a-real-tool");
        assert_eq!(toolchain.version(), None);
    }

    #[test]
    fn test_from_config_requires_program() {
        assert!(CommandToolchain::from_config(&BuildSection::default()).is_none());

        let build = BuildSection {
            toolchain: Some("make".into()),
            build_args: Some(vec!["-j4".into()]),
            ..Default::default()
        };
        let toolchain = CommandToolchain::from_config(&build).unwrap();
        assert_eq!(toolchain.program(), "make");
        assert_eq!(toolchain.build_args, vec!["-j4".to_string()]);
        assert_eq!(toolchain.version_args, vec!["--version".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_version_first_line() {
        let toolchain = CommandToolchain::new("sh").with_version_args(["-c", "echo '  tool   1.2.3 '; echo second"]);
        assert_eq!(toolchain.version().as_deref(), Some("tool 1.2.3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_setup_failure_is_unavailable() {
        let toolchain = CommandToolchain::new("sh").with_setup_args(["-c", "exit 2"]);
        assert!(matches!(toolchain.setup(), Err(KilnError::ToolchainUnavailable(_))));
        assert!(CommandToolchain::new("sh").setup().is_ok());
    }
}
