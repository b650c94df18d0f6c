//! The builder contract

use crossbeam::channel::Receiver;
use kiln_core::{KilnError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Completion of one started build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    /// Process exit code; `-1` when the process could not be started or
    /// was killed by a signal
    pub exit_code: i32,
    pub artifact: PathBuf,
}

impl BuildResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn into_result(self) -> Result<PathBuf> {
        if self.success() {
            Ok(self.artifact)
        } else {
            Err(KilnError::BuildProcessFailed(self.exit_code))
        }
    }
}

/// Assembles a deployable artifact for one platform.
///
/// Builds are asynchronous: [`build_project`](Builder::build_project) only
/// starts one. Completion arrives as a [`BuildResult`] on every receiver
/// obtained from [`subscribe`](Builder::subscribe) before the call, exactly
/// once per started build.
pub trait Builder: Send + Sync {
    /// One-time toolchain setup; later calls return immediately
    fn builder_init(&self) -> Result<()>;

    /// Start a build. Returns `false` when the build was not started because
    /// another one is still in flight on this instance. Failures after that
    /// point are reported through the completion event only.
    fn build_project(&self) -> bool;

    /// Toolchain version, empty when the toolchain is unavailable
    fn builder_version(&self) -> String;

    /// Source suffixes this builder consumes
    fn suffixes(&self) -> &[String];

    /// Recursively collect sources under `root` and publish them as
    /// `${FilesList}`
    fn rescan_sources(&mut self, root: &Path) -> &BTreeSet<PathBuf>;

    fn set_environment(&mut self, include_paths: Vec<PathBuf>, library_paths: Vec<PathBuf>, libraries: Vec<String>);

    /// Stamp a template with this builder's value map
    fn copy_template(&self, src: &Path, dst: &Path) -> bool;

    /// Directory the generated project lives in
    fn project(&self) -> &Path;

    /// Path of the artifact a successful build produces
    fn artifact(&self) -> PathBuf;

    fn subscribe(&self) -> Receiver<BuildResult>;

    /// Sources changed since the last successful build
    fn is_outdated(&self) -> bool;

    fn is_building(&self) -> bool;
}

/// First builder whose toolchain answers a version query
pub fn select_builder(builders: Vec<Box<dyn Builder>>) -> Result<Box<dyn Builder>> {
    for builder in builders {
        let version = builder.builder_version();
        if version.is_empty() {
            continue;
        }
        log::info!("Using toolchain {}", version);
        return Ok(builder);
    }
    Err(KilnError::ToolchainUnavailable(
        "no configured toolchain responded".to_string(),
    ))
}
