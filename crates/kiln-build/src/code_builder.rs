//! Native code builder driving an external toolchain

use crate::builder::{BuildResult, Builder};
use crate::platform::Platform;
use crate::toolchain::{classify_line, CommandToolchain, Toolchain};
use crossbeam::channel::{unbounded, Receiver, Sender};
use kiln_core::{
    format_list, KilnError, ListStyle, ProjectConfig, Result, SourceScanner, TemplateEngine,
};
use std::collections::BTreeSet;
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

/// Suffixes of native sources picked up by a rescan
pub const NATIVE_SUFFIXES: &[&str] = &["h", "hpp", "c", "cc", "cpp"];

/// Lower-cased project name with spaces and underscores removed, usable as
/// an identifier in generated code
pub fn id_name(project_name: &str) -> String {
    project_name
        .chars()
        .filter(|c| *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// State shared with the thread waiting on a running build
#[derive(Default)]
struct BuildState {
    in_flight: AtomicBool,
    outdated: AtomicBool,
    subscribers: Mutex<Vec<Sender<BuildResult>>>,
}

impl BuildState {
    fn finish(&self, result: BuildResult) {
        if result.success() {
            self.outdated.store(false, Ordering::SeqCst);
            log::info!("Build finished: {}", result.artifact.display());
        } else {
            log::error!("Build failed with exit code {}", result.exit_code);
        }

        // Hold the subscriber lock across the flag reset so a build started
        // right after cannot publish its event before this one
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        self.in_flight.store(false, Ordering::SeqCst);
        subscribers.retain(|tx| tx.send(result.clone()).is_ok());
    }
}

/// Builds a generated native project for one platform
pub struct CodeBuilder {
    name: String,
    platform: Platform,
    project_dir: PathBuf,
    target: Option<PathBuf>,
    suffixes: Vec<String>,
    toolchain: Arc<dyn Toolchain>,
    engine: TemplateEngine,
    /// Template file → path relative to the project directory
    templates: Vec<(PathBuf, PathBuf)>,
    sources: BTreeSet<PathBuf>,
    include_paths: Vec<PathBuf>,
    library_paths: Vec<PathBuf>,
    libraries: Vec<String>,
    initialized: Mutex<bool>,
    state: Arc<BuildState>,
}

impl CodeBuilder {
    pub fn new<P: AsRef<Path>>(
        name: impl Into<String>,
        platform: Platform,
        project_dir: P,
        toolchain: Arc<dyn Toolchain>,
    ) -> Self {
        let name = name.into();
        let mut engine = TemplateEngine::new();
        engine.set("projectName", name.clone());
        engine.set("idName", id_name(&name));
        engine.set("company", "");
        engine.set("sdkPath", "");
        engine.set("includePaths", "");
        engine.set("libraryPaths", "");
        engine.set("libraries", "");
        engine.set("FilesList", "");

        let state = BuildState::default();
        // Nothing has been built yet
        state.outdated.store(true, Ordering::SeqCst);

        Self {
            name,
            platform,
            project_dir: project_dir.as_ref().to_path_buf(),
            target: None,
            suffixes: NATIVE_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            toolchain,
            engine,
            templates: Vec::new(),
            sources: BTreeSet::new(),
            include_paths: Vec::new(),
            library_paths: Vec::new(),
            libraries: Vec::new(),
            initialized: Mutex::new(false),
            state: Arc::new(state),
        }
    }

    /// Builder for the configured project, platform and toolchain
    pub fn from_config(config: &ProjectConfig) -> Result<Self> {
        let platform = match &config.build.platform {
            Some(name) => name.parse()?,
            None => Platform::default(),
        };
        let toolchain = CommandToolchain::from_config(&config.build).ok_or_else(|| {
            KilnError::ToolchainUnavailable("no [build] toolchain configured".to_string())
        })?;

        let project_dir = config.generated_dir().join(platform.name());
        let mut builder = Self::new(config.name(), platform, project_dir, Arc::new(toolchain));
        if let Some(target) = config.target_path() {
            builder = builder.with_target(target);
        }
        if let Some(company) = &config.project.company {
            builder.engine.set("company", company.clone());
        }
        if let Some(sdk) = config.sdk_path() {
            builder.engine.set("sdkPath", sdk.to_string_lossy().into_owned());
        }
        builder.set_environment(
            config.build.include_paths.clone(),
            config.build.library_paths.clone(),
            config.build.libraries.clone(),
        );

        let template_dir = config.templates_dir().join(platform.name());
        if let Ok(entries) = fs::read_dir(&template_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    let relative = PathBuf::from(entry.file_name());
                    builder.add_template(path, relative);
                }
            }
        }
        Ok(builder)
    }

    /// Deploy an application-style artifact to `target`
    pub fn with_target<P: AsRef<Path>>(mut self, target: P) -> Self {
        self.target = Some(target.as_ref().to_path_buf());
        self
    }

    pub fn with_suffixes<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, suffixes: I) -> Self {
        self.suffixes = suffixes
            .into_iter()
            .map(|s| s.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Generate `relative` inside the project from `template` before each build
    pub fn add_template<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, template: P, relative: Q) {
        self.templates
            .push((template.as_ref().to_path_buf(), relative.as_ref().to_path_buf()));
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.engine.set(key, value);
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.engine.get(key)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sources(&self) -> &BTreeSet<PathBuf> {
        &self.sources
    }

    /// Stamp every registered template into the project directory.
    ///
    /// Templates with `//+ key` regions only regenerate those regions in an
    /// already generated file; plain templates are rewritten in full.
    fn generate_project(&self) -> Result<()> {
        fs::create_dir_all(&self.project_dir).map_err(|source| KilnError::DestinationUnwritable {
            path: self.project_dir.clone(),
            source,
        })?;
        for (template, relative) in &self.templates {
            let output = self.project_dir.join(relative);
            if TemplateEngine::has_regions(template) {
                self.engine.update_template(template, &output);
            } else {
                self.copy_template(template, &output);
            }
        }
        Ok(())
    }
}

fn list_paths(paths: &[PathBuf]) -> String {
    let items: Vec<String> = paths.iter().map(|p| p.to_string_lossy().into_owned()).collect();
    format_list(&items, &ListStyle::default())
}

fn log_lines<R: Read>(stream: R) {
    for line in BufReader::new(stream).lines().map_while(std::io::Result::ok) {
        log::log!(classify_line(&line), "{}", line);
    }
}

/// Drain the child's output into the log and return its exit code
fn wait_for(mut child: Child) -> i32 {
    let stderr = child.stderr.take().map(|err| thread::spawn(move || log_lines(err)));
    if let Some(out) = child.stdout.take() {
        log_lines(out);
    }
    if let Some(handle) = stderr {
        handle.join().ok();
    }
    match child.wait() {
        Ok(status) => status.code().unwrap_or(-1),
        Err(e) => {
            log::error!("Lost track of build process: {}", e);
            -1
        }
    }
}

impl Builder for CodeBuilder {
    fn builder_init(&self) -> Result<()> {
        let mut initialized = self.initialized.lock().unwrap_or_else(PoisonError::into_inner);
        if !*initialized {
            self.toolchain.setup()?;
            *initialized = true;
        }
        Ok(())
    }

    fn build_project(&self) -> bool {
        if self
            .state
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::warn!("A build of {} is already in progress", self.name);
            return false;
        }

        let artifact = self.artifact();
        log::info!("Building {} for {}", self.name, self.platform);
        let started = self
            .builder_init()
            .and_then(|_| self.generate_project())
            .and_then(|_| self.toolchain.spawn_build(&self.project_dir, &self.engine));

        let child = match started {
            Ok(child) => child,
            Err(e) => {
                log::error!("Build of {} did not start: {}", self.name, e);
                self.state.finish(BuildResult {
                    exit_code: -1,
                    artifact,
                });
                return true;
            }
        };

        let state = Arc::clone(&self.state);
        let waiter_artifact = artifact.clone();
        let spawned = thread::Builder::new()
            .name(format!("kiln-build-{}", self.name))
            .spawn(move || {
                let exit_code = wait_for(child);
                state.finish(BuildResult {
                    exit_code,
                    artifact: waiter_artifact,
                });
            });
        if let Err(e) = spawned {
            log::error!("Could not wait on build of {}: {}", self.name, e);
            self.state.finish(BuildResult {
                exit_code: -1,
                artifact,
            });
        }
        true
    }

    fn builder_version(&self) -> String {
        self.toolchain.version().unwrap_or_default()
    }

    fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    fn rescan_sources(&mut self, root: &Path) -> &BTreeSet<PathBuf> {
        let found = SourceScanner::new(&self.suffixes).scan(root);
        if found != self.sources {
            self.state.outdated.store(true, Ordering::SeqCst);
        }
        let items: Vec<String> = found.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        self.engine.set("FilesList", format_list(&items, &ListStyle::default()));
        self.sources = found;
        &self.sources
    }

    fn set_environment(&mut self, include_paths: Vec<PathBuf>, library_paths: Vec<PathBuf>, libraries: Vec<String>) {
        if include_paths != self.include_paths
            || library_paths != self.library_paths
            || libraries != self.libraries
        {
            self.state.outdated.store(true, Ordering::SeqCst);
        }
        self.engine.set("includePaths", list_paths(&include_paths));
        self.engine.set("libraryPaths", list_paths(&library_paths));
        self.engine.set("libraries", format_list(&libraries, &ListStyle::default()));
        self.include_paths = include_paths;
        self.library_paths = library_paths;
        self.libraries = libraries;
    }

    fn copy_template(&self, src: &Path, dst: &Path) -> bool {
        self.engine.copy_template(src, dst)
    }

    fn project(&self) -> &Path {
        &self.project_dir
    }

    fn artifact(&self) -> PathBuf {
        match &self.target {
            Some(target) => target.join(self.platform.application_name(&self.name)),
            None => self.project_dir.join(self.platform.library_name(&self.name)),
        }
    }

    fn subscribe(&self) -> Receiver<BuildResult> {
        let (tx, rx) = unbounded();
        self.state
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    fn is_outdated(&self) -> bool {
        self.state.outdated.load(Ordering::SeqCst)
    }

    fn is_building(&self) -> bool {
        self.state.in_flight.load(Ordering::SeqCst)
    }
}
