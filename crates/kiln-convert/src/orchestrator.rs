//! Conversion orchestration: decide, convert, persist

use crate::converter::{ConvertContext, Converter, ReturnCode};
use crate::registry::ConverterRegistry;
use kiln_asset::{AssetIndex, ConverterSettings, ResourceStore, SettingsState, INDEX_FILE};
use kiln_core::{
    has_suffix, AssetId, ContentHash, KilnError, ProjectConfig, Resource, Result, SourceScanner,
    TemplateEngine,
};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

/// File-system facts the freshness check depends on
pub trait FileFacts: Send + Sync {
    fn modified(&self, path: &Path) -> Option<SystemTime>;

    fn exists(&self, path: &Path) -> bool {
        self.modified(path).is_some()
    }

    fn content_hash(&self, path: &Path) -> Option<ContentHash> {
        ContentHash::from_file(path).ok()
    }
}

/// Facts read from the real file system
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFacts;

impl FileFacts for DiskFacts {
    fn modified(&self, path: &Path) -> Option<SystemTime> {
        fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

/// Why an asset is (re)converted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionReason {
    /// No settings record existed
    New,
    /// Compiled by an older converter version
    StaleVersion,
    DestinationMissing,
    SourceNewer,
    HashChanged,
    Forced,
}

impl fmt::Display for ConversionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::New => "new",
            Self::StaleVersion => "stale version",
            Self::DestinationMissing => "destination missing",
            Self::SourceNewer => "source newer",
            Self::HashChanged => "content changed",
            Self::Forced => "forced",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    UpToDate,
    Converted,
    /// Source copied to the destination unchanged
    Copied,
    Aborted,
    Failed(String),
}

/// Result of one asset in a pass
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub source: PathBuf,
    pub converter: Option<String>,
    pub identity: Option<AssetId>,
    pub reason: Option<ConversionReason>,
    pub outcome: Outcome,
}

impl ConversionReport {
    fn failed(source: &Path, message: String) -> Self {
        Self {
            source: source.to_path_buf(),
            converter: None,
            identity: None,
            reason: None,
            outcome: Outcome::Failed(message),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

/// Read-only view of one asset's pipeline state
#[derive(Debug, Clone)]
pub struct AssetStatus {
    pub converter: String,
    pub state: SettingsState,
    pub identity: Option<AssetId>,
    pub version: u32,
    pub format_version: u32,
    pub destination: Option<PathBuf>,
    pub icon: Option<String>,
    pub pending: Option<ConversionReason>,
}

/// Drives converters over a content directory.
///
/// Owns the identity index for the duration of a pass; call
/// [`save_index`](Self::save_index) to persist it.
pub struct ConversionOrchestrator {
    registry: ConverterRegistry,
    content_dir: PathBuf,
    import_dir: PathBuf,
    templates_dir: Option<PathBuf>,
    ctx: ConvertContext,
    facts: Box<dyn FileFacts>,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    force: bool,
    jobs: usize,
}

impl ConversionOrchestrator {
    /// Load (or rebuild from sidecars) the index for `import_dir`
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        registry: ConverterRegistry,
        content_dir: P,
        import_dir: Q,
    ) -> Result<Self> {
        let content_dir = content_dir.as_ref().to_path_buf();
        let import_dir = import_dir.as_ref().to_path_buf();

        let index = if import_dir.join(INDEX_FILE).exists() {
            AssetIndex::load(&import_dir)?
        } else {
            let index = AssetIndex::from_sidecars(&content_dir, &import_dir)?;
            if !index.is_empty() {
                log::info!("Rebuilt asset index from {} sidecars", index.len());
            }
            index
        };

        Ok(Self {
            registry,
            ctx: ConvertContext::new(ResourceStore::new(&import_dir), index),
            content_dir,
            import_dir,
            templates_dir: None,
            facts: Box::new(DiskFacts),
            locks: Mutex::new(HashMap::new()),
            force: false,
            jobs: 0,
        })
    }

    pub fn from_config(config: &ProjectConfig, registry: ConverterRegistry) -> Result<Self> {
        Ok(Self::new(registry, config.content_dir(), config.import_dir())?
            .with_templates(config.templates_dir()))
    }

    pub fn with_facts(mut self, facts: impl FileFacts + 'static) -> Self {
        self.facts = Box::new(facts);
        self
    }

    pub fn with_templates<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.templates_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Reconvert everything regardless of freshness
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Worker count for batches; 0 lets rayon decide
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    pub fn import_dir(&self) -> &Path {
        &self.import_dir
    }

    /// Load the persisted settings for `source`, or create fresh ones.
    /// The flag is `true` when the record was created.
    pub fn fetch_settings(&self, source: &Path, converter: &dyn Converter) -> Result<(ConverterSettings, bool)> {
        match ConverterSettings::load(source, &self.import_dir)? {
            Some(mut settings) => {
                if settings.type_identifier.is_empty() {
                    settings.type_identifier = converter.output_type().to_string();
                }
                Ok((settings, false))
            }
            None => {
                let mut settings = converter.create_settings(source, &self.import_dir);
                // A lost sidecar must not cost the asset its identity
                if let Some((id, entry)) = self.ctx.recorded_identity(source) {
                    log::info!("Recovered identity {} for {}", id, source.display());
                    settings.set_identity(id);
                    settings.set_destination(entry.destination, &self.import_dir);
                }
                Ok((settings, true))
            }
        }
    }

    /// First reason `settings` must be reconverted, or `None` when up to date
    pub fn needs_conversion(&self, settings: &ConverterSettings, converter: &dyn Converter) -> Option<ConversionReason> {
        if self.force {
            return Some(ConversionReason::Forced);
        }
        if settings.version < converter.format_version() {
            return Some(ConversionReason::StaleVersion);
        }

        let destination = settings.absolute_destination();
        let Some(dest_modified) = self.facts.modified(destination) else {
            return Some(ConversionReason::DestinationMissing);
        };
        if let Some(src_modified) = self.facts.modified(settings.source()) {
            if src_modified > dest_modified {
                return Some(ConversionReason::SourceNewer);
            }
        }
        if self.facts.content_hash(settings.source()) != settings.hash {
            return Some(ConversionReason::HashChanged);
        }
        None
    }

    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Convert one source if it needs it
    pub fn convert(&self, source: &Path) -> ConversionReport {
        let lock = self.path_lock(source);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let converter = match self.registry.resolve(source) {
            Ok(converter) => converter,
            Err(e) => {
                log::warn!("{}", e);
                return ConversionReport::failed(source, e.to_string());
            }
        };
        let (mut settings, created) = match self.fetch_settings(source, converter.as_ref()) {
            Ok(found) => found,
            Err(e) => {
                log::error!("{}", e);
                return ConversionReport::failed(source, e.to_string());
            }
        };

        let reason = if created {
            Some(ConversionReason::New)
        } else {
            self.needs_conversion(&settings, converter.as_ref())
        };

        let mut report = ConversionReport {
            source: source.to_path_buf(),
            converter: Some(converter.name().to_string()),
            identity: settings.identity(),
            reason,
            outcome: Outcome::UpToDate,
        };
        let Some(reason) = reason else {
            log::debug!("{} is up to date", source.display());
            return report;
        };

        log::debug!("Converting {} with {} ({})", source.display(), converter.name(), reason);
        self.ctx.bind_identity(&mut settings);
        report.outcome = match converter.convert_file(&mut settings, &self.ctx) {
            ReturnCode::Success => self.finish(&mut settings, converter.as_ref(), Outcome::Converted),
            ReturnCode::CopyAsIs => match self.copy_as_is(&settings) {
                Ok(()) => self.finish(&mut settings, converter.as_ref(), Outcome::Copied),
                Err(e) => {
                    log::error!("{}", e);
                    Outcome::Failed(e.to_string())
                }
            },
            ReturnCode::Abort => {
                log::warn!("{} aborted {}", converter.name(), source.display());
                Outcome::Aborted
            }
            ReturnCode::InternalError => {
                Outcome::Failed(format!("{} failed on {}", converter.name(), source.display()))
            }
        };
        report.identity = settings.identity();
        report
    }

    fn copy_as_is(&self, settings: &ConverterSettings) -> Result<()> {
        let destination = settings.absolute_destination();
        let unwritable = |source| KilnError::DestinationUnwritable {
            path: destination.to_path_buf(),
            source,
        };
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(unwritable)?;
        }
        fs::copy(settings.source(), destination).map_err(|source| KilnError::SourceUnreadable {
            path: settings.source().to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Record a successful conversion: current version, content hash,
    /// sidecar and index entry
    fn finish(&self, settings: &mut ConverterSettings, converter: &dyn Converter, done: Outcome) -> Outcome {
        settings.version = converter.format_version();
        settings.hash = self.facts.content_hash(settings.source());
        if let Err(e) = settings.save() {
            log::error!("{}", e);
            return Outcome::Failed(e.to_string());
        }
        self.ctx.register(settings);
        log::info!(
            "{} {} -> {}",
            if done == Outcome::Copied { "Copied" } else { "Converted" },
            settings.source().display(),
            settings.destination()
        );
        done
    }

    /// Convert many sources concurrently. Reports come back in input order.
    pub fn convert_batch(&self, sources: &[PathBuf]) -> Vec<ConversionReport> {
        let run = || -> Vec<ConversionReport> { sources.par_iter().map(|s| self.convert(s)).collect() };
        match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                log::warn!("Worker pool unavailable ({}), converting sequentially", e);
                sources.iter().map(|s| self.convert(s)).collect()
            }
        }
    }

    /// Every convertible source under the content directory
    pub fn scan(&self) -> BTreeSet<PathBuf> {
        SourceScanner::new(self.registry.suffixes())
            .scan(&self.content_dir)
            .into_iter()
            .filter(|p| !ConverterSettings::is_sidecar(p))
            .collect()
    }

    /// Scan, convert and persist the index
    pub fn convert_all(&self) -> Result<Vec<ConversionReport>> {
        let sources: Vec<PathBuf> = self.scan().into_iter().collect();
        let reports = self.convert_batch(&sources);
        self.save_index()?;
        Ok(reports)
    }

    pub fn save_index(&self) -> Result<()> {
        self.ctx.with_index(|index| index.save(&self.import_dir))
    }

    /// Snapshot of the identity index
    pub fn index(&self) -> AssetIndex {
        self.ctx.with_index(|index| index.clone())
    }

    /// Load a compiled resource by identity
    pub fn load_resource(&self, id: AssetId) -> Result<Resource> {
        self.ctx.with_index(|index| self.ctx.store().load(index, id))
    }

    /// Pipeline state of one source, without converting it
    pub fn status(&self, source: &Path) -> Result<AssetStatus> {
        let converter = self.registry.resolve(source)?;
        let format_version = converter.format_version();
        let status = match ConverterSettings::load(source, &self.import_dir)? {
            Some(settings) => AssetStatus {
                converter: converter.name().to_string(),
                state: settings.state(format_version),
                identity: settings.identity(),
                version: settings.version,
                format_version,
                destination: Some(settings.absolute_destination().to_path_buf()),
                icon: settings.default_icon.clone(),
                pending: self.needs_conversion(&settings, converter.as_ref()),
            },
            None => AssetStatus {
                converter: converter.name().to_string(),
                state: SettingsState::Unregistered,
                identity: None,
                version: 0,
                format_version,
                destination: None,
                icon: converter.icon_path(),
                pending: Some(ConversionReason::New),
            },
        };
        Ok(status)
    }

    /// Create a new source at `destination` from the template registered for
    /// `suffix`. The suffix is appended to `destination` when missing.
    pub fn create_from_template(&self, suffix: &str, destination: &Path) -> Result<PathBuf> {
        let suffix = suffix.trim_start_matches('.');
        let converter = self
            .registry
            .by_suffix(suffix)
            .ok_or_else(|| KilnError::NoConverterForSuffix(destination.to_path_buf()))?;

        let template = converter
            .template_path()
            .or_else(|| {
                self.templates_dir
                    .as_ref()
                    .map(|dir| dir.join(format!("{}.{}", converter.content_type(), suffix)))
            })
            .ok_or_else(|| KilnError::ConfigError(format!("No template for .{}", suffix)))?;
        if !template.is_file() {
            return Err(KilnError::SourceUnreadable {
                path: template,
                source: std::io::ErrorKind::NotFound.into(),
            });
        }

        let mut destination = destination.to_path_buf();
        if !has_suffix(&destination, suffix) {
            let mut name = destination.file_name().map(|n| n.to_os_string()).unwrap_or_default();
            name.push(format!(".{}", suffix));
            destination.set_file_name(name);
        }

        if !TemplateEngine::create_from_template(&template, &destination) {
            return Err(KilnError::DestinationUnwritable {
                path: destination,
                source: std::io::Error::other("template not written"),
            });
        }
        log::info!("Created {} from {}", destination.display(), template.display());
        Ok(destination)
    }
}
