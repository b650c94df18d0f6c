//! The converter contract and the shared context converters run against

use kiln_asset::{AssetIndex, ConverterSettings, IndexEntry, ResourceStore};
use kiln_core::{AssetId, KilnError, Resource, Result, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome of a single `convert_file` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    /// Resource written to the settings' destination
    Success,
    /// Source understood but declined; nothing written
    Abort,
    /// Converter has nothing to do; the source bytes are the resource
    CopyAsIs,
    /// Conversion failed; any earlier output is left in place
    InternalError,
}

/// Transcodes one authored source format into the binary resource contract.
///
/// Converters are stateless and shared across worker threads. They never
/// return errors: failures are logged and mapped to a [`ReturnCode`].
pub trait Converter: Send + Sync {
    /// Converter name for logs and registry conflicts
    fn name(&self) -> &str;

    /// Source suffixes handled, lowercase without the leading dot
    fn suffixes(&self) -> &[&str];

    /// Tag describing the authored content kind
    fn content_type(&self) -> &str;

    /// Type tag written into produced resources
    fn output_type(&self) -> &str;

    /// Bumped whenever the produced resource layout changes
    fn format_version(&self) -> u32;

    /// Template used to create a new source of this kind
    fn template_path(&self) -> Option<PathBuf> {
        None
    }

    /// Icon shown for sources of this kind, relative to the project's icon set
    fn icon_path(&self) -> Option<String> {
        Some(format!("icons/{}.png", self.content_type()))
    }

    /// Fresh settings for a source seen for the first time
    fn create_settings(&self, source: &Path, import_dir: &Path) -> ConverterSettings {
        let mut settings = ConverterSettings::new(source, import_dir);
        settings.type_identifier = self.output_type().to_string();
        settings.default_icon = self.icon_path();
        settings
    }

    fn convert_file(&self, settings: &mut ConverterSettings, ctx: &ConvertContext) -> ReturnCode;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared by every conversion in a pass: the resource store and the
/// identity index. Safe to use from many workers at once.
pub struct ConvertContext {
    store: ResourceStore,
    index: Mutex<AssetIndex>,
    issued: Mutex<HashSet<AssetId>>,
}

impl ConvertContext {
    pub fn new(store: ResourceStore, index: AssetIndex) -> Self {
        Self {
            store,
            index: Mutex::new(index),
            issued: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// Run `f` with exclusive access to the index
    pub fn with_index<R>(&self, f: impl FnOnce(&mut AssetIndex) -> R) -> R {
        f(&mut lock(&self.index))
    }

    pub fn into_index(self) -> AssetIndex {
        self.index.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// A new identity not used by the index nor issued earlier in this pass
    pub fn allocate_identity(&self) -> AssetId {
        let index = lock(&self.index);
        let mut issued = lock(&self.issued);
        let id = AssetId::generate_unique(|id| index.contains(id) || issued.contains(&id));
        issued.insert(id);
        id
    }

    /// The settings' identity, allocating and binding one if absent
    pub fn bind_identity(&self, settings: &mut ConverterSettings) -> AssetId {
        match settings.identity() {
            Some(id) => id,
            None => {
                let id = self.allocate_identity();
                settings.set_identity(id);
                log::debug!("Bound {} to {}", settings.source().display(), id);
                id
            }
        }
    }

    /// Retire `old` in favour of `new` so references to `old` keep resolving
    pub fn rebind(&self, old: AssetId, new: AssetId) {
        self.with_index(|index| index.rebind(old, new));
    }

    pub fn register(&self, settings: &ConverterSettings) {
        self.with_index(|index| index.register_settings(settings));
    }

    /// Identity the index last recorded for `source`, if any
    pub fn recorded_identity(&self, source: &Path) -> Option<(AssetId, IndexEntry)> {
        self.with_index(|index| {
            let id = index.find_by_source(source)?;
            index.get(id).map(|entry| (id, entry.clone()))
        })
    }

    /// Write a secondary resource emitted by the same source under the
    /// sub-item `name`, keeping its identity stable across conversions
    pub fn write_sub_resource(
        &self,
        settings: &mut ConverterSettings,
        name: &str,
        type_tag: &str,
        value: Value,
    ) -> Result<AssetId> {
        let id = match settings.sub_item(name) {
            Some(item) => item.identity,
            None => self.allocate_identity(),
        };
        let resource = Resource::new(type_tag, id, value);
        self.store.write(&settings.absolute_sub_item_destination(id), &resource)?;
        settings.set_sub_item(name, id, type_tag);
        Ok(id)
    }

    pub fn read_source(&self, settings: &ConverterSettings) -> Result<Vec<u8>> {
        let path = settings.source();
        fs::read(path).map_err(|source| KilnError::SourceUnreadable {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The resource currently at the settings' destination, if readable
    pub fn existing_resource(&self, settings: &ConverterSettings) -> Option<Resource> {
        self.store.read_existing(settings.absolute_destination())
    }

    pub fn write_resource(&self, settings: &ConverterSettings, resource: &Resource) -> Result<()> {
        self.store.write(settings.absolute_destination(), resource)
    }
}

/// Log a failed step and map it to `InternalError`
pub(crate) fn internal_error(converter: &str, settings: &ConverterSettings, err: KilnError) -> ReturnCode {
    log::error!("{}: {}: {}", converter, settings.source().display(), err);
    ReturnCode::InternalError
}
