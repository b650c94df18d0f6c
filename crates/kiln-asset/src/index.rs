//! Identity index for compiled resources
//!
//! Maps every bound identity to its source, compiled destination and output
//! type. When an asset's identity is rebound the old identity stays behind as
//! an alias, so references written against it keep resolving.

use crate::settings::ConverterSettings;
use kiln_core::{write_atomic, AssetId, KilnError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the persisted index inside the import directory
pub const INDEX_FILE: &str = "index.toml";

const INDEX_FORMAT_VERSION: u32 = 1;

/// Where an identity's resource lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub source: PathBuf,
    /// Resource file name relative to the import directory
    pub destination: String,
    #[serde(rename = "type")]
    pub type_identifier: String,
}

impl IndexEntry {
    pub fn from_settings(settings: &ConverterSettings) -> Self {
        Self {
            source: settings.source().to_path_buf(),
            destination: settings.destination().to_string(),
            type_identifier: settings.type_identifier.clone(),
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
struct IndexFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, IndexEntry>,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

/// Identity → resource location registry with rebinding aliases
#[derive(Debug, Default, Clone)]
pub struct AssetIndex {
    entries: HashMap<AssetId, IndexEntry>,
    /// Retired identity → current identity
    aliases: HashMap<AssetId, AssetId>,
}

impl AssetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `index.toml` from an import directory; a missing file is an empty index
    pub fn load<P: AsRef<Path>>(import_dir: P) -> Result<Self> {
        let path = import_dir.as_ref().join(INDEX_FILE);
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(&path)?;
        let file: IndexFile = toml::from_str(&content).map_err(|e| {
            KilnError::SettingsError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        if file.version > INDEX_FORMAT_VERSION {
            return Err(KilnError::SettingsError(format!(
                "{} has version {}, newer than supported {}",
                path.display(),
                file.version,
                INDEX_FORMAT_VERSION
            )));
        }

        let mut index = Self::new();
        for (key, entry) in file.entries {
            index.entries.insert(parse_id(&key, &path)?, entry);
        }
        for (old, new) in file.aliases {
            index.aliases.insert(parse_id(&old, &path)?, parse_id(&new, &path)?);
        }
        Ok(index)
    }

    /// Rebuild an index from the sidecars under a content directory
    pub fn from_sidecars<P: AsRef<Path>, Q: AsRef<Path>>(content_dir: P, import_dir: Q) -> Result<Self> {
        let mut index = Self::new();
        index.scan_directory(content_dir.as_ref(), import_dir.as_ref())?;
        Ok(index)
    }

    fn scan_directory(&mut self, dir: &Path, import_dir: &Path) -> Result<()> {
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.scan_directory(&path, import_dir)?;
                continue;
            }
            if !ConverterSettings::is_sidecar(&path) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let source = path.with_file_name(name.trim_end_matches(crate::settings::SIDECAR_SUFFIX));
            match ConverterSettings::load(&source, import_dir) {
                Ok(Some(settings)) => self.register_settings(&settings),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping sidecar {}: {}", path.display(), e),
            }
        }
        Ok(())
    }

    /// Persist to `index.toml` in the import directory
    pub fn save<P: AsRef<Path>>(&self, import_dir: P) -> Result<()> {
        let import_dir = import_dir.as_ref();
        let file = IndexFile {
            version: INDEX_FORMAT_VERSION,
            entries: self
                .entries
                .iter()
                .map(|(id, entry)| (id.to_string(), entry.clone()))
                .collect(),
            aliases: self
                .aliases
                .iter()
                .map(|(old, new)| (old.to_string(), new.to_string()))
                .collect(),
        };
        write_atomic(&import_dir.join(INDEX_FILE), toml::to_string_pretty(&file)?.as_bytes())
    }

    pub fn register(&mut self, id: AssetId, entry: IndexEntry) {
        self.aliases.remove(&id);
        self.entries.insert(id, entry);
    }

    /// Register a bound asset and every sub-item it emitted
    pub fn register_settings(&mut self, settings: &ConverterSettings) {
        let Some(id) = settings.identity() else {
            return;
        };
        self.register(id, IndexEntry::from_settings(settings));
        for item in settings.sub_items().values() {
            let entry = IndexEntry {
                source: settings.source().to_path_buf(),
                destination: settings.sub_item_destination(item.identity),
                type_identifier: item.type_identifier.clone(),
            };
            self.register(item.identity, entry);
        }
    }

    /// Follow aliases to the identity currently in use
    pub fn resolve(&self, id: AssetId) -> Option<AssetId> {
        if self.entries.contains_key(&id) {
            return Some(id);
        }
        self.aliases
            .get(&id)
            .copied()
            .filter(|current| self.entries.contains_key(current))
    }

    pub fn get(&self, id: AssetId) -> Option<&IndexEntry> {
        self.resolve(id).and_then(|current| self.entries.get(&current))
    }

    /// Whether `id` is in use, either live or as an alias
    pub fn contains(&self, id: AssetId) -> bool {
        self.entries.contains_key(&id) || self.aliases.contains_key(&id)
    }

    /// Primary identity of `source`. Sub-items share the source path, so
    /// the entry whose destination carries no sub-item suffix wins.
    pub fn find_by_source(&self, source: &Path) -> Option<AssetId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.source == source)
            .min_by_key(|(_, entry)| entry.destination.len())
            .map(|(id, _)| *id)
    }

    /// Replace `old` with `new`. The entry moves to `new`, `old` becomes an
    /// alias of it, and any alias that pointed at `old` is redirected.
    pub fn rebind(&mut self, old: AssetId, new: AssetId) {
        if old == new {
            return;
        }
        if let Some(entry) = self.entries.remove(&old) {
            self.entries.entry(new).or_insert(entry);
        }
        for target in self.aliases.values_mut() {
            if *target == old {
                *target = new;
            }
        }
        self.aliases.remove(&new);
        self.aliases.insert(old, new);
        log::debug!("Rebound identity {} -> {}", old, new);
    }

    pub fn remove(&mut self, id: AssetId) -> Option<IndexEntry> {
        self.aliases.retain(|_, target| *target != id);
        self.entries.remove(&id)
    }

    /// Live identities of a given output type
    pub fn by_type(&self, type_identifier: &str) -> Vec<AssetId> {
        let mut ids: Vec<AssetId> = self
            .entries
            .iter()
            .filter(|(_, e)| e.type_identifier == type_identifier)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Every live identity, sorted
    pub fn ids(&self) -> Vec<AssetId> {
        let mut ids: Vec<AssetId> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_id(key: &str, path: &Path) -> Result<AssetId> {
    u32::from_str_radix(key, 16)
        .map(AssetId::from_raw)
        .map_err(|_| KilnError::SettingsError(format!("Bad identity '{}' in {}", key, path.display())))
}
