//! Per-asset converter settings persisted as TOML sidecars
//!
//! Every asset source `foo.fab` gets a sidecar `foo.fab.asset.toml` next to it:
//!
//! ```toml
//! [asset]
//! identity = 3735928559
//! version = 2
//! destination = "6f1c0d4e9b7a4d0f8c2e5a3b1d7f9e21"
//! type = "Prefab"
//! read_only = false
//! hash = "sha256:…"
//!
//! [asset.sub_items.Glyphs]
//! identity = 12648430
//! type = "Texture"
//! ```

use kiln_core::{write_atomic, AssetId, ContentHash, KilnError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to a source file name to form its sidecar
pub const SIDECAR_SUFFIX: &str = ".asset.toml";

/// Lifecycle of an asset's settings record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsState {
    /// No sidecar exists for the source yet
    Unregistered,
    /// A record exists but no identity has been bound
    Registered,
    /// Identity bound and the compiled version is current
    Bound,
    /// Identity bound but compiled by an older converter version
    Stale,
}

/// Identity and type of a secondary resource emitted by the same source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubItem {
    pub identity: AssetId,
    #[serde(rename = "type")]
    pub type_identifier: String,
}

/// Persistent per-asset conversion record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterSettings {
    #[serde(skip)]
    source: PathBuf,
    #[serde(skip)]
    absolute_destination: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity: Option<AssetId>,
    /// Converter format version that produced the current output
    #[serde(default)]
    pub version: u32,
    /// Output file name relative to the import directory
    #[serde(default)]
    destination: String,
    #[serde(default, rename = "type")]
    pub type_identifier: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<ContentHash>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    sub_items: BTreeMap<String, SubItem>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, toml::Value>,
}

#[derive(Serialize, Deserialize)]
struct Sidecar {
    asset: ConverterSettings,
}

impl ConverterSettings {
    /// A fresh, unbound record for `source` whose output lands in `import_dir`
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(source: P, import_dir: Q) -> Self {
        let destination = uuid::Uuid::new_v4().simple().to_string();
        Self {
            source: source.as_ref().to_path_buf(),
            absolute_destination: import_dir.as_ref().join(&destination),
            identity: None,
            version: 0,
            destination,
            type_identifier: String::new(),
            read_only: false,
            default_icon: None,
            hash: None,
            sub_items: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Sidecar location for a source path
    pub fn sidecar_path<P: AsRef<Path>>(source: P) -> PathBuf {
        let source = source.as_ref();
        let mut name = source
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(SIDECAR_SUFFIX);
        source.with_file_name(name)
    }

    pub fn is_sidecar<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(SIDECAR_SUFFIX))
            .unwrap_or(false)
    }

    /// Load the persisted record for `source`, or `None` when there is none yet
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(source: P, import_dir: Q) -> Result<Option<Self>> {
        let source = source.as_ref();
        let path = Self::sidecar_path(source);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| KilnError::SourceUnreadable {
            path: path.clone(),
            source: e,
        })?;
        let sidecar: Sidecar = toml::from_str(&content).map_err(|e| {
            KilnError::SettingsError(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        let mut settings = sidecar.asset;
        if settings.destination.is_empty() {
            settings.destination = uuid::Uuid::new_v4().simple().to_string();
        }
        settings.source = source.to_path_buf();
        settings.absolute_destination = import_dir.as_ref().join(&settings.destination);
        // Zero is never handed out; treat it as unbound
        settings.identity = settings.identity.filter(AssetId::is_valid);
        Ok(Some(settings))
    }

    /// Report the lifecycle state of `source` without creating anything
    pub fn lifecycle<P: AsRef<Path>, Q: AsRef<Path>>(
        source: P,
        import_dir: Q,
        format_version: u32,
    ) -> Result<SettingsState> {
        Ok(match Self::load(source, import_dir)? {
            Some(settings) => settings.state(format_version),
            None => SettingsState::Unregistered,
        })
    }

    /// Write the sidecar next to the source
    pub fn save(&self) -> Result<()> {
        let path = Self::sidecar_path(&self.source);
        let text = toml::to_string_pretty(&Sidecar {
            asset: self.clone(),
        })?;
        write_atomic(&path, text.as_bytes())
    }

    pub fn state(&self, format_version: u32) -> SettingsState {
        match self.identity {
            None => SettingsState::Registered,
            Some(_) if self.version < format_version => SettingsState::Stale,
            Some(_) => SettingsState::Bound,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn absolute_destination(&self) -> &Path {
        &self.absolute_destination
    }

    /// Point the record at an existing output file in `import_dir`
    pub fn set_destination<Q: AsRef<Path>>(&mut self, destination: impl Into<String>, import_dir: Q) {
        self.destination = destination.into();
        self.absolute_destination = import_dir.as_ref().join(&self.destination);
    }

    pub fn identity(&self) -> Option<AssetId> {
        self.identity
    }

    /// Bind an identity. Invalid (zero) identities are ignored.
    pub fn set_identity(&mut self, identity: AssetId) {
        if identity.is_valid() {
            self.identity = Some(identity);
        }
    }

    pub fn sub_item(&self, name: &str) -> Option<&SubItem> {
        self.sub_items.get(name)
    }

    pub fn sub_items(&self) -> &BTreeMap<String, SubItem> {
        &self.sub_items
    }

    /// Output file name of the sub-item bound to `identity`
    pub fn sub_item_destination(&self, identity: AssetId) -> String {
        format!("{}-{}", self.destination, identity)
    }

    pub fn absolute_sub_item_destination(&self, identity: AssetId) -> PathBuf {
        self.absolute_destination
            .with_file_name(self.sub_item_destination(identity))
    }

    pub fn set_sub_item(&mut self, name: impl Into<String>, identity: AssetId, type_identifier: impl Into<String>) {
        self.sub_items.insert(
            name.into(),
            SubItem {
                identity,
                type_identifier: type_identifier.into(),
            },
        );
    }

    pub fn property(&self, key: &str) -> Option<&toml::Value> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> &BTreeMap<String, toml::Value> {
        &self.properties
    }

    /// Edit an import property from tooling. Read-only records refuse edits.
    pub fn set_property(&mut self, key: impl Into<String>, value: toml::Value) -> Result<()> {
        if self.read_only {
            return Err(KilnError::ReadOnlySettings(self.source.clone()));
        }
        self.properties.insert(key.into(), value);
        Ok(())
    }
}
