//! Kiln Asset - Per-asset records and compiled resource storage
//!
//! This crate tracks what the pipeline knows about each asset:
//! - `ConverterSettings` - the TOML sidecar next to every source
//! - `AssetIndex` - identity → compiled resource, with rebinding aliases
//! - `ResourceStore` - reads and writes resources in the import directory

mod index;
mod settings;
mod store;

pub use index::{AssetIndex, IndexEntry, INDEX_FILE};
pub use settings::{ConverterSettings, SettingsState, SubItem, SIDECAR_SUFFIX};
pub use store::ResourceStore;
