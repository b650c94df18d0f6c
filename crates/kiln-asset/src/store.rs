//! Compiled resource storage under the import directory

use crate::index::AssetIndex;
use kiln_core::{AssetId, KilnError, Resource, Result};
use std::path::{Path, PathBuf};

/// Reads and writes compiled resources
///
/// Resources live at `<import>/<destination>`, where the destination name
/// comes from the asset's settings record.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    root: PathBuf,
}

impl ResourceStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, destination: &str) -> PathBuf {
        self.root.join(destination)
    }

    /// Write a resource; missing directories are created
    pub fn write(&self, path: &Path, resource: &Resource) -> Result<()> {
        resource.write_to(path)
    }

    /// Read a resource that may not exist yet.
    ///
    /// Missing or undecodable files yield `None` so converters can fall back
    /// to creating a fresh resource.
    pub fn read_existing(&self, path: &Path) -> Option<Resource> {
        if !path.exists() {
            return None;
        }
        match Resource::read_from(path) {
            Ok(resource) => Some(resource),
            Err(e) => {
                log::debug!("Ignoring existing resource {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load the resource bound to `id`, following rebinding aliases
    pub fn load(&self, index: &AssetIndex, id: AssetId) -> Result<Resource> {
        let entry = index.get(id).ok_or(KilnError::UnknownIdentity(id))?;
        Resource::read_from(self.path_for(&entry.destination))
    }

    pub fn contains(&self, destination: &str) -> bool {
        self.path_for(destination).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexEntry;
    use kiln_core::Value;
    use std::fs;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kiln_store_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_by_identity() {
        let dir = temp_dir();
        let store = ResourceStore::new(&dir);
        let id = AssetId::from_raw(0x51);

        let resource = Resource::new("Text", id, Value::Bytes(b"hello".to_vec()));
        store.write(&store.path_for("abc"), &resource).unwrap();

        let mut index = AssetIndex::new();
        index.register(
            id,
            IndexEntry {
                source: PathBuf::from("hello.txt"),
                destination: "abc".into(),
                type_identifier: "Text".into(),
            },
        );

        assert!(store.contains("abc"));
        assert_eq!(store.load(&index, id).unwrap(), resource);

        // Old identity still reaches the same resource after a rebind
        let new_id = AssetId::from_raw(0x52);
        index.rebind(id, new_id);
        assert_eq!(store.load(&index, id).unwrap(), resource);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_identity() {
        let store = ResourceStore::new(std::env::temp_dir());
        let err = store
            .load(&AssetIndex::new(), AssetId::from_raw(1))
            .unwrap_err();
        assert!(matches!(err, KilnError::UnknownIdentity(_)));
    }

    #[test]
    fn test_read_existing_tolerates_garbage() {
        let dir = temp_dir();
        let store = ResourceStore::new(&dir);
        fs::write(dir.join("junk"), b"not a resource").unwrap();

        assert!(store.read_existing(&dir.join("junk")).is_none());
        assert!(store.read_existing(&dir.join("missing")).is_none());

        fs::remove_dir_all(&dir).ok();
    }
}
