//! Binary resource contract
//!
//! A compiled resource file is a small fixed header followed by the
//! bincode encoding of a [`Resource`]:
//!
//! ```text
//! [0..4)  magic   "KRES"
//! [4..6)  version u16 little-endian
//! [6..)   bincode(Resource)
//! ```

use crate::error::{KilnError, Result};
use crate::id::AssetId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const MAGIC: [u8; 4] = *b"KRES";

/// Version of the container header written by [`Resource::encode`]
pub const RESOURCE_FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 6;

/// A converted resource as consumed by the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Output type tag (e.g. "Prefab", "Font", "Translator")
    pub type_tag: String,
    pub identity: AssetId,
    pub value: Value,
}

impl Resource {
    pub fn new(type_tag: impl Into<String>, identity: AssetId, value: Value) -> Self {
        Self {
            type_tag: type_tag.into(),
            identity,
            value,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = bincode::serialize(self)?;
        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&RESOURCE_FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || bytes[..4] != MAGIC {
            return Err(KilnError::CodecError("bad resource header".to_string()));
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version > RESOURCE_FORMAT_VERSION {
            return Err(KilnError::CodecError(format!(
                "resource container version {} is newer than supported {}",
                version, RESOURCE_FORMAT_VERSION
            )));
        }
        Ok(bincode::deserialize(&bytes[HEADER_LEN..])?)
    }

    /// Read and decode a resource file
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| KilnError::SourceUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes)
    }

    /// Encode and write the resource, replacing `path` only once the new
    /// bytes are fully on disk. Missing parent directories are created.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.encode()?;
        write_atomic(path.as_ref(), &bytes)
    }
}

/// Write `bytes` next to `path` and rename over it, so a failed write
/// never clobbers an earlier output. Missing parent directories are created.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let unwritable = |source| KilnError::DestinationUnwritable {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(unwritable)?;
        }
    }

    let partial = partial_path(path);
    if let Err(e) = fs::write(&partial, bytes) {
        fs::remove_file(&partial).ok();
        return Err(unwritable(e));
    }
    fs::rename(&partial, path).map_err(|e| {
        fs::remove_file(&partial).ok();
        unwritable(e)
    })
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resource".to_string());
    path.with_file_name(format!(".{}.{}.partial", name, uuid::Uuid::new_v4().simple()))
}
