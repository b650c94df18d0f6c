//! Recursive source discovery filtered by file suffix

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Check whether `path`'s file name ends in `.suffix`, ignoring ASCII case.
///
/// Compound suffixes (`"tar.gz"`) are matched against the whole tail of the
/// name, so `scene.Map` and `level.backup.map` both carry suffix `map`.
pub fn has_suffix(path: &Path, suffix: &str) -> bool {
    let suffix = suffix.trim_start_matches('.');
    if suffix.is_empty() {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.len() <= suffix.len() {
        return false;
    }
    let split = name.len() - suffix.len();
    name.is_char_boundary(split)
        && name.as_bytes()[split - 1] == b'.'
        && name[split..].eq_ignore_ascii_case(suffix)
}

/// Walks a directory tree and collects files whose suffix is in a set
#[derive(Debug, Clone, Default)]
pub struct SourceScanner {
    suffixes: Vec<String>,
}

impl SourceScanner {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = suffixes
            .into_iter()
            .map(|s| s.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        list.sort();
        list.dedup();
        Self { suffixes: list }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.suffixes.iter().any(|s| has_suffix(path, s))
    }

    /// Collect every matching file under `root`.
    ///
    /// The result is sorted and free of duplicates. A missing root yields an
    /// empty set; unreadable subdirectories are skipped with a warning.
    pub fn scan<P: AsRef<Path>>(&self, root: P) -> BTreeSet<PathBuf> {
        let mut found = BTreeSet::new();
        if !self.suffixes.is_empty() {
            self.walk(root.as_ref(), &mut found);
        }
        found
    }

    fn walk(&self, dir: &Path, found: &mut BTreeSet<PathBuf>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                if dir.exists() {
                    log::warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                }
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                self.walk(&path, found);
            } else if path.is_file() && self.matches(&path) {
                found.insert(path);
            }
        }
    }
}
