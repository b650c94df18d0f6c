//! Suffix → converter dispatch

use crate::converter::Converter;
use kiln_core::{has_suffix, KilnError, Result};
use std::path::Path;
use std::sync::Arc;

/// Ordered converter table. Read-only once the pipeline starts.
#[derive(Default, Clone)]
pub struct ConverterRegistry {
    converters: Vec<Arc<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in converter
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for converter in crate::converters::defaults() {
            // Built-in suffix sets are disjoint
            if let Err(e) = registry.register(converter) {
                log::warn!("{}", e);
            }
        }
        registry
    }

    /// Append a converter. A suffix already claimed by an earlier converter
    /// is refused rather than silently shadowed.
    pub fn register(&mut self, converter: Arc<dyn Converter>) -> Result<()> {
        for suffix in converter.suffixes() {
            if let Some(owner) = self.owner_of(suffix) {
                let err = KilnError::DuplicateSuffix {
                    suffix: suffix.to_ascii_lowercase(),
                    owner: owner.name().to_string(),
                };
                log::warn!("Not registering {}: {}", converter.name(), err);
                return Err(err);
            }
        }
        log::debug!(
            "Registered converter {} for [{}]",
            converter.name(),
            converter.suffixes().join(", ")
        );
        self.converters.push(converter);
        Ok(())
    }

    fn owner_of(&self, suffix: &str) -> Option<&Arc<dyn Converter>> {
        let suffix = suffix.trim_start_matches('.');
        self.converters
            .iter()
            .find(|c| c.suffixes().iter().any(|s| s.eq_ignore_ascii_case(suffix)))
    }

    /// First converter, in registration order, whose suffix matches `path`
    pub fn resolve(&self, path: &Path) -> Result<Arc<dyn Converter>> {
        self.converters
            .iter()
            .find(|c| c.suffixes().iter().any(|s| has_suffix(path, s)))
            .cloned()
            .ok_or_else(|| KilnError::NoConverterForSuffix(path.to_path_buf()))
    }

    /// Converter claiming an exact suffix
    pub fn by_suffix(&self, suffix: &str) -> Option<Arc<dyn Converter>> {
        self.owner_of(suffix).cloned()
    }

    /// Every registered suffix, in registration order
    pub fn suffixes(&self) -> Vec<String> {
        self.converters
            .iter()
            .flat_map(|c| c.suffixes().iter().map(|s| s.to_ascii_lowercase()))
            .collect()
    }

    pub fn converters(&self) -> &[Arc<dyn Converter>] {
        &self.converters
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}
