//! Scene and prefab sources: JSON trees transcoded to the binary contract

use crate::converter::{internal_error, ConvertContext, Converter, ReturnCode};
use kiln_asset::ConverterSettings;
use kiln_core::{KilnError, Resource, Value};
use std::path::{Path, PathBuf};

const FORMAT_VERSION: u32 = 2;

/// Structured-scene converter. Maps and prefabs share the code path and
/// differ only in suffix and type tags.
///
/// Maps may embed tilesets under `"Tilesets": { name: {...} }`. Each one is
/// written as its own `TileSet` sub-resource and replaced in the map by its
/// identity.
#[derive(Debug, Clone)]
pub struct SceneConverter {
    name: &'static str,
    suffixes: [&'static str; 1],
    type_tag: &'static str,
    /// Embedded field split out as sub-resources, with their type tag
    embedded: Option<(&'static str, &'static str)>,
    template: Option<PathBuf>,
}

impl SceneConverter {
    pub fn map() -> Self {
        Self {
            name: "map",
            suffixes: ["map"],
            type_tag: "Map",
            embedded: Some(("Tilesets", "TileSet")),
            template: None,
        }
    }

    pub fn prefab() -> Self {
        Self {
            name: "prefab",
            suffixes: ["fab"],
            type_tag: "Prefab",
            embedded: None,
            template: None,
        }
    }

    /// Template stamped by `create_from_template` for new sources
    pub fn with_template<P: AsRef<Path>>(mut self, template: P) -> Self {
        self.template = Some(template.as_ref().to_path_buf());
        self
    }

    /// Move embedded entries into sub-resources, leaving their identities
    fn split_embedded(
        &self,
        value: &mut Value,
        settings: &mut ConverterSettings,
        ctx: &ConvertContext,
    ) -> kiln_core::Result<()> {
        let Some((field, type_tag)) = self.embedded else {
            return Ok(());
        };
        let Some(Value::Map(entries)) = value.as_map_mut().and_then(|map| map.get_mut(field)) else {
            return Ok(());
        };
        for (name, entry) in entries.iter_mut() {
            let embedded = std::mem::take(entry);
            let id = ctx.write_sub_resource(settings, name, type_tag, embedded)?;
            *entry = Value::Int(i64::from(id.raw()));
        }
        Ok(())
    }
}

impl Converter for SceneConverter {
    fn name(&self) -> &str {
        self.name
    }

    fn suffixes(&self) -> &[&str] {
        &self.suffixes
    }

    fn content_type(&self) -> &str {
        self.type_tag
    }

    fn output_type(&self) -> &str {
        self.type_tag
    }

    fn format_version(&self) -> u32 {
        FORMAT_VERSION
    }

    fn template_path(&self) -> Option<PathBuf> {
        self.template.clone()
    }

    fn convert_file(&self, settings: &mut ConverterSettings, ctx: &ConvertContext) -> ReturnCode {
        let bytes = match ctx.read_source(settings) {
            Ok(bytes) => bytes,
            Err(e) => return internal_error(self.name, settings, e),
        };

        let tree: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(tree) => tree,
            Err(e) => {
                let err = KilnError::ParseError {
                    path: settings.source().to_path_buf(),
                    message: e.to_string(),
                };
                return internal_error(self.name, settings, err);
            }
        };
        if !tree.is_object() && !tree.is_array() {
            log::warn!(
                "{}: {} is not an object or array, skipping",
                self.name,
                settings.source().display()
            );
            return ReturnCode::Abort;
        }

        let id = ctx.bind_identity(settings);
        let mut value = Value::from(tree);
        if let Err(e) = self.split_embedded(&mut value, settings, ctx) {
            return internal_error(self.name, settings, e);
        }
        let resource = Resource::new(self.type_tag, id, value);
        match ctx.write_resource(settings, &resource) {
            Ok(()) => ReturnCode::Success,
            Err(e) => internal_error(self.name, settings, e),
        }
    }
}
