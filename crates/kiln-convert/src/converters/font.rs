//! Font sources embedded verbatim

use crate::converter::{internal_error, ConvertContext, Converter, ReturnCode};
use kiln_asset::ConverterSettings;
use kiln_core::{Resource, Value};

const FORMAT_VERSION: u32 = 1;

/// Wraps TrueType/OpenType bytes in a `Font` resource.
///
/// The identity is bound before anything is read. When the resource already
/// at the destination carries a different identity, that identity is rebound
/// to the current one so earlier references follow it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontConverter;

impl Converter for FontConverter {
    fn name(&self) -> &str {
        "font"
    }

    fn suffixes(&self) -> &[&str] {
        &["ttf", "otf"]
    }

    fn content_type(&self) -> &str {
        "Font"
    }

    fn output_type(&self) -> &str {
        "Font"
    }

    fn format_version(&self) -> u32 {
        FORMAT_VERSION
    }

    fn convert_file(&self, settings: &mut ConverterSettings, ctx: &ConvertContext) -> ReturnCode {
        let id = ctx.bind_identity(settings);

        let bytes = match ctx.read_source(settings) {
            Ok(bytes) => bytes,
            Err(e) => return internal_error(self.name(), settings, e),
        };

        if let Some(existing) = ctx.existing_resource(settings) {
            if existing.identity.is_valid() && existing.identity != id {
                log::info!(
                    "Font {} identity changed {} -> {}",
                    settings.source().display(),
                    existing.identity,
                    id
                );
                ctx.rebind(existing.identity, id);
            }
        }

        let family = settings
            .source()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut value = Value::map();
        value.insert("family", Value::String(family));
        value.insert("data", Value::Bytes(bytes));

        match ctx.write_resource(settings, &Resource::new("Font", id, value)) {
            Ok(()) => ReturnCode::Success,
            Err(e) => internal_error(self.name(), settings, e),
        }
    }
}
