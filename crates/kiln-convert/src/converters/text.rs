//! Plain text passthrough

use crate::converter::{internal_error, ConvertContext, Converter, ReturnCode};
use kiln_asset::ConverterSettings;
use kiln_core::{Resource, Value};

const FORMAT_VERSION: u32 = 1;

/// Import property that ships the source file itself instead of a resource
pub const RAW_PROPERTY: &str = "raw";

/// Stores source bytes unparsed in a `Text` resource
#[derive(Debug, Clone, Copy, Default)]
pub struct TextConverter;

impl Converter for TextConverter {
    fn name(&self) -> &str {
        "text"
    }

    fn suffixes(&self) -> &[&str] {
        &["txt", "json", "xml", "html", "css", "md"]
    }

    fn content_type(&self) -> &str {
        "Text"
    }

    fn output_type(&self) -> &str {
        "Text"
    }

    fn format_version(&self) -> u32 {
        FORMAT_VERSION
    }

    fn convert_file(&self, settings: &mut ConverterSettings, ctx: &ConvertContext) -> ReturnCode {
        if settings
            .property(RAW_PROPERTY)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            return ReturnCode::CopyAsIs;
        }

        let bytes = match ctx.read_source(settings) {
            Ok(bytes) => bytes,
            Err(e) => return internal_error(self.name(), settings, e),
        };

        let id = ctx.bind_identity(settings);
        match ctx.write_resource(settings, &Resource::new("Text", id, Value::Bytes(bytes))) {
            Ok(()) => ReturnCode::Success,
            Err(e) => internal_error(self.name(), settings, e),
        }
    }
}
