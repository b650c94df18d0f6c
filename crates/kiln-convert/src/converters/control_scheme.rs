//! Input control schemes merged into an existing resource

use crate::converter::{internal_error, ConvertContext, Converter, ReturnCode};
use kiln_asset::ConverterSettings;
use kiln_core::{KilnError, Resource, Value};

const FORMAT_VERSION: u32 = 1;

/// Field holding the parsed scheme inside the resource map
pub const SCHEME_FIELD: &str = "ControlScheme";

/// Parses a JSON control scheme and stores it under [`SCHEME_FIELD`].
///
/// Any other fields already present in the destination resource are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlSchemeConverter;

impl Converter for ControlSchemeConverter {
    fn name(&self) -> &str {
        "control-scheme"
    }

    fn suffixes(&self) -> &[&str] {
        &["controls"]
    }

    fn content_type(&self) -> &str {
        "ControlScheme"
    }

    fn output_type(&self) -> &str {
        "ControlScheme"
    }

    fn format_version(&self) -> u32 {
        FORMAT_VERSION
    }

    fn convert_file(&self, settings: &mut ConverterSettings, ctx: &ConvertContext) -> ReturnCode {
        let bytes = match ctx.read_source(settings) {
            Ok(bytes) => bytes,
            Err(e) => return internal_error(self.name(), settings, e),
        };
        let scheme: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(scheme) => scheme,
            Err(e) => {
                let err = KilnError::ParseError {
                    path: settings.source().to_path_buf(),
                    message: e.to_string(),
                };
                return internal_error(self.name(), settings, err);
            }
        };

        let id = ctx.bind_identity(settings);
        let mut resource = match ctx.existing_resource(settings) {
            Some(existing) if existing.type_tag == self.output_type() => existing,
            _ => Resource::new(self.output_type(), id, Value::map()),
        };
        resource.identity = id;
        resource.value.insert(SCHEME_FIELD, Value::from(scheme));

        match ctx.write_resource(settings, &resource) {
            Ok(()) => ReturnCode::Success,
            Err(e) => internal_error(self.name(), settings, e),
        }
    }
}
