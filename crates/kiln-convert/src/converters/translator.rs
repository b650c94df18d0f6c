//! Localization tables: one `key;value` pair per line

use crate::converter::{internal_error, ConvertContext, Converter, ReturnCode};
use kiln_asset::ConverterSettings;
use kiln_core::{Resource, Value};
use std::collections::BTreeMap;

const FORMAT_VERSION: u32 = 1;

/// Parse `key;value` lines into a pair table.
///
/// The first `;`-separated segment is the key and the last is the value, so
/// `key;comment;value` keeps only `key` and `value`. Lines without a `;` or
/// with an empty key are ignored. Later duplicates win.
pub fn parse_pairs(text: &str) -> BTreeMap<String, String> {
    let mut pairs = BTreeMap::new();
    for line in text.lines() {
        let mut segments = line.split(';');
        let key = segments.next().unwrap_or_default();
        let Some(value) = segments.last() else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        pairs.insert(key.to_string(), value.to_string());
    }
    pairs
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TranslatorConverter;

impl Converter for TranslatorConverter {
    fn name(&self) -> &str {
        "translator"
    }

    fn suffixes(&self) -> &[&str] {
        &["csv"]
    }

    fn content_type(&self) -> &str {
        "Translator"
    }

    fn output_type(&self) -> &str {
        "Translator"
    }

    fn format_version(&self) -> u32 {
        FORMAT_VERSION
    }

    fn convert_file(&self, settings: &mut ConverterSettings, ctx: &ConvertContext) -> ReturnCode {
        let bytes = match ctx.read_source(settings) {
            Ok(bytes) => bytes,
            Err(e) => return internal_error(self.name(), settings, e),
        };
        let pairs = parse_pairs(&String::from_utf8_lossy(&bytes));

        // The table is replaced whole on every conversion
        let table = pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
        let resource = Resource::new(self.output_type(), ctx.bind_identity(settings), Value::Map(table));

        match ctx.write_resource(settings, &resource) {
            Ok(()) => ReturnCode::Success,
            Err(e) => internal_error(self.name(), settings, e),
        }
    }
}
