//! Built-in converters

mod control_scheme;
mod font;
mod scene;
mod text;
mod translator;

pub use control_scheme::{ControlSchemeConverter, SCHEME_FIELD};
pub use font::FontConverter;
pub use scene::SceneConverter;
pub use text::{TextConverter, RAW_PROPERTY};
pub use translator::{parse_pairs, TranslatorConverter};

use crate::converter::Converter;
use std::sync::Arc;

/// Every built-in converter in registration order
pub fn defaults() -> Vec<Arc<dyn Converter>> {
    vec![
        Arc::new(SceneConverter::map()),
        Arc::new(SceneConverter::prefab()),
        Arc::new(FontConverter),
        Arc::new(TranslatorConverter),
        Arc::new(ControlSchemeConverter),
        Arc::new(TextConverter),
    ]
}
