//! Literal `${key}` substitution over template files
//!
//! This is deliberately not a template language. Every `${key}` whose key
//! is present in the value map is replaced with the value text, everywhere
//! it occurs, in a single left-to-right pass: substituted text is never
//! rescanned, and there is no escaping. Tokens whose key is unknown are left
//! untouched. Callers pick keys distinctive enough not to collide with
//! ordinary template content.

use crate::resource::write_atomic;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Substitution values keyed by bare identifier (`projectName`, not `${projectName}`)
pub type TemplateValues = BTreeMap<String, String>;

const REGION_BEGIN: &str = "//+";
const REGION_END: &str = "//-";
const TEMPLATE_NAME: &str = "templateName";

/// How a list is rendered into a single template value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListStyle {
    pub prefix: String,
    pub suffix: String,
    pub separator: String,
}

impl Default for ListStyle {
    /// Twelve-space indented, double-quoted, comma separated
    fn default() -> Self {
        Self {
            prefix: format!("{}\"", " ".repeat(12)),
            suffix: "\"".to_string(),
            separator: ",".to_string(),
        }
    }
}

/// Render `items` one per line as `prefix item suffix`, separated by
/// `separator` (no separator after the last item).
pub fn format_list<S: AsRef<str>>(items: &[S], style: &ListStyle) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        out.push_str(&style.prefix);
        out.push_str(item.as_ref());
        out.push_str(&style.suffix);
        if i + 1 < items.len() {
            out.push_str(&style.separator);
        }
        out.push('\n');
    }
    out
}

/// Stamps template files with a value map
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    values: TemplateValues,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: TemplateValues) -> Self {
        Self { values }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn values(&self) -> &TemplateValues {
        &self.values
    }

    /// Substitute every known `${key}` in `data`
    pub fn render_bytes(&self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        let mut i = 0;
        while i < data.len() {
            if data[i] == b'$' && data.get(i + 1) == Some(&b'{') {
                if let Some(len) = data[i + 2..].iter().position(|&b| b == b'}') {
                    let key = &data[i + 2..i + 2 + len];
                    let value = std::str::from_utf8(key)
                        .ok()
                        .and_then(|k| self.values.get(k));
                    if let Some(value) = value {
                        out.extend_from_slice(value.as_bytes());
                        i += len + 3;
                        continue;
                    }
                }
            }
            out.push(data[i]);
            i += 1;
        }
        out
    }

    pub fn render(&self, text: &str) -> String {
        match String::from_utf8(self.render_bytes(text.as_bytes())) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }

    /// Read `src`, substitute values and write the result to `dst`.
    ///
    /// Returns `false` (and writes nothing) when the template cannot be read
    /// or the destination cannot be written. Parent directories of `dst` are
    /// created as needed.
    pub fn copy_template<P: AsRef<Path>, Q: AsRef<Path>>(&self, src: P, dst: Q) -> bool {
        let (src, dst) = (src.as_ref(), dst.as_ref());
        let data = match fs::read(src) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Template {} unreadable: {}", src.display(), e);
                return false;
            }
        };

        match write_atomic(dst, &self.render_bytes(&data)) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Template output not written: {}", e);
                false
            }
        }
    }

    /// Whether the template at `path` contains `//+ key` regions and should
    /// be applied with [`update_template`](Self::update_template)
    pub fn has_regions<P: AsRef<Path>>(path: P) -> bool {
        fs::read_to_string(path)
            .map(|text| text.contains(REGION_BEGIN))
            .unwrap_or(false)
    }

    /// Regenerate the marked regions of a generated file.
    ///
    /// Reads `dst` when it already exists (so hand edits outside the markers
    /// survive), otherwise `src`. A line containing `//+ key` opens a region:
    /// the value of `key` is emitted after it and every line up to the
    /// closing `//-` is dropped. Lines outside regions get `${key}`
    /// substitution.
    pub fn update_template<P: AsRef<Path>, Q: AsRef<Path>>(&self, src: P, dst: Q) -> bool {
        let (src, dst) = (src.as_ref(), dst.as_ref());
        let input = if dst.exists() { dst } else { src };
        let text = match fs::read_to_string(input) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Template {} unreadable: {}", input.display(), e);
                return false;
            }
        };

        let mut out = String::with_capacity(text.len());
        let mut in_region = false;
        for line in text.split_inclusive('\n') {
            if in_region {
                if line.contains(REGION_END) {
                    in_region = false;
                    out.push_str(line);
                }
                continue;
            }

            out.push_str(&self.render(line));
            if let Some(index) = line.find(REGION_BEGIN) {
                in_region = true;
                let key = line[index + REGION_BEGIN.len()..].trim();
                if let Some(value) = self.values.get(key).filter(|v| !v.is_empty()) {
                    out.push_str(value);
                    if !value.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
        }

        match write_atomic(dst, out.as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Template output not written: {}", e);
                false
            }
        }
    }

    /// Create a new asset source from a template, substituting
    /// `${templateName}` with the base name of `dst`.
    pub fn create_from_template<P: AsRef<Path>, Q: AsRef<Path>>(template: P, dst: Q) -> bool {
        let dst = dst.as_ref();
        let base = dst
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.split('.').next().unwrap_or(n).to_string())
            .unwrap_or_default();

        let mut engine = TemplateEngine::new();
        engine.set(TEMPLATE_NAME, base);
        engine.copy_template(template, dst)
    }
}
