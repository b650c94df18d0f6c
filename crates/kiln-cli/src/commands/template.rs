//! Template stamping command

use anyhow::Result;
use kiln_core::{TemplateEngine, TemplateValues};
use std::path::Path;

pub fn run(src: &Path, dst: &Path, defines: Vec<(String, String)>) -> Result<()> {
    let values: TemplateValues = defines.into_iter().collect();
    let engine = TemplateEngine::with_values(values);

    if !engine.copy_template(src, dst) {
        anyhow::bail!("Template {} was not written to {}", src.display(), dst.display());
    }
    println!("Wrote {}", dst.display());
    Ok(())
}
