//! Project initialization command

use anyhow::Result;
use std::fs;
use std::path::Path;

pub fn run(name: &str) -> Result<()> {
    let project_dir = Path::new(name);

    if project_dir.exists() {
        anyhow::bail!("Directory '{}' already exists", name);
    }

    // Create directory structure
    fs::create_dir_all(project_dir.join("content/maps"))?;
    fs::create_dir_all(project_dir.join("content/prefabs"))?;
    fs::create_dir_all(project_dir.join("import"))?;
    fs::create_dir_all(project_dir.join("generated"))?;
    fs::create_dir_all(project_dir.join("templates/desktop"))?;
    fs::create_dir_all(project_dir.join("src"))?;

    let project_name = project_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());

    fs::write(
        project_dir.join("kiln.toml"),
        format!(
            r#"[project]
name = "{}"
content = "content"
import = "import"
generated = "generated"
templates = "templates"

[build]
platform = "desktop"
# toolchain = "cmake"
# build_args = ["--build", "."]
"#,
            project_name
        ),
    )?;

    // Templates picked up by `kiln new`
    fs::write(
        project_dir.join("templates/Prefab.fab"),
        r#"{
    "Name": "${templateName}",
    "Children": []
}
"#,
    )?;

    fs::write(
        project_dir.join("templates/Map.map"),
        r#"{
    "Name": "${templateName}",
    "Entities": []
}
"#,
    )?;

    // Native project stamped by `kiln build`
    fs::write(
        project_dir.join("templates/desktop/CMakeLists.txt"),
        r#"cmake_minimum_required(VERSION 3.16)
project(${idName})

# Marked regions below are rewritten on every build
set(SOURCES
# //+ FilesList
# //-
)

add_library(${idName} SHARED ${SOURCES})
target_include_directories(${idName} PRIVATE
# //+ includePaths
# //-
)
target_link_directories(${idName} PRIVATE
# //+ libraryPaths
# //-
)
target_link_libraries(${idName} PRIVATE
# //+ libraries
# //-
)
"#,
    )?;

    fs::write(
        project_dir.join("src/main.cpp"),
        r#"int main()
{
    return 0;
}
"#,
    )?;

    println!("Created project '{}'", project_name);
    println!();
    println!("  {}/", name);
    println!("  ├── kiln.toml");
    println!("  ├── content/");
    println!("  │   ├── maps/");
    println!("  │   └── prefabs/");
    println!("  ├── import/");
    println!("  ├── generated/");
    println!("  ├── templates/");
    println!("  │   ├── Prefab.fab");
    println!("  │   ├── Map.map");
    println!("  │   └── desktop/CMakeLists.txt");
    println!("  └── src/");
    println!();
    println!("Next steps:");
    println!("  kiln -C {} new fab prefabs/Hero", name);
    println!("  kiln -C {} convert", name);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::ProjectConfig;

    #[test]
    fn test_init_creates_loadable_project() {
        let dir = std::env::temp_dir().join(format!("kiln_init_{}", uuid::Uuid::new_v4()));
        let path = dir.join("hero");
        fs::create_dir_all(&dir).unwrap();

        run(path.to_str().unwrap()).unwrap();

        let config = ProjectConfig::load_from_file(&path.join("kiln.toml")).unwrap();
        assert_eq!(config.name(), "hero");
        assert!(config.content_dir().is_dir());
        assert!(config.templates_dir().join("Prefab.fab").is_file());
        assert!(run(path.to_str().unwrap()).is_err());

        fs::remove_dir_all(&dir).ok();
    }
}
