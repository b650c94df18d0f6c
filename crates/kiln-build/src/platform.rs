//! Target platforms and their artifact naming

use kiln_core::KilnError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    #[default]
    Desktop,
    Web,
    Android,
}

impl Platform {
    pub fn name(self) -> &'static str {
        match self {
            Platform::Desktop => "desktop",
            Platform::Web => "web",
            Platform::Android => "android",
        }
    }

    /// File name of a library-style build, loaded by the editor
    pub fn library_name(self, project: &str) -> String {
        match self {
            Platform::Desktop => format!("{}-editor{}", project, std::env::consts::DLL_SUFFIX),
            Platform::Web => format!("{}.wasm", project),
            Platform::Android => format!("lib{}.so", project),
        }
    }

    /// File name of an application-style build deployed to a target
    pub fn application_name(self, project: &str) -> String {
        match self {
            Platform::Desktop => format!("{}{}", project, std::env::consts::EXE_SUFFIX),
            Platform::Web => format!("{}.html", project),
            Platform::Android => format!("{}.apk", project),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = KilnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "desktop" | "windows" | "linux" | "macos" => Ok(Platform::Desktop),
            "web" | "webgl" | "wasm" => Ok(Platform::Web),
            "android" => Ok(Platform::Android),
            other => Err(KilnError::ConfigError(format!("Unknown platform '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("Web".parse::<Platform>().unwrap(), Platform::Web);
        assert_eq!("linux".parse::<Platform>().unwrap(), Platform::Desktop);
        assert!("playstation".parse::<Platform>().is_err());
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(Platform::Web.library_name("hero"), "hero.wasm");
        assert_eq!(Platform::Web.application_name("hero"), "hero.html");
        assert_eq!(Platform::Android.library_name("hero"), "libhero.so");
        assert_eq!(Platform::Android.application_name("hero"), "hero.apk");
        assert!(Platform::Desktop.library_name("hero").starts_with("hero-editor"));
    }
}
