//! Kiln Core - Foundational types for the Kiln content pipeline
//!
//! This crate provides the types every other Kiln crate depends on:
//! - `AssetId` - Stable asset identities
//! - `ContentHash` - SHA-256 based source change detection
//! - `Value` - The structured intermediate form used by converters
//! - `Resource` - The versioned binary resource contract
//! - `SourceScanner` / `TemplateEngine` - file-level utilities shared by
//!   the converters and the builders
//! - `ProjectConfig` - layered project configuration
//! - Error types and Result alias

mod config;
mod error;
mod hash;
mod id;
mod resource;
mod scan;
mod template;
mod value;

pub use config::{BuildSection, ProjectConfig, ProjectSection};
pub use error::{KilnError, Result};
pub use hash::ContentHash;
pub use id::AssetId;
pub use resource::{write_atomic, Resource, RESOURCE_FORMAT_VERSION};
pub use scan::{has_suffix, SourceScanner};
pub use template::{format_list, ListStyle, TemplateEngine, TemplateValues};
pub use value::Value;
