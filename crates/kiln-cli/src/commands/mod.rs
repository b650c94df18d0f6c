//! CLI command implementations

pub mod build;
pub mod convert;
pub mod init;
pub mod list;
pub mod new;
pub mod status;
pub mod template;
pub mod toolchain;
