//! Kiln Build - Deployable artifacts from generated projects
//!
//! A [`Builder`] stamps project templates, rescans sources, and runs an
//! external [`Toolchain`]. Builds complete asynchronously: results arrive
//! on a crossbeam channel obtained from [`Builder::subscribe`].

mod builder;
mod code_builder;
mod platform;
mod toolchain;

pub use builder::{select_builder, BuildResult, Builder};
pub use code_builder::{id_name, CodeBuilder, NATIVE_SUFFIXES};
pub use platform::Platform;
pub use toolchain::{classify_line, CommandToolchain, Toolchain};
