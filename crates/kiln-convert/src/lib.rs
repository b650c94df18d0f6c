//! Kiln Convert - Source → resource conversion
//!
//! Converters turn authored sources into the binary resource contract. The
//! [`ConverterRegistry`] picks one by suffix and the
//! [`ConversionOrchestrator`] decides when to run it, binds identities and
//! persists the settings record.

mod converter;
pub mod converters;
mod orchestrator;
mod registry;

pub use converter::{ConvertContext, Converter, ReturnCode};
pub use orchestrator::{
    AssetStatus, ConversionOrchestrator, ConversionReason, ConversionReport, DiskFacts, FileFacts,
    Outcome,
};
pub use registry::ConverterRegistry;
