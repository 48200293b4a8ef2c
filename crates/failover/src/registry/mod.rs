//! Source registry module.
//!
//! Static source configuration plus the one piece of mutable state that
//! lives outside the health tracker: each source's enabled flag.

mod source;
mod source_registry;

pub use source::Source;
pub use source_registry::SourceRegistry;
