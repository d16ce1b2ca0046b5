//! sipkit-core
//!
//! Core primitives for sipkit:
//! - PREMIS entity model (objects, events, agents, linkings)
//! - Insertion-ordered metadata graph with identifier deduplication
//! - Source adaptor contract
//! - Compilation pipeline (technical/provenance/descriptive metadata,
//!   manifest compilation, signing, packaging, cleanup)
//! - Collaborator toolkit (file scraper, manifest builder, signer, archiver)
//!
//! The core crate performs filesystem I/O only below the paths handed to it
//! by the caller. Network access, argument parsing, and adaptor selection
//! live in higher-level crates.

pub mod adaptor;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod premis;
pub mod toolkit;

pub use crate::errors::{SipError, SipResult};

/// Convenience re-exports.
pub mod prelude {
    pub use crate::adaptor::SourceAdaptor;
    pub use crate::config::Config;
    pub use crate::pipeline::{CompileOptions, SipCompiler};
    pub use crate::premis::{
        MetadataGraph, PremisAgent, PremisEvent, PremisLinking, PremisObject,
    };
    pub use crate::toolkit::Toolkit;
    pub use crate::{SipError, SipResult};
}
