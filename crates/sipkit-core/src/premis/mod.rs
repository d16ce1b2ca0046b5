//! PREMIS metadata model.
//!
//! Entities are plain structs populated once by a source adaptor and read-only
//! afterwards. The [`MetadataGraph`] owns every entity instance and preserves
//! feed insertion order, which downstream metadata generation relies on.

pub mod entities;
pub mod graph;
pub mod narrative;

pub use entities::{
    AgentLink, AltIdentifier, DetailRecord, FormatHint, ObjectLink, PremisAgent, PremisEvent,
    PremisLinking, PremisObject,
};
pub use graph::MetadataGraph;
pub use narrative::{normalize_package_identifier, EventKind};
