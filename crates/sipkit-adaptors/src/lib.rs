//! Source adaptors for sipkit.
//!
//! An adaptor translates one source-specific metadata feed into the internal
//! metadata graph. This crate provides the registry used to select an
//! adaptor by its configured name, plus the built-in adaptors:
//! - `csv-feed`: tabular feed with a fixed column contract
//! - `folder`: plain folder of digital objects, no feed

pub mod csv_feed;
pub mod folder;
pub mod registry;

pub use registry::AdaptorRegistry;

use sipkit_core::SipResult;

/// Registry preloaded with the built-in adaptors.
pub fn builtin_registry() -> SipResult<AdaptorRegistry> {
    let mut registry = AdaptorRegistry::new();
    registry.register(Box::new(csv_feed::CsvFeedAdaptor::new()))?;
    registry.register(Box::new(folder::FolderAdaptor::new()))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_adaptors_are_registered() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.list_names(), vec!["csv-feed", "folder"]);
        assert!(registry.get("csv-feed").is_ok());
    }
}
