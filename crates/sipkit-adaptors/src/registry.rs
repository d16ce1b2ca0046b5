//! Adaptor registry and resolution.
//!
//! The registry stores adaptor instances keyed by their stable names and
//! resolves the name given in configuration. It is constructed explicitly and
//! passed to callers; there is no global mutable state. Lookup of an unknown
//! name fails before any source I/O happens.

use std::collections::BTreeMap;

use sipkit_core::adaptor::SourceAdaptor;
use sipkit_core::{SipError, SipResult};

pub struct AdaptorRegistry {
    adaptors: BTreeMap<String, Box<dyn SourceAdaptor>>,
}

impl AdaptorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            adaptors: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.adaptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adaptors.is_empty()
    }

    /// Register an adaptor under its own name.
    pub fn register(&mut self, adaptor: Box<dyn SourceAdaptor>) -> SipResult<()> {
        let name = adaptor.name().to_string();
        if name.trim().is_empty() {
            return Err(SipError::config("adaptor name is empty"));
        }
        if self.adaptors.contains_key(&name) {
            return Err(SipError::config(format!(
                "adaptor name already registered: {name}"
            )));
        }
        self.adaptors.insert(name, adaptor);
        Ok(())
    }

    /// Resolve an adaptor by its configured name.
    pub fn get(&self, name: &str) -> SipResult<&dyn SourceAdaptor> {
        self.adaptors
            .get(name)
            .map(|a| a.as_ref())
            .ok_or_else(|| SipError::UnknownAdaptor(name.to_string()))
    }

    /// Registered names in deterministic order.
    pub fn list_names(&self) -> Vec<String> {
        self.adaptors.keys().cloned().collect()
    }
}

impl Default for AdaptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
