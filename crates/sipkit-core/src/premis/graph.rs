//! Insertion-ordered metadata graph.
//!
//! The graph exclusively owns all entity instances. Adds are idempotent and
//! first-write-wins; nothing is ever removed. Iteration order is the order
//! identifiers were first seen in the source feed, and generated metadata
//! follows that order.

use std::collections::HashMap;

use crate::premis::entities::{PremisAgent, PremisEvent, PremisLinking, PremisObject};

/// Identifier-keyed store that preserves insertion order.
#[derive(Debug)]
struct OrderedStore<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for OrderedStore<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> OrderedStore<T> {
    fn insert(&mut self, identifier: &str, item: T) -> bool {
        if self.index.contains_key(identifier) {
            return false;
        }
        self.index.insert(identifier.to_string(), self.items.len());
        self.items.push(item);
        true
    }

    fn get(&self, identifier: &str) -> Option<&T> {
        self.index.get(identifier).map(|&i| &self.items[i])
    }

    fn get_mut(&mut self, identifier: &str) -> Option<&mut T> {
        let i = *self.index.get(identifier)?;
        self.items.get_mut(i)
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug, Default)]
pub struct MetadataGraph {
    objects: OrderedStore<PremisObject>,
    events: OrderedStore<PremisEvent>,
    agents: OrderedStore<PremisAgent>,
    linkings: OrderedStore<PremisLinking>,
    objid: Option<String>,
}

impl MetadataGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object unless its identifier is already present.
    pub fn add_object(&mut self, object: PremisObject) {
        let identifier = object.identifier.clone();
        self.objects.insert(&identifier, object);
    }

    /// Insert an event unless its identifier is already present.
    pub fn add_event(&mut self, event: PremisEvent) {
        let identifier = event.identifier.clone();
        self.events.insert(&identifier, event);
    }

    /// Insert an agent unless its identifier is already present.
    pub fn add_agent(&mut self, agent: PremisAgent) {
        let identifier = agent.identifier.clone();
        self.agents.insert(&identifier, agent);
    }

    /// Insert a linking (deduplicated by identifier), then record the given
    /// object and agent links on the stored linking. Link-level deduplication
    /// and object-link suppression are applied by the linking itself.
    pub fn add_linking(
        &mut self,
        linking: PremisLinking,
        object_id: &str,
        object_role: &str,
        agent_id: &str,
        agent_role: &str,
    ) {
        let identifier = linking.identifier.clone();
        self.linkings.insert(&identifier, linking);
        if let Some(stored) = self.linkings.get_mut(&identifier) {
            stored.add_object_link(object_id, object_role);
            stored.add_agent_link(agent_id, agent_role);
        }
    }

    pub fn objects(&self) -> impl Iterator<Item = &PremisObject> {
        self.objects.iter()
    }

    pub fn events(&self) -> impl Iterator<Item = &PremisEvent> {
        self.events.iter()
    }

    pub fn agents(&self) -> impl Iterator<Item = &PremisAgent> {
        self.agents.iter()
    }

    pub fn linkings(&self) -> impl Iterator<Item = &PremisLinking> {
        self.linkings.iter()
    }

    pub fn object(&self, identifier: &str) -> Option<&PremisObject> {
        self.objects.get(identifier)
    }

    pub fn agent(&self, identifier: &str) -> Option<&PremisAgent> {
        self.agents.get(identifier)
    }

    pub fn linking(&self, identifier: &str) -> Option<&PremisLinking> {
        self.linkings.get(identifier)
    }

    /// Mutable event access for detail accumulation during population.
    pub fn event_mut(&mut self, identifier: &str) -> Option<&mut PremisEvent> {
        self.events.get_mut(identifier)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn linking_count(&self) -> usize {
        self.linkings.len()
    }

    /// Package-level object identifier.
    pub fn objid(&self) -> Option<&str> {
        self.objid.as_deref()
    }

    pub fn set_objid(&mut self, objid: impl Into<String>) {
        self.objid = Some(objid.into());
    }
}
