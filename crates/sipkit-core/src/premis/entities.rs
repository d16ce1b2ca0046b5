//! PREMIS entity value types.
//!
//! All identifiers are adaptor-supplied strings. Equality of detail records is
//! full-value equality; the event uses it to keep its accumulated detail list
//! a set.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::SipResult;
use crate::premis::narrative::{self, EventKind};

/// Alternate identifier pair carried by some objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltIdentifier {
    pub identifier_type: String,
    pub value: String,
}

/// Format name/version pair used when a payload type is known up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatHint {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A digital object described by the source feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremisObject {
    pub identifier: String,
    pub identifier_type: String,
    pub original_name: String,
    /// Path relative to the source root, resolved during population.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<PathBuf>,
    pub digest_algorithm: String,
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_identifier: Option<AltIdentifier>,
    /// Objects preserved bit-level only skip format validation.
    #[serde(default)]
    pub bit_level: bool,
}

impl PremisObject {
    /// Format known from the payload itself, ahead of scraping.
    ///
    /// CSV payload files always carry a fixed format; every other payload
    /// defers to the scraper's identification.
    pub fn format_hint(&self) -> Option<FormatHint> {
        if self
            .original_name
            .to_ascii_lowercase()
            .ends_with(".csv")
        {
            return Some(FormatHint {
                name: "text/csv".to_string(),
                version: None,
            });
        }
        None
    }
}

/// One source row's contribution to an event narrative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A preservation event aggregating one or more source rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremisEvent {
    pub identifier: String,
    pub identifier_type: String,
    pub event_type: String,
    pub outcome: String,
    /// Single timestamp, or a `start/end` pair joined with `/`.
    pub datetime: String,
    #[serde(default)]
    details: Vec<DetailRecord>,
}

impl PremisEvent {
    pub fn new(
        identifier: impl Into<String>,
        identifier_type: impl Into<String>,
        event_type: impl Into<String>,
        outcome: impl Into<String>,
        datetime: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            identifier_type: identifier_type.into(),
            event_type: event_type.into(),
            outcome: outcome.into(),
            datetime: datetime.into(),
            details: Vec::new(),
        }
    }

    /// Append a detail record unless an identical one was already recorded.
    pub fn add_detail(&mut self, detail: DetailRecord) {
        if !self.details.contains(&detail) {
            self.details.push(detail);
        }
    }

    pub fn details(&self) -> &[DetailRecord] {
        &self.details
    }

    /// Fixed one-sentence description of the event type.
    pub fn detail(&self) -> SipResult<String> {
        narrative::event_detail(&self.event_type)
    }

    /// Narrative text derived from the accumulated detail records.
    pub fn outcome_detail(&self) -> SipResult<String> {
        narrative::event_outcome_detail(self)
    }
}

/// A responsible agent described by the source feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremisAgent {
    pub identifier: String,
    pub identifier_type: String,
    pub name: String,
    pub agent_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLink {
    pub identifier: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentLink {
    pub identifier: String,
    pub role: String,
}

/// Aggregates the objects and agents involved in one event.
///
/// Links are deduplicated by identifier; the first occurrence wins and a later
/// addition with a different role is dropped. Package-creation events never
/// record object links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremisLinking {
    pub identifier: String,
    object_links: Vec<ObjectLink>,
    agent_links: Vec<AgentLink>,
    suppress_object_links: bool,
}

impl PremisLinking {
    pub fn new(identifier: impl Into<String>, event_type: &str) -> Self {
        Self {
            identifier: identifier.into(),
            object_links: Vec::new(),
            agent_links: Vec::new(),
            suppress_object_links: EventKind::parse(event_type)
                == Some(EventKind::PackageCreation),
        }
    }

    pub fn add_object_link(&mut self, identifier: &str, role: &str) {
        if self.suppress_object_links {
            return;
        }
        if self.object_links.iter().any(|l| l.identifier == identifier) {
            return;
        }
        self.object_links.push(ObjectLink {
            identifier: identifier.to_string(),
            role: role.to_string(),
        });
    }

    pub fn add_agent_link(&mut self, identifier: &str, role: &str) {
        if self.agent_links.iter().any(|l| l.identifier == identifier) {
            return;
        }
        self.agent_links.push(AgentLink {
            identifier: identifier.to_string(),
            role: role.to_string(),
        });
    }

    pub fn object_links(&self) -> &[ObjectLink] {
        &self.object_links
    }

    pub fn agent_links(&self) -> &[AgentLink] {
        &self.agent_links
    }
}
