//! Narrative rendering for event metadata.
//!
//! Event detail and outcome-detail text is derived lazily from the event type
//! and the accumulated detail records. The vocabulary is closed on purpose: an
//! event type without a rendering here fails the whole run rather than being
//! described with a generic sentence.

use crate::errors::{SipError, SipResult};
use crate::premis::entities::PremisEvent;

/// Event vocabulary understood by the narrative renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    DigestCalculation,
    FilenameChange,
    PackageCreation,
    Modification,
    MetadataModification,
}

impl EventKind {
    pub fn parse(event_type: &str) -> Option<Self> {
        match event_type {
            "message digest calculation" => Some(Self::DigestCalculation),
            "filename change" => Some(Self::FilenameChange),
            "information package creation" => Some(Self::PackageCreation),
            "modification" => Some(Self::Modification),
            "metadata modification" => Some(Self::MetadataModification),
            _ => None,
        }
    }
}

fn kind_of(event_type: &str) -> SipResult<EventKind> {
    EventKind::parse(event_type)
        .ok_or_else(|| SipError::UnsupportedEventType(event_type.to_string()))
}

/// Fixed one-sentence event description per type.
pub fn event_detail(event_type: &str) -> SipResult<String> {
    let text = match kind_of(event_type)? {
        EventKind::DigestCalculation => "Checksum calculation for digital objects.",
        EventKind::FilenameChange => "Filename change.",
        EventKind::PackageCreation => "Creation of submission information package.",
        EventKind::Modification => "Modification of digital object.",
        EventKind::MetadataModification => "Modification of metadata.",
    };
    Ok(text.to_string())
}

/// Outcome narrative derived from the accumulated detail records.
///
/// A free-text note from the first detail record, when present, leads the
/// text. A non-success outcome collapses to a fixed failure sentence
/// regardless of event type.
pub fn event_outcome_detail(event: &PremisEvent) -> SipResult<String> {
    let kind = kind_of(&event.event_type)?;
    let details = event.details();

    let mut out = String::new();
    if let Some(note) = details.first().and_then(|d| d.note.as_deref()) {
        out.push_str(note);
        out.push_str("\n\n");
    }

    if event.outcome != "success" {
        out.push_str("Event failed.");
        return Ok(out);
    }

    match kind {
        EventKind::DigestCalculation => {
            // All details of one digest calculation share the same algorithm;
            // the first record names it.
            let algorithm = details
                .first()
                .and_then(|d| d.digest_algorithm.as_deref())
                .unwrap_or_default();
            out.push_str(&format!(
                "Checksum calculated with algorithm {algorithm} \
                 resulted the following checksums:"
            ));
            for detail in details {
                out.push('\n');
                out.push_str(detail.object_name.as_deref().unwrap_or_default());
                out.push_str(": ");
                out.push_str(detail.digest.as_deref().unwrap_or_default());
                if let Some(time) = detail.digest_time.as_deref() {
                    out.push_str(&format!(" (timestamp: {time})"));
                }
            }
        }
        EventKind::FilenameChange => {
            // Exactly one detail record is expected for a filename change.
            let detail = details.first().cloned().unwrap_or_default();
            out.push_str(&format!(
                "Filename changed.\nOld filename: {}\nNew filename: {}\n",
                detail.replaced_name.as_deref().unwrap_or_default(),
                detail.object_name.as_deref().unwrap_or_default(),
            ));
        }
        EventKind::PackageCreation => {
            let identifier = details
                .first()
                .and_then(|d| d.package_identifier.as_deref())
                .map(normalize_package_identifier)
                .unwrap_or_default();
            out.push_str(&format!(
                "Submission information package created as: {identifier}"
            ));
        }
        EventKind::Modification => {
            out.push_str("Object has been modified.");
        }
        EventKind::MetadataModification => {
            out.push_str("Metadata has been modified.");
        }
    }

    Ok(out)
}

/// Collapse whitespace runs in a package identifier to single underscores.
pub fn normalize_package_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::premis::entities::DetailRecord;

    fn digest_event() -> PremisEvent {
        let mut event = PremisEvent::new(
            "e1",
            "local",
            "message digest calculation",
            "success",
            "2022-02-02T00:00:00",
        );
        event.add_detail(DetailRecord {
            digest: Some("d1".into()),
            digest_algorithm: Some("MD5".into()),
            object_name: Some("f1".into()),
            ..DetailRecord::default()
        });
        event.add_detail(DetailRecord {
            digest: Some("d2".into()),
            digest_algorithm: Some("MD5".into()),
            object_name: Some("f2".into()),
            ..DetailRecord::default()
        });
        event
    }

    #[test]
    fn digest_calculation_lists_details_in_order() {
        let text = event_outcome_detail(&digest_event()).unwrap();
        assert_eq!(
            text,
            "Checksum calculated with algorithm MD5 resulted the following \
             checksums:\nf1: d1\nf2: d2"
        );
        assert_eq!(text.matches("MD5").count(), 1);
    }

    #[test]
    fn digest_calculation_appends_timestamps_when_recorded() {
        let mut event = PremisEvent::new(
            "e1",
            "local",
            "message digest calculation",
            "success",
            "2022-02-02T00:00:00",
        );
        event.add_detail(DetailRecord {
            digest: Some("abc123".into()),
            digest_algorithm: Some("MD5".into()),
            digest_time: Some("2021-03-20T00:00:00".into()),
            object_name: Some("testfile1.wav".into()),
            ..DetailRecord::default()
        });
        let text = event_outcome_detail(&event).unwrap();
        assert_eq!(
            text,
            "Checksum calculated with algorithm MD5 resulted the following \
             checksums:\ntestfile1.wav: abc123 (timestamp: 2021-03-20T00:00:00)"
        );
    }

    #[test]
    fn failed_outcome_collapses_to_failure_sentence() {
        let mut event = PremisEvent::new("e1", "local", "filename change", "failure", "t");
        event.add_detail(DetailRecord {
            note: Some("disk full".into()),
            ..DetailRecord::default()
        });
        let text = event_outcome_detail(&event).unwrap();
        assert_eq!(text, "disk full\n\nEvent failed.");
    }

    #[test]
    fn filename_change_names_both_filenames() {
        let mut event = PremisEvent::new("e1", "local", "filename change", "success", "t");
        event.add_detail(DetailRecord {
            replaced_name: Some("old.wav".into()),
            object_name: Some("new.wav".into()),
            ..DetailRecord::default()
        });
        let text = event_outcome_detail(&event).unwrap();
        assert_eq!(
            text,
            "Filename changed.\nOld filename: old.wav\nNew filename: new.wav\n"
        );
    }

    #[test]
    fn package_creation_echoes_normalized_identifier() {
        let mut event = PremisEvent::new(
            "e1",
            "local",
            "information package creation",
            "success",
            "t",
        );
        event.add_detail(DetailRecord {
            package_identifier: Some("Package 2022-02-07 123".into()),
            ..DetailRecord::default()
        });
        let text = event_outcome_detail(&event).unwrap();
        assert_eq!(
            text,
            "Submission information package created as: Package_2022-02-07_123"
        );
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let event = PremisEvent::new("e1", "local", "compression", "success", "t");
        assert!(matches!(
            event_outcome_detail(&event),
            Err(SipError::UnsupportedEventType(_))
        ));
        assert!(matches!(
            event_detail("compression"),
            Err(SipError::UnsupportedEventType(_))
        ));
    }

    #[test]
    fn whitespace_runs_collapse_to_underscores() {
        assert_eq!(
            normalize_package_identifier("Package  2022-02-07 \t 123"),
            "Package_2022-02-07_123"
        );
        assert_eq!(normalize_package_identifier("already_clean"), "already_clean");
    }
}
