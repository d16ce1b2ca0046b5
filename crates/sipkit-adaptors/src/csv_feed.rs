//! Tabular (CSV) feed adaptor.
//!
//! The feed is a header-driven CSV file located directly under the source
//! root, one row per (object, event, agent) combination. Rows sharing an
//! event identifier aggregate into one event. Column values `""` and `null`
//! (any case) are treated as absent.
//!
//! Column contract:
//! - object: `object-uuid`, `object-name`, `checksum-type`, `checksum`,
//!   `checksum-time`, `checksum-status` (optional), `object-id` (optional
//!   alternate identifier), `object-role` (optional), `bit-level` (optional)
//! - event: `event-id`, `event`, `event-outcome`, `event-time-start`,
//!   `event-time-end`, `event-note`, `replaced-name`, `sip-id`
//! - agent: `agent-id`, `agent-name`, `agent-type`, `agent-role`

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::PrimitiveDateTime;
use tracing::{debug, info};
use walkdir::WalkDir;

use sipkit_core::adaptor::SourceAdaptor;
use sipkit_core::config::Config;
use sipkit_core::premis::{
    normalize_package_identifier, AltIdentifier, DetailRecord, EventKind, MetadataGraph,
    PremisAgent, PremisEvent, PremisLinking, PremisObject,
};
use sipkit_core::toolkit::manifest::MANIFEST_NAME;
use sipkit_core::toolkit::Toolkit;
use sipkit_core::{SipError, SipResult};

pub const ADAPTOR_NAME: &str = "csv-feed";

mod columns {
    pub const OBJECT_UUID: &str = "object-uuid";
    pub const OBJECT_NAME: &str = "object-name";
    pub const OBJECT_ID: &str = "object-id";
    pub const OBJECT_ROLE: &str = "object-role";
    pub const CHECKSUM_TYPE: &str = "checksum-type";
    pub const CHECKSUM: &str = "checksum";
    pub const CHECKSUM_TIME: &str = "checksum-time";
    pub const CHECKSUM_STATUS: &str = "checksum-status";
    pub const BIT_LEVEL: &str = "bit-level";
    pub const EVENT_ID: &str = "event-id";
    pub const EVENT: &str = "event";
    pub const EVENT_OUTCOME: &str = "event-outcome";
    pub const EVENT_TIME_START: &str = "event-time-start";
    pub const EVENT_TIME_END: &str = "event-time-end";
    pub const EVENT_NOTE: &str = "event-note";
    pub const REPLACED_NAME: &str = "replaced-name";
    pub const SIP_ID: &str = "sip-id";
    pub const AGENT_ID: &str = "agent-id";
    pub const AGENT_NAME: &str = "agent-name";
    pub const AGENT_TYPE: &str = "agent-type";
    pub const AGENT_ROLE: &str = "agent-role";
}

const FEED_TIME: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const ISO_TIME: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

#[derive(Debug, Clone, Default)]
pub struct CsvFeedAdaptor;

impl CsvFeedAdaptor {
    pub fn new() -> Self {
        Self
    }

    fn add_row(
        &self,
        graph: &mut MetadataGraph,
        row: &FeedRow,
        source_path: &Path,
        config: &Config,
        package_id_declared: &mut bool,
    ) -> SipResult<()> {
        let event_type = row.require(columns::EVENT)?.to_string();

        // The first package-creation row naming a package identifier fixes
        // the package objid; later declarations do not overwrite it.
        if !*package_id_declared && EventKind::parse(&event_type) == Some(EventKind::PackageCreation)
        {
            if let Some(sip_id) = row.get(columns::SIP_ID) {
                graph.set_objid(normalize_package_identifier(sip_id));
                *package_id_declared = true;
            }
        }

        let mut object = object_from_row(row)?;
        if object
            .digest_algorithm
            .eq_ignore_ascii_case(&config.script.used_checksum)
            && row.flag(columns::CHECKSUM_STATUS, true)
        {
            object.filepath = Some(find_object_path(source_path, &object.original_name)?);
            graph.add_object(object);
        }

        let event = event_from_row(row, &event_type)?;
        let event_id = event.identifier.clone();
        graph.add_event(event);
        if let Some(stored) = graph.event_mut(&event_id) {
            stored.add_detail(detail_from_row(row)?);
        }

        graph.add_agent(agent_from_row(row)?);

        let linking = PremisLinking::new(&event_id, &event_type);
        let object_id = row.require(columns::OBJECT_UUID)?;
        let object_role = row.get(columns::OBJECT_ROLE).unwrap_or("target");
        let agent_id = agent_identifier(row.require(columns::AGENT_ID)?);
        let agent_role = row.require(columns::AGENT_ROLE)?;
        graph.add_linking(linking, object_id, object_role, &agent_id, agent_role);
        Ok(())
    }
}

impl SourceAdaptor for CsvFeedAdaptor {
    fn name(&self) -> &str {
        ADAPTOR_NAME
    }

    fn populate(&self, source_path: &Path, config: &Config) -> SipResult<MetadataGraph> {
        let feed = find_feed_file(source_path, &config.script.csv_ending)?;
        info!(feed = %feed.display(), "reading metadata feed");

        let mut graph = MetadataGraph::new();
        let feed_name = feed
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        // fallback package identifier for feeds without a declared one
        graph.set_objid(
            feed_name
                .strip_suffix(&config.script.csv_ending)
                .unwrap_or(&feed_name),
        );

        let mut reader = csv::Reader::from_path(&feed)
            .map_err(|e| SipError::feed(format!("cannot read {}: {e}", feed.display())))?;
        let mut package_id_declared = false;
        let mut rows = 0usize;
        for record in reader.deserialize::<HashMap<String, String>>() {
            let row = FeedRow {
                values: record.map_err(|e| SipError::feed_row(e.to_string()))?,
            };
            self.add_row(&mut graph, &row, source_path, config, &mut package_id_declared)?;
            rows += 1;
        }
        debug!(
            rows,
            objects = graph.object_count(),
            events = graph.event_count(),
            agents = graph.agent_count(),
            "metadata feed populated"
        );
        Ok(graph)
    }

    fn desc_root_remove(&self, config: &Config) -> bool {
        config.script.desc_root_remove
    }

    fn exclude_patterns(&self, config: &Config) -> Vec<String> {
        vec![
            format!("*{}", config.script.csv_ending),
            format!("*{}", config.script.meta_ending),
            // hidden files and directories at any depth
            ".*".to_string(),
            "*/.*".to_string(),
        ]
    }

    fn post_tasks(
        &self,
        graph: &MetadataGraph,
        temp_path: &Path,
        source_path: &Path,
        toolkit: &Toolkit,
    ) -> SipResult<()> {
        let manifest_path = temp_path.join(MANIFEST_NAME);
        if !manifest_path.exists() {
            return Ok(());
        }
        let raw = fs::read_to_string(&manifest_path)?;
        let mut manifest: Value = serde_json::from_str(&raw)?;

        append_alternative_ids(graph, &mut manifest);
        regrade_html_files(&mut manifest, source_path, toolkit);

        fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)?;
        Ok(())
    }
}

/// One feed row with null normalization.
struct FeedRow {
    values: HashMap<String, String>,
}

impl FeedRow {
    fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
    }

    fn require(&self, key: &str) -> SipResult<&str> {
        self.get(key)
            .ok_or_else(|| SipError::feed_row(format!("missing value for column '{key}'")))
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            None => default,
            Some(value) => value == "1" || value.eq_ignore_ascii_case("true"),
        }
    }
}

fn object_from_row(row: &FeedRow) -> SipResult<PremisObject> {
    Ok(PremisObject {
        identifier: row.require(columns::OBJECT_UUID)?.to_string(),
        identifier_type: "UUID".to_string(),
        original_name: row.require(columns::OBJECT_NAME)?.to_string(),
        filepath: None,
        digest_algorithm: row.require(columns::CHECKSUM_TYPE)?.to_string(),
        digest: row.require(columns::CHECKSUM)?.to_string(),
        alt_identifier: row.get(columns::OBJECT_ID).map(|value| AltIdentifier {
            identifier_type: "local".to_string(),
            value: value.to_string(),
        }),
        bit_level: row.flag(columns::BIT_LEVEL, false),
    })
}

fn event_from_row(row: &FeedRow, event_type: &str) -> SipResult<PremisEvent> {
    let start_raw = row.require(columns::EVENT_TIME_START)?;
    let start = render_timestamp(start_raw)?;
    let datetime = match row.get(columns::EVENT_TIME_END) {
        Some(end_raw) if end_raw != start_raw => {
            format!("{start}/{}", render_timestamp(end_raw)?)
        }
        _ => start,
    };

    Ok(PremisEvent::new(
        row.require(columns::EVENT_ID)?,
        "local",
        event_type,
        row.require(columns::EVENT_OUTCOME)?,
        datetime,
    ))
}

fn detail_from_row(row: &FeedRow) -> SipResult<DetailRecord> {
    let digest_time = match row.get(columns::CHECKSUM_TIME) {
        Some(raw) => Some(render_timestamp(raw)?),
        None => None,
    };
    Ok(DetailRecord {
        digest: row.get(columns::CHECKSUM).map(str::to_string),
        digest_algorithm: row.get(columns::CHECKSUM_TYPE).map(str::to_string),
        digest_time,
        object_name: row.get(columns::OBJECT_NAME).map(str::to_string),
        replaced_name: row.get(columns::REPLACED_NAME).map(str::to_string),
        package_identifier: row.get(columns::SIP_ID).map(str::to_string),
        note: row.get(columns::EVENT_NOTE).map(str::to_string),
    })
}

fn agent_from_row(row: &FeedRow) -> SipResult<PremisAgent> {
    Ok(PremisAgent {
        identifier: agent_identifier(row.require(columns::AGENT_ID)?),
        identifier_type: "local".to_string(),
        name: row.require(columns::AGENT_NAME)?.to_string(),
        agent_type: row.require(columns::AGENT_TYPE)?.to_string(),
    })
}

fn agent_identifier(raw: &str) -> String {
    format!("agent-{raw}")
}

/// Re-render a feed timestamp (`YYYY-MM-DD HH:MM:SS`, or already ISO) to
/// `YYYY-MM-DDTHH:MM:SS`.
fn render_timestamp(raw: &str) -> SipResult<String> {
    let parsed = PrimitiveDateTime::parse(raw, FEED_TIME)
        .or_else(|_| PrimitiveDateTime::parse(raw, ISO_TIME))
        .map_err(|e| SipError::feed_row(format!("invalid timestamp '{raw}': {e}")))?;
    parsed
        .format(ISO_TIME)
        .map_err(|e| SipError::feed_row(format!("cannot render timestamp '{raw}': {e}")))
}

/// Locate the feed file directly under the source root.
fn find_feed_file(source_path: &Path, ending: &str) -> SipResult<PathBuf> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(source_path)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(ending) {
            candidates.push(entry.path());
        }
    }
    candidates.sort();
    if candidates.len() > 1 {
        debug!(
            count = candidates.len(),
            "multiple feed candidates, using the first"
        );
    }
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| SipError::MissingMetadataFeed {
            path: source_path.to_path_buf(),
            ending: ending.to_string(),
        })
}

/// Resolve an object's path by searching the source tree for its name.
fn find_object_path(source_path: &Path, original_name: &str) -> SipResult<PathBuf> {
    for entry in WalkDir::new(source_path).sort_by_file_name() {
        let entry = entry.map_err(|e| SipError::feed(format!("cannot walk source tree: {e}")))?;
        if entry.file_type().is_file() && entry.file_name().to_str() == Some(original_name) {
            return entry
                .path()
                .strip_prefix(source_path)
                .map(|p| p.to_path_buf())
                .map_err(|e| SipError::feed(e.to_string()));
        }
    }
    Err(SipError::MissingDigitalObject(original_name.to_string()))
}

/// Add the alternate identifier to technical sections that carry only their
/// primary identifier.
fn append_alternative_ids(graph: &MetadataGraph, manifest: &mut Value) {
    let Some(sections) = manifest.get_mut("technical").and_then(Value::as_array_mut) else {
        return;
    };
    for section in sections {
        let has_alt = section
            .get("alt_identifiers")
            .and_then(Value::as_array)
            .map(|a| !a.is_empty())
            .unwrap_or(false);
        if has_alt {
            continue;
        }
        let Some(identifier) = section.get("identifier").and_then(Value::as_str) else {
            continue;
        };
        let Some(object) = graph.object(identifier.trim()) else {
            continue;
        };
        if let Some(alt) = &object.alt_identifier {
            section["alt_identifiers"] = json!([{
                "identifier_type": alt.identifier_type,
                "value": alt.value,
            }]);
        }
    }
}

/// Re-check HTML payloads; a file that fails the well-formedness check is
/// regraded to plain text and loses its format version.
fn regrade_html_files(manifest: &mut Value, source_path: &Path, toolkit: &Toolkit) {
    let Some(sections) = manifest.get_mut("technical").and_then(Value::as_array_mut) else {
        return;
    };
    for section in sections {
        let is_html = section
            .get("format")
            .and_then(|f| f.get("name"))
            .and_then(Value::as_str)
            .map(|name| name.contains("text/html"))
            .unwrap_or(false);
        if !is_html {
            continue;
        }
        let Some(relative) = section.get("path").and_then(Value::as_str) else {
            continue;
        };
        let report = toolkit.scraper.scrape(&source_path.join(relative), true);
        if report.well_formed == Some(false) {
            debug!(path = relative, "HTML payload failed well-formedness, regrading");
            section["format"]["name"] = json!("text/plain; alt-format=text/html");
            if let Some(format) = section.get_mut("format").and_then(Value::as_object_mut) {
                format.remove("version");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_HEADER: &str = "object-uuid,object-name,object-id,object-role,checksum-type,\
                               checksum,checksum-time,checksum-status,bit-level,event-id,event,\
                               event-outcome,event-time-start,event-time-end,event-note,\
                               replaced-name,sip-id,agent-id,agent-name,agent-type,agent-role";

    fn config() -> Config {
        use sipkit_core::config::{OrganizationConfig, ScriptConfig};
        Config {
            organization: OrganizationConfig {
                name: "Archive X".into(),
                contract: "urn:uuid:474418c5-79a6-4e86-bfc8-5aed0a3337d7".into(),
                sign_key: PathBuf::from("sign.key"),
            },
            script: ScriptConfig {
                adaptor: ADAPTOR_NAME.into(),
                meta_ending: "___metadata.xml".into(),
                csv_ending: "___metadata.csv".into(),
                used_checksum: "MD5".into(),
                desc_root_remove: true,
            },
        }
    }

    fn write_feed(dir: &Path, rows: &[&str]) {
        let mut content = String::from(FEED_HEADER);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        fs::write(dir.join("sip___metadata.csv"), content).unwrap();
    }

    #[test]
    fn checksum_gate_excludes_object_but_keeps_event() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("file1.txt"), "payload").unwrap();
        write_feed(
            dir.path(),
            &[
                "uuid-1,file1.txt,alt-1,,MD5,abc123,2021-03-20 00:00:00,1,,e1,message digest calculation,success,2022-02-02 00:00:00,null,null,null,null,1,Test Agent,person,implementer",
                "uuid-2,file2.txt,alt-2,,SHA-256,def456,2021-03-20 00:00:00,1,,e2,message digest calculation,success,2022-02-02 00:00:00,null,null,null,null,1,Test Agent,person,implementer",
            ],
        );

        let graph = CsvFeedAdaptor::new().populate(dir.path(), &config()).unwrap();
        assert_eq!(graph.object_count(), 1);
        assert_eq!(graph.event_count(), 2);
        assert!(graph.object("uuid-1").is_some());
        assert!(graph.object("uuid-2").is_none());
    }

    #[test]
    fn invalid_digest_status_excludes_object() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("file1.txt"), "payload").unwrap();
        write_feed(
            dir.path(),
            &[
                "uuid-1,file1.txt,,,MD5,abc123,null,0,,e1,modification,success,2022-02-02 00:00:00,null,null,null,null,1,Test Agent,person,implementer",
            ],
        );
        let graph = CsvFeedAdaptor::new().populate(dir.path(), &config()).unwrap();
        assert_eq!(graph.object_count(), 0);
        assert_eq!(graph.event_count(), 1);
    }

    #[test]
    fn object_path_is_resolved_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("audio/nested")).unwrap();
        fs::write(dir.path().join("audio/nested/song.wav"), "RIFF").unwrap();
        write_feed(
            dir.path(),
            &[
                "uuid-1,song.wav,,,MD5,abc123,null,1,,e1,modification,success,2022-02-02 00:00:00,null,null,null,null,1,Test Agent,person,implementer",
            ],
        );
        let graph = CsvFeedAdaptor::new().populate(dir.path(), &config()).unwrap();
        assert_eq!(
            graph.object("uuid-1").unwrap().filepath.as_deref(),
            Some(Path::new("audio/nested/song.wav"))
        );
    }

    #[test]
    fn missing_digital_object_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_feed(
            dir.path(),
            &[
                "uuid-1,absent.txt,,,MD5,abc123,null,1,,e1,modification,success,2022-02-02 00:00:00,null,null,null,null,1,Test Agent,person,implementer",
            ],
        );
        let err = CsvFeedAdaptor::new()
            .populate(dir.path(), &config())
            .unwrap_err();
        assert!(matches!(err, SipError::MissingDigitalObject(name) if name == "absent.txt"));
    }

    #[test]
    fn missing_feed_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvFeedAdaptor::new()
            .populate(dir.path(), &config())
            .unwrap_err();
        assert!(matches!(err, SipError::MissingMetadataFeed { .. }));
    }

    #[test]
    fn package_creation_sets_objid_and_suppresses_object_links() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("file1.txt"), "payload").unwrap();
        write_feed(
            dir.path(),
            &[
                "uuid-1,file1.txt,,,MD5,abc123,null,1,,e9,information package creation,success,2022-02-07 10:00:00,null,null,null,Package 2022-02-07 123,1,Test Agent,person,implementer",
            ],
        );
        let graph = CsvFeedAdaptor::new().populate(dir.path(), &config()).unwrap();
        assert_eq!(graph.objid(), Some("Package_2022-02-07_123"));
        let linking = graph.linking("e9").unwrap();
        assert!(linking.object_links().is_empty());
        assert_eq!(linking.agent_links().len(), 1);
        assert_eq!(linking.agent_links()[0].identifier, "agent-1");
    }

    #[test]
    fn objid_falls_back_to_the_feed_stem() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("file1.txt"), "payload").unwrap();
        write_feed(
            dir.path(),
            &[
                "uuid-1,file1.txt,,,MD5,abc123,null,1,,e1,modification,success,2022-02-02 00:00:00,null,null,null,null,1,Test Agent,person,implementer",
            ],
        );
        let graph = CsvFeedAdaptor::new().populate(dir.path(), &config()).unwrap();
        assert_eq!(graph.objid(), Some("sip"));
    }

    #[test]
    fn rows_aggregate_into_one_event_with_deduped_details() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("f1.txt"), "a").unwrap();
        fs::write(dir.path().join("f2.txt"), "b").unwrap();
        write_feed(
            dir.path(),
            &[
                "uuid-1,f1.txt,,,MD5,d1,2021-03-20 00:00:00,1,,e1,message digest calculation,success,2022-02-02 00:00:00,2022-02-02 00:00:02,null,null,null,1,Teppo,person,implementer",
                "uuid-2,f2.txt,,,MD5,d2,2021-03-20 00:00:01,1,,e1,message digest calculation,success,2022-02-02 00:00:00,2022-02-02 00:00:02,null,null,null,1,Teppo,person,implementer",
                "uuid-2,f2.txt,,,MD5,d2,2021-03-20 00:00:01,1,,e1,message digest calculation,success,2022-02-02 00:00:00,2022-02-02 00:00:02,null,null,null,1,Teppo,person,implementer",
            ],
        );
        let graph = CsvFeedAdaptor::new().populate(dir.path(), &config()).unwrap();
        assert_eq!(graph.event_count(), 1);
        let event = graph.events().next().unwrap();
        assert_eq!(event.datetime, "2022-02-02T00:00:00/2022-02-02T00:00:02");
        assert_eq!(event.details().len(), 2);
        let text = event.outcome_detail().unwrap();
        assert_eq!(
            text,
            "Checksum calculated with algorithm MD5 resulted the following checksums:\n\
             f1.txt: d1 (timestamp: 2021-03-20T00:00:00)\n\
             f2.txt: d2 (timestamp: 2021-03-20T00:00:01)"
        );
        // the linking aggregates both objects with one agent
        let linking = graph.linking("e1").unwrap();
        assert_eq!(linking.object_links().len(), 2);
        assert_eq!(linking.agent_links().len(), 1);
    }

    #[test]
    fn equal_start_and_end_render_a_single_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("f1.txt"), "a").unwrap();
        write_feed(
            dir.path(),
            &[
                "uuid-1,f1.txt,,,MD5,d1,null,1,,e1,modification,success,2022-02-02 00:00:00,2022-02-02 00:00:00,null,null,null,1,Teppo,person,implementer",
            ],
        );
        let graph = CsvFeedAdaptor::new().populate(dir.path(), &config()).unwrap();
        assert_eq!(graph.events().next().unwrap().datetime, "2022-02-02T00:00:00");
    }

    #[test]
    fn descriptive_files_skip_hidden_and_foreign_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dc___metadata.xml"), "<dc/>").unwrap();
        fs::write(dir.path().join("ead___metadata.xml"), "<ead/>").unwrap();
        fs::write(dir.path().join(".hidden___metadata.xml"), "<dc/>").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = CsvFeedAdaptor::new()
            .descriptive_files(dir.path(), &config())
            .unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["dc___metadata.xml", "ead___metadata.xml"]);
    }

    #[test]
    fn post_tasks_inject_alternate_ids_and_regrade_html() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("temp");
        let source = dir.path().join("source");
        fs::create_dir_all(&temp).unwrap();
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("page.html"), "<html><p>unclosed").unwrap();

        let mut graph = MetadataGraph::new();
        graph.add_object(PremisObject {
            identifier: "uuid-1".into(),
            identifier_type: "UUID".into(),
            original_name: "page.html".into(),
            filepath: Some(PathBuf::from("page.html")),
            digest_algorithm: "MD5".into(),
            digest: "abc".into(),
            alt_identifier: Some(AltIdentifier {
                identifier_type: "local".into(),
                value: "alt-9".into(),
            }),
            bit_level: false,
        });

        let manifest = json!({
            "technical": [{
                "identifier_type": "UUID",
                "identifier": "uuid-1",
                "path": "page.html",
                "format": { "name": "text/html", "version": "5" },
            }],
        });
        fs::write(
            temp.join(MANIFEST_NAME),
            serde_json::to_vec_pretty(&manifest).unwrap(),
        )
        .unwrap();

        CsvFeedAdaptor::new()
            .post_tasks(&graph, &temp, &source, &Toolkit::default())
            .unwrap();

        let updated: Value =
            serde_json::from_str(&fs::read_to_string(temp.join(MANIFEST_NAME)).unwrap()).unwrap();
        let section = &updated["technical"][0];
        assert_eq!(section["alt_identifiers"][0]["value"], "alt-9");
        assert_eq!(section["format"]["name"], "text/plain; alt-format=text/html");
        assert!(section["format"].get("version").is_none());
    }

    #[test]
    fn feed_timestamps_are_rendered_iso() {
        assert_eq!(
            render_timestamp("2022-02-01 14:00:00").unwrap(),
            "2022-02-01T14:00:00"
        );
        assert_eq!(
            render_timestamp("2022-02-01T14:00:00").unwrap(),
            "2022-02-01T14:00:00"
        );
        assert!(render_timestamp("today").is_err());
    }
}
